//! Formatting utilities used for CLI outputs.

use crate::models::booking::BookingStatus;

pub fn mins2readable(mins: i64, short: bool) -> String {
    let abs_m = mins.abs();
    let hours = abs_m / 60;
    let minutes = abs_m % 60;
    let sign = if mins < 0 { "-" } else { "" };

    if short {
        // es: 02:25
        format!("{}{:02}:{:02}", sign, hours, minutes)
    } else {
        // es: 02h 25m
        format!("{}{:02}h {:02}m", sign, hours, minutes)
    }
}

/// Amount with the configured currency symbol, two decimals only when needed.
pub fn money(amount: f64, currency: &str) -> String {
    if amount.fract() == 0.0 {
        format!("{}{:.0}", currency, amount)
    } else {
        format!("{}{:.2}", currency, amount)
    }
}

/// Human label and ANSI colour for a booking status.
pub fn describe_status(status: BookingStatus) -> (&'static str, &'static str) {
    match status {
        BookingStatus::Confirmed => ("Confirmed", "\x1b[34m"),
        BookingStatus::InProgress => ("In progress", "\x1b[32m"),
        BookingStatus::Completed => ("Completed", "\x1b[90m"),
        BookingStatus::Cancelled => ("Cancelled", "\x1b[31m"),
        BookingStatus::NoShow => ("No-show", "\x1b[33m"),
    }
}
