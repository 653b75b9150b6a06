use super::{open_db, parse_date_arg};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::queries::load_bookings_by_date;
use crate::errors::{AppError, AppResult};
use crate::models::booking::BookingStatus;
use crate::ui::messages::info;
use crate::utils::colors::{RESET, color_for_optional_field};
use crate::utils::date::today;
use crate::utils::describe_status;
use crate::utils::formatting::money;
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Bookings { date, status, json } = cmd {
        let date = match date {
            Some(d) => parse_date_arg(d)?,
            None => today(),
        };
        let status = status
            .as_deref()
            .map(|s| BookingStatus::from_code(s).ok_or_else(|| AppError::InvalidStatus(s.to_string())))
            .transpose()?;

        let pool = open_db(cfg)?;
        let rows = load_bookings_by_date(&pool.conn, &date, status)?;

        if *json {
            let out = serde_json::to_string_pretty(&rows).map_err(|e| AppError::Other(e.to_string()))?;
            println!("{}", out);
            return Ok(());
        }

        if rows.is_empty() {
            info(format!("No bookings on {}.", date));
            return Ok(());
        }

        let mut table = Table::new(vec![
            "ID", "Group", "Customer", "Station", "Slot", "Price", "Coupon", "Status",
        ]);
        for b in &rows {
            let (label, color) = describe_status(b.status);
            let coupon = b.coupon_code.clone().unwrap_or_else(|| "--".to_string());
            table.add_row(vec![
                b.id.to_string(),
                short_group(&b.booking_group_id),
                b.customer_id.clone(),
                b.station_id.clone(),
                b.slot.to_string(),
                money(b.final_price, &cfg.currency),
                format!(
                    "{}{}{}",
                    color_for_optional_field(b.coupon_code.as_deref()),
                    coupon,
                    RESET
                ),
                format!("{}{}{}", color, label, RESET),
            ]);
        }
        print!("{}", table.render());
    }

    Ok(())
}

/// Generated group ids are UUIDs; eight characters are enough to tell them apart on screen.
fn short_group(id: &str) -> String {
    if id.len() == 36 && id.chars().filter(|c| *c == '-').count() == 4 {
        id.chars().take(8).collect()
    } else {
        id.to_string()
    }
}
