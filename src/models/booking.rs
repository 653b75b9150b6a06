use super::time_slot::TimeSlot;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BookingStatus {
    #[serde(rename = "confirmed")]
    Confirmed,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "cancelled")]
    Cancelled,
    #[serde(rename = "no-show")]
    NoShow,
}

impl BookingStatus {
    /// Statuses that hold a station and take part in conflict detection.
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Confirmed, BookingStatus::InProgress];

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in-progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no-show",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(BookingStatus::Confirmed),
            "in-progress" => Some(BookingStatus::InProgress),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "no-show" => Some(BookingStatus::NoShow),
            _ => None,
        }
    }

    /// Helper: CLI input, case-insensitive, `_` accepted for `-`
    pub fn from_code(code: &str) -> Option<Self> {
        Self::from_db_str(&code.to_lowercase().replace('_', "-"))
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_db_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: i64,
    pub customer_id: String,
    pub station_id: String,
    pub booking_group_id: String,
    pub date: NaiveDate,     // ⇔ bookings.date (TEXT "YYYY-MM-DD")
    pub slot: TimeSlot,      // ⇔ bookings.start_time / end_time (TEXT "HH:MM")
    pub duration_minutes: i64,
    pub status: BookingStatus,
    pub coupon_code: Option<String>,
    pub discount_percentage: f64,
    pub original_price: f64,
    pub final_price: f64,
    pub checked_in_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Booking {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.slot.start)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.date.and_time(self.slot.end)
    }

    pub fn date_str(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// One station of a booking group with the price quoted to the customer.
#[derive(Debug, Clone, PartialEq)]
pub struct StationPrice {
    pub station_id: String,
    pub price: f64,
}

impl StationPrice {
    pub fn new(station_id: impl Into<String>, price: f64) -> Self {
        Self {
            station_id: station_id.into(),
            price,
        }
    }
}

/// Everything needed to book several stations for the same slot at once.
#[derive(Debug, Clone)]
pub struct BookingGroupRequest {
    pub customer_id: String,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub duration_minutes: i64,
    pub booking_group_id: String,
    pub coupon_code: Option<String>,
    pub discount_percentage: f64,
    pub stations: Vec<StationPrice>,
}

impl BookingGroupRequest {
    pub fn station_ids(&self) -> Vec<String> {
        self.stations.iter().map(|s| s.station_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip_through_cli_codes() {
        assert_eq!(
            BookingStatus::from_code("IN_PROGRESS"),
            Some(BookingStatus::InProgress)
        );
        assert_eq!(BookingStatus::from_code("No-Show"), Some(BookingStatus::NoShow));
        assert_eq!(BookingStatus::from_code("pending"), None);
    }

    #[test]
    fn only_confirmed_and_in_progress_are_active() {
        assert!(BookingStatus::Confirmed.is_active());
        assert!(BookingStatus::InProgress.is_active());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::NoShow.is_terminal());
    }
}
