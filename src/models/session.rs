use chrono::NaiveDateTime;
use serde::Serialize;

/// Walk-in usage of a station, independent of any booking.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: i64,
    pub station_id: String,
    pub customer_id: Option<String>,
    /// Station rate when the session was opened; later rate changes do not apply.
    pub hourly_rate: f64,
    pub start_time: NaiveDateTime, // ⇔ sessions.start_time (TEXT "YYYY-MM-DD HH:MM:SS")
    pub end_time: Option<NaiveDateTime>,
    pub duration_minutes: Option<i64>,
    pub cost: Option<i64>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Billable line produced when a session is stopped.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: i64,
    pub label: String,
    pub source: String,
    pub reference_id: i64,
    pub amount: f64,
    pub created_at: String,
}
