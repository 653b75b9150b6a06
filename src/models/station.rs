use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StationKind {
    Console,
    Table,
}

impl StationKind {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            StationKind::Console => "console",
            StationKind::Table => "table",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "console" => Some(StationKind::Console),
            "table" => Some(StationKind::Table),
            _ => None,
        }
    }

    /// Helper: accept CLI aliases (ps, pool, ...) in any case
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_lowercase().as_str() {
            "console" | "ps" | "playstation" | "c" => Some(StationKind::Console),
            "table" | "pool" | "t" => Some(StationKind::Table),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub kind: StationKind,
    pub hourly_rate: f64,
    pub active: bool,
    /// Open walk-in session on this station, if any (derived, not stored).
    pub current_session: Option<i64>,
}

impl Station {
    pub fn is_occupied(&self) -> bool {
        self.current_session.is_some()
    }

    /// Price of a booking of `minutes` at the station's hourly rate.
    pub fn quote(&self, minutes: i64) -> f64 {
        crate::core::pricing::round2(self.hourly_rate * minutes as f64 / 60.0)
    }
}
