use chrono::NaiveDate;

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Accepts `YYYY-MM-DD`, `today` and `tomorrow`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    match s.to_lowercase().as_str() {
        "today" => Some(today()),
        "tomorrow" => today().succ_opt(),
        _ => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
    }
}

pub fn format_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}
