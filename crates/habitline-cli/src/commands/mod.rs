pub mod habit;
pub mod next;
pub mod notify;

use chrono::{NaiveDate, NaiveTime};

/// Parse "HH:MM" into a time of day.
pub fn parse_time(value: &str) -> Result<NaiveTime, Box<dyn std::error::Error>> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| format!("invalid time '{value}', expected HH:MM").into())
}

/// Parse "YYYY-MM-DD", defaulting to today.
pub fn parse_date_or_today(
    value: Option<&str>,
) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    match value {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| format!("invalid date '{s}', expected YYYY-MM-DD").into()),
        None => Ok(chrono::Local::now().date_naive()),
    }
}
