//! Timestamp utilities

use chrono::{DateTime, Datelike, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as Unix epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Calendar year used for the year options and year validation
pub fn current_year() -> i32 {
    Utc::now().year()
}
