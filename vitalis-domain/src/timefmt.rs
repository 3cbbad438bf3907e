//! Calendar/epoch conversion and timestamp formatting.
//!
//! All conversion is UTC so behavior does not depend on the host timezone.

use chrono::{DateTime, NaiveDate, NaiveTime};

/// Seconds in a day minus one; added to a day's start to get its 23:59:59
const DAY_END_OFFSET: i64 = 86_399;

/// Parse a `yyyy-mm-dd` date string.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Epoch bounds of a calendar day: [00:00:00, 23:59:59].
pub fn day_bounds(date: NaiveDate) -> (i64, i64) {
    let start = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    (start, start + DAY_END_OFFSET)
}

/// Render an epoch as the API's human-readable form, `dd/mm/yyyy HH:MM:SS`.
pub fn format_epoch(epoch: i64) -> String {
    DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.format("%d/%m/%Y %H:%M:%S").to_string())
        .unwrap_or_default()
}
