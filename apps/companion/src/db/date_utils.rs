//! Date utilities for daily reset hour handling.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Timelike};

/// The study day `now` belongs to.
///
/// Before `daily_reset_hour` the previous calendar day is still in progress,
/// so late-night sessions count towards it.
pub fn study_day<Tz: TimeZone>(now: &DateTime<Tz>, daily_reset_hour: u32) -> NaiveDate {
    if now.hour() < daily_reset_hour {
        (now.clone() - Duration::days(1)).date_naive()
    } else {
        now.date_naive()
    }
}

/// Get adjusted "today" in local time.
pub fn get_adjusted_today(daily_reset_hour: u32) -> NaiveDate {
    study_day(&Local::now(), daily_reset_hour)
}
