//! Weekly window calculator
//!
//! Every cycle-scoped count (claims already made, streak interactions) is
//! filtered against the calendar week containing "now": UTC midnight on the
//! configured first weekday, up to but excluding the same time seven days
//! later.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc, Weekday};
use serde::Serialize;

/// Length of every window
pub const WINDOW_DAYS: i64 = 7;

/// Half-open `[start, end)` interval covering one calendar week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WeeklyWindow {
    /// The window containing `now`, with weeks beginning on `week_start`.
    pub fn containing(now: DateTime<Utc>, week_start: Weekday) -> Self {
        let today = now.date_naive();
        let days_back = (today.weekday().num_days_from_monday() + 7
            - week_start.num_days_from_monday())
            % 7;
        let first_day = today - Duration::days(i64::from(days_back));
        let start = Utc.from_utc_datetime(&first_day.and_time(NaiveTime::MIN));

        Self {
            start,
            end: start + Duration::days(WINDOW_DAYS),
        }
    }
}
