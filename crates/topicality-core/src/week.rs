//! Monday-aligned week arithmetic shared by every weekly table.

use chrono::{Datelike, Duration, NaiveDate};

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// ISO (year, week) of a date.
pub fn iso_year_week(date: NaiveDate) -> (i32, u32) {
    let iso = date.iso_week();
    (iso.year(), iso.week())
}

/// Every Monday from `first` through `last`, inclusive.
///
/// Both bounds are snapped to their week start first.
pub fn monday_range(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut current = week_start(first);
    let last = week_start(last);
    let mut weeks = Vec::new();
    while current <= last {
        weeks.push(current);
        current += Duration::weeks(1);
    }
    weeks
}
