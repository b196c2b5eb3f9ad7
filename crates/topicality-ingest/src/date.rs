//! Publication date parsing with OCR-glitch repair and a year filter.

use std::borrow::Cow;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use topicality_core::ACCEPTED_YEARS;

/// "Mar 1 1, 2023": a two-digit day split by OCR into two single digits.
static SPLIT_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([A-Za-z]+)\s+(\d)\s+(\d),\s*(\d{4})$").unwrap());

/// Fallback formats, tried in order after the ISO-like forms.
const FALLBACK_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%d %b %Y", "%d %B %Y"];

/// Parse a free-text publication date.
///
/// Returns `None` when the string is unparseable or its year is not one of
/// [`ACCEPTED_YEARS`].
pub fn parse_pub_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = repair_split_day(raw.trim());
    if cleaned.is_empty() {
        return None;
    }

    let date = parse_iso_like(&cleaned).or_else(|| {
        FALLBACK_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
    })?;

    ACCEPTED_YEARS.contains(&date.year()).then_some(date)
}

/// Rewrite "Mon D D, YYYY" to "Mon DD, YYYY" when DD is a plausible day.
pub fn repair_split_day(s: &str) -> Cow<'_, str> {
    if let Some(caps) = SPLIT_DAY.captures(s) {
        let day: u32 = format!("{}{}", &caps[2], &caps[3]).parse().unwrap_or(0);
        if (1..=31).contains(&day) {
            return Cow::Owned(format!("{} {}, {}", &caps[1], day, &caps[4]));
        }
    }
    Cow::Borrowed(s)
}

fn parse_iso_like(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, day)
    }

    #[test]
    fn test_split_day_repair_matches_clean_input() {
        assert_eq!(parse_pub_date("Mar 11, 2023"), d(2023, 3, 11));
        assert_eq!(parse_pub_date("Mar 1 1, 2023"), d(2023, 3, 11));
        assert_eq!(parse_pub_date("mar 2 9, 2024"), d(2024, 3, 29));
    }

    #[test]
    fn test_split_day_out_of_range_left_alone() {
        assert_eq!(repair_split_day("Mar 4 5, 2023"), "Mar 4 5, 2023");
        assert_eq!(parse_pub_date("Mar 4 5, 2023"), None);
        assert_eq!(repair_split_day("Mar 0 0, 2023"), "Mar 0 0, 2023");
    }

    #[test]
    fn test_formats() {
        assert_eq!(parse_pub_date("2023-07-04"), d(2023, 7, 4));
        assert_eq!(parse_pub_date("2024-01-31T15:20:00"), d(2024, 1, 31));
        assert_eq!(parse_pub_date("2024-01-31T15:20:00Z"), d(2024, 1, 31));
        assert_eq!(parse_pub_date("Jan 31, 2024"), d(2024, 1, 31));
        assert_eq!(parse_pub_date("January 5, 2024"), d(2024, 1, 5));
        assert_eq!(parse_pub_date("5 Mar 2024"), d(2024, 3, 5));
        assert_eq!(parse_pub_date("17 September 2023"), d(2023, 9, 17));
    }

    #[test]
    fn test_year_filter() {
        assert_eq!(parse_pub_date("2022-05-01"), None);
        assert_eq!(parse_pub_date("May 1, 2025"), None);
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_pub_date(""), None);
        assert_eq!(parse_pub_date("   "), None);
        assert_eq!(parse_pub_date("sometime in spring"), None);
        assert_eq!(parse_pub_date("Feb 30, 2023"), None);
    }
}
