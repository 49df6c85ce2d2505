//! Best-effort normalization of user-entered dates.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::value::CellValue;

/// Timestamp layouts tried after RFC 3339, all without an offset
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Normalize a raw `Date` field value.
///
/// Blank input becomes an empty cell. Text that parses as a timestamp or as
/// `D/M/Y` / `D-M-Y` becomes a calendar date; anything else is kept verbatim.
/// Non-text values pass through unchanged.
pub fn normalize_date(raw: &CellValue) -> CellValue {
    if raw.is_blank() {
        return CellValue::Empty;
    }
    match raw {
        CellValue::Text(s) => match parse_date(s) {
            Some(date) => CellValue::Date(date),
            None => CellValue::Text(s.clone()),
        },
        CellValue::DateTime(dt) => CellValue::Date(dt.date()),
        other => other.clone(),
    }
}

/// Parse a date string, dropping any time of day.
///
/// Accepts RFC 2822, RFC 3339 and ISO `YYYY-MM-DD[ HH:MM[:SS]]`, then
/// day-first `D/M/Y` or `D-M-Y` with an optional time. Two-digit years are
/// read as 20xx.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    parse_timestamp(input).or_else(|| parse_day_first(input))
}

/// ISO layouts only apply to input led by a four-digit year. chrono's `%Y`
/// takes one to four digits, which would read `01-02-24` as year 1.
fn parse_timestamp(input: &str) -> Option<NaiveDate> {
    static ISO_LEAD_RE: OnceLock<Regex> = OnceLock::new();
    let iso_lead = ISO_LEAD_RE.get_or_init(|| Regex::new(r"^\d{4}-").unwrap());

    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Some(dt.date_naive());
    }
    if !iso_lead.is_match(input) {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date);
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|dt| dt.date())
}

fn parse_day_first(input: &str) -> Option<NaiveDate> {
    static DMY_RE: OnceLock<Regex> = OnceLock::new();
    let re = DMY_RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})([/-])(\d{1,2})([/-])(\d{2,4})(?:[ T]\d{1,2}:\d{2}(?::\d{2})?)?$")
            .unwrap()
    });

    let caps = re.captures(input)?;
    // One separator throughout
    if caps[2] != caps[4] {
        return None;
    }
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[3].parse().ok()?;
    let mut year: i32 = caps[5].parse().ok()?;
    if year < 100 {
        year += 2000;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_first_slash() {
        assert_eq!(parse_date("25/12/2023"), Some(ymd(2023, 12, 25)));
    }

    #[test]
    fn test_day_first_dash_short_year() {
        assert_eq!(parse_date("5-3-24"), Some(ymd(2024, 3, 5)));
    }

    #[test]
    fn test_day_first_dash_is_not_read_as_iso() {
        assert_eq!(parse_date("01-02-24"), Some(ymd(2024, 2, 1)));
        assert_eq!(parse_date("10-12-23"), Some(ymd(2023, 12, 10)));
        assert_eq!(parse_date("25-12-2023"), Some(ymd(2023, 12, 25)));
    }

    #[test]
    fn test_day_first_with_time_of_day() {
        assert_eq!(parse_date("5-3-24 10:00"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date("25/12/2023 23:59:59"), Some(ymd(2023, 12, 25)));
    }

    #[test]
    fn test_mixed_separators_rejected() {
        assert_eq!(parse_date("25/12-2023"), None);
    }

    #[test]
    fn test_rfc2822() {
        assert_eq!(
            parse_date("Mon, 25 Dec 2023 10:00:00 GMT"),
            Some(ymd(2023, 12, 25))
        );
    }

    #[test]
    fn test_rfc3339_drops_time() {
        assert_eq!(parse_date("2023-12-25T10:00:00Z"), Some(ymd(2023, 12, 25)));
        assert_eq!(
            parse_date("2023-12-25T23:30:00+05:30"),
            Some(ymd(2023, 12, 25))
        );
    }

    #[test]
    fn test_iso_date_and_naive_datetime() {
        assert_eq!(parse_date("2023-12-25"), Some(ymd(2023, 12, 25)));
        assert_eq!(parse_date("2023-12-25 08:15"), Some(ymd(2023, 12, 25)));
        assert_eq!(parse_date("2023-12-25T08:15:30"), Some(ymd(2023, 12, 25)));
    }

    #[test]
    fn test_impossible_date_rejected() {
        assert_eq!(parse_date("31/02/2023"), None);
        assert_eq!(parse_date("12/25/2023"), None);
    }

    #[test]
    fn test_normalize_falls_back_to_raw() {
        let raw = CellValue::from("not-a-date");
        assert_eq!(normalize_date(&raw), CellValue::from("not-a-date"));
    }

    #[test]
    fn test_normalize_blank_is_empty() {
        assert_eq!(normalize_date(&CellValue::from("")), CellValue::Empty);
        assert_eq!(normalize_date(&CellValue::Empty), CellValue::Empty);
    }

    #[test]
    fn test_normalize_parses_text() {
        assert_eq!(
            normalize_date(&CellValue::from(" 25/12/2023 ")),
            CellValue::Date(ymd(2023, 12, 25))
        );
    }

    #[test]
    fn test_normalize_passes_numbers_through() {
        assert_eq!(
            normalize_date(&CellValue::Number(45285.0)),
            CellValue::Number(45285.0)
        );
    }
}
