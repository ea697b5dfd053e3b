//! Permissive period parsing.

use chrono::{NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const MONTH_SEPARATORS: &[char] = &['-', '/'];

/// Parse a period value. Month-only values (`2023-01`, `2023/1`) resolve to
/// the first of the month. Anything unrecognised yields `None`; callers keep
/// the row.
pub fn parse_timestamp(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }

    parse_year_month(value)
}

fn parse_year_month(value: &str) -> Option<NaiveDate> {
    let (year, month) = value.split_once(MONTH_SEPARATORS)?;
    if year.len() != 4 || month.is_empty() || month.len() > 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_year_month() {
        assert_eq!(parse_timestamp("2023-01"), ymd(2023, 1, 1));
        assert_eq!(parse_timestamp("2023/7"), ymd(2023, 7, 1));
    }

    #[test]
    fn test_full_dates() {
        assert_eq!(parse_timestamp("2023-02-15"), ymd(2023, 2, 15));
        assert_eq!(parse_timestamp("2023/02/15"), ymd(2023, 2, 15));
        assert_eq!(parse_timestamp(" 2023-02-15 08:30:00 "), ymd(2023, 2, 15));
    }

    #[test]
    fn test_unparseable_is_none() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp("2023-13"), None);
        assert_eq!(parse_timestamp("2023-02-30"), None);
        assert_eq!(parse_timestamp("23-01"), None);
    }
}
