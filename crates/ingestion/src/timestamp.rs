//! Day-first timestamp parsing.
//!
//! Input timestamps come in whatever locale the upstream export used. The
//! contract, in order of precedence:
//!
//! - RFC 3339 / ISO strings with an offset are converted to UTC and made naive.
//! - Year-first numeric dates (`2024-04-03`, `2024/04/03`, `20240403`) are
//!   read year, month, day.
//! - Other numeric dates (`03/04/2024`, `03-04-24`, `3.4.2024`) are read
//!   **day first**: `03/04/2024` is 3 April. When the second field cannot be
//!   a month (`03/25/2024`) the month-first reading is used instead. Truly
//!   ambiguous inputs therefore always resolve day first, even if the source
//!   meant month first; this loss is part of the contract.
//! - Named-month dates (`3 Apr 2024`, `Apr 3, 2024`, `03-Apr-2024`).
//!
//! A time of day may follow a space or `T` (`HH:MM`, `HH:MM:SS[.fff]`, or
//! 12-hour with AM/PM). Missing time means midnight. Anything else yields
//! `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const TIME_FORMATS: [&str; 5] = [
    "%H:%M:%S%.f",
    "%H:%M:%S",
    "%H:%M",
    "%I:%M:%S %p",
    "%I:%M %p",
];

const NAMED_MONTH_DATETIME_FORMATS: [&str; 6] = [
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
    "%b %d, %Y %H:%M:%S",
    "%b %d, %Y %H:%M",
    "%d-%b-%Y %H:%M:%S",
    "%d-%b-%Y %H:%M",
];

const NAMED_MONTH_DATE_FORMATS: [&str; 4] = ["%d %b %Y", "%b %d, %Y", "%b %d %Y", "%d-%b-%Y"];

/// Parse a timestamp with day-first bias. Never fails loudly.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.naive_utc());
    }

    let (date_part, time_part) = split_date_time(s);
    if let Some(date) = parse_numeric_date(date_part) {
        let time = match time_part {
            None => NaiveTime::MIN,
            Some(t) => parse_time(t)?,
        };
        return Some(date.and_time(time));
    }

    parse_named_month(s)
}

/// Split at the first `T` or whitespace following a numeric date.
fn split_date_time(s: &str) -> (&str, Option<&str>) {
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '/' | '-' | '.')))
        .unwrap_or(s.len());
    let (date, rest) = s.split_at(end);
    let rest = rest.strip_prefix('T').unwrap_or(rest).trim();
    if rest.is_empty() {
        (date, None)
    } else {
        (date, Some(rest))
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim_end_matches('Z');
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

/// Numeric date with a single separator kind, or a compact `YYYYMMDD`.
fn parse_numeric_date(s: &str) -> Option<NaiveDate> {
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(s, "%Y%m%d").ok();
    }

    let sep = s.chars().find(|c| matches!(c, '/' | '-' | '.'))?;
    let fields: Vec<&str> = s.split(sep).collect();
    if fields.len() != 3
        || fields
            .iter()
            .any(|f| f.is_empty() || f.len() > 4 || !f.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let num = |f: &str| f.parse::<u32>().ok();
    let (a, b, c) = (num(fields[0])?, num(fields[1])?, num(fields[2])?);

    if fields[0].len() == 4 {
        return NaiveDate::from_ymd_opt(a as i32, b, c);
    }

    let year = match fields[2].len() {
        4 => c as i32,
        1 | 2 => expand_two_digit_year(c),
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, b, a).or_else(|| NaiveDate::from_ymd_opt(year, a, b))
}

/// 00-68 map to 2000-2068, 69-99 to 1969-1999.
fn expand_two_digit_year(yy: u32) -> i32 {
    if yy < 69 {
        2000 + yy as i32
    } else {
        1900 + yy as i32
    }
}

fn parse_named_month(s: &str) -> Option<NaiveDateTime> {
    NAMED_MONTH_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NAMED_MONTH_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, ss)
            .unwrap()
    }

    #[test]
    fn test_day_first_is_preferred() {
        assert_eq!(parse_timestamp("03/04/2024"), Some(dt(2024, 4, 3, 0, 0, 0)));
        assert_eq!(parse_timestamp("03-04-2024 14:30"), Some(dt(2024, 4, 3, 14, 30, 0)));
        assert_eq!(parse_timestamp("3.4.2024 09:05:07"), Some(dt(2024, 4, 3, 9, 5, 7)));
    }

    #[test]
    fn test_month_first_fallback_when_day_first_impossible() {
        assert_eq!(parse_timestamp("03/25/2024"), Some(dt(2024, 3, 25, 0, 0, 0)));
        assert_eq!(parse_timestamp("25/03/2024"), Some(dt(2024, 3, 25, 0, 0, 0)));
    }

    #[test]
    fn test_impossible_dates_are_absent() {
        assert_eq!(parse_timestamp("31/02/2024"), None);
        assert_eq!(parse_timestamp("13/13/2024"), None);
        assert_eq!(parse_timestamp("2024-02-30"), None);
    }

    #[test]
    fn test_year_first_forms() {
        assert_eq!(parse_timestamp("2024-04-03"), Some(dt(2024, 4, 3, 0, 0, 0)));
        assert_eq!(parse_timestamp("2024/04/03 10:15:00"), Some(dt(2024, 4, 3, 10, 15, 0)));
        assert_eq!(parse_timestamp("2024-04-03T10:15:00"), Some(dt(2024, 4, 3, 10, 15, 0)));
        assert_eq!(parse_timestamp("20240403"), Some(dt(2024, 4, 3, 0, 0, 0)));
    }

    #[test]
    fn test_fractional_seconds() {
        let parsed = parse_timestamp("2024-04-03 10:15:00.250").unwrap();
        assert_eq!(parsed.and_utc().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_offsets_are_converted_to_utc() {
        assert_eq!(
            parse_timestamp("2024-04-03T10:00:00+02:00"),
            Some(dt(2024, 4, 3, 8, 0, 0))
        );
        assert_eq!(parse_timestamp("2024-04-03T10:00:00Z"), Some(dt(2024, 4, 3, 10, 0, 0)));
    }

    #[test]
    fn test_two_digit_years() {
        assert_eq!(parse_timestamp("03/04/24"), Some(dt(2024, 4, 3, 0, 0, 0)));
        assert_eq!(parse_timestamp("03/04/99"), Some(dt(1999, 4, 3, 0, 0, 0)));
    }

    #[test]
    fn test_twelve_hour_clock() {
        assert_eq!(parse_timestamp("03/04/2024 02:30 PM"), Some(dt(2024, 4, 3, 14, 30, 0)));
    }

    #[test]
    fn test_named_months() {
        assert_eq!(parse_timestamp("3 Apr 2024"), Some(dt(2024, 4, 3, 0, 0, 0)));
        assert_eq!(parse_timestamp("Apr 3, 2024"), Some(dt(2024, 4, 3, 0, 0, 0)));
        assert_eq!(parse_timestamp("03-Apr-2024 10:00"), Some(dt(2024, 4, 3, 10, 0, 0)));
    }

    #[test]
    fn test_garbage_is_absent() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp("03/04"), None);
        assert_eq!(parse_timestamp("03/04/2024 25:00"), None);
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        assert_eq!(parse_timestamp("  03/04/2024 10:00  "), Some(dt(2024, 4, 3, 10, 0, 0)));
    }
}
