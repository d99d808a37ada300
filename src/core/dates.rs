//! Lenient parsing of publication dates from evidence sources.
//!
//! Sources disagree wildly on date formats (ISO 8601 timestamps, bare
//! dates, GDELT's compact seendate). Unparsable dates are simply None;
//! they are never an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Try to parse a publication date string into a calendar date.
pub fn parse_published_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    // GDELT seendate: 20240315T120000Z
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%SZ") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339() {
        let d = parse_published_date("2024-03-15T10:30:00+00:00").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn test_bare_date() {
        let d = parse_published_date("2021-01-02").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2021, 1, 2).unwrap());
    }

    #[test]
    fn test_gdelt_seendate() {
        let d = parse_published_date("20240315T120000Z").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn test_garbage_is_none() {
        assert!(parse_published_date("last tuesday").is_none());
        assert!(parse_published_date("").is_none());
    }
}
