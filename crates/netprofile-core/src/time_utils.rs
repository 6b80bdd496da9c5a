use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

/// Marker some devices write in place of a timestamp.
pub const INVALID_DATE_MARKER: &str = "(invalid date)";

/// Hour at which a logical day begins.
pub const DAY_BOUNDARY_HOUR: u32 = 4;

/// Length of the `YYYY-MM-DDTHH:MM:SS` prefix of a log timestamp.
const TIMESTAMP_PREFIX_LEN: usize = 19;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse a log timestamp such as `2014-03-08T14:05:31.123+0000`.
///
/// Only the leading date and time to the second are used; the fractional part
/// and offset suffix are ignored because timestamps are local wall-clock time.
/// Returns `None` for the invalid-date marker and anything unparseable.
pub fn parse_log_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.contains(INVALID_DATE_MARKER) {
        return None;
    }
    let prefix = raw.get(..TIMESTAMP_PREFIX_LEN)?;
    NaiveDateTime::parse_from_str(prefix, TIMESTAMP_FORMAT).ok()
}

// ── 04:00 day boundary ────────────────────────────────────────────────────────

/// Canonical first day for a log whose earliest record is `first`.
///
/// Activity before 04:00 belongs to the previous logical day, so a log that
/// starts before 04:00 can keep its calendar date; a later start is only a
/// partial day and the window begins on the following date.
pub fn canonical_start_date(first: NaiveDateTime) -> NaiveDate {
    if first.hour() < DAY_BOUNDARY_HOUR {
        first.date()
    } else {
        first.date() + Duration::days(1)
    }
}

/// Canonical last day for a log whose latest record is `last`.
pub fn canonical_end_date(last: NaiveDateTime) -> NaiveDate {
    if last.hour() >= DAY_BOUNDARY_HOUR {
        last.date()
    } else {
        last.date() - Duration::days(1)
    }
}

/// 04:00:00 on `date`.
pub fn logical_day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN) + Duration::hours(i64::from(DAY_BOUNDARY_HOUR))
}

/// Monday = 0 … Sunday = 6.
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_monday() as usize
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_full_device_timestamp() {
        let parsed = parse_log_timestamp("2014-03-08T14:05:31.123+0000").unwrap();
        assert_eq!(parsed, ts("2014-03-08T14:05:31"));
    }

    #[test]
    fn test_parse_without_suffix() {
        assert_eq!(
            parse_log_timestamp("2014-03-08T14:05:31"),
            Some(ts("2014-03-08T14:05:31"))
        );
    }

    #[test]
    fn test_parse_invalid_marker() {
        assert!(parse_log_timestamp("(invalid date)").is_none());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_log_timestamp("").is_none());
        assert!(parse_log_timestamp("2014-03-08").is_none());
        assert!(parse_log_timestamp("not a timestamp at all").is_none());
    }

    #[test]
    fn test_start_before_boundary_keeps_date() {
        assert_eq!(
            canonical_start_date(ts("2014-03-08T03:59:59")),
            date(2014, 3, 8)
        );
    }

    #[test]
    fn test_start_at_boundary_advances() {
        assert_eq!(
            canonical_start_date(ts("2014-03-08T04:00:00")),
            date(2014, 3, 9)
        );
        assert_eq!(
            canonical_start_date(ts("2014-03-08T23:10:00")),
            date(2014, 3, 9)
        );
    }

    #[test]
    fn test_end_at_boundary_keeps_date() {
        assert_eq!(canonical_end_date(ts("2014-03-22T04:00:00")), date(2014, 3, 22));
    }

    #[test]
    fn test_end_before_boundary_rolls_back() {
        assert_eq!(canonical_end_date(ts("2014-03-22T03:59:59")), date(2014, 3, 21));
        assert_eq!(canonical_end_date(ts("2014-03-01T00:30:00")), date(2014, 2, 28));
    }

    #[test]
    fn test_logical_day_start() {
        assert_eq!(logical_day_start(date(2014, 3, 9)), ts("2014-03-09T04:00:00"));
    }

    #[test]
    fn test_weekday_index() {
        // 2024-03-09 was a Saturday, 2024-03-04 a Monday.
        assert_eq!(weekday_index(date(2024, 3, 9)), 5);
        assert_eq!(weekday_index(date(2024, 3, 4)), 0);
        assert_eq!(weekday_index(date(2024, 3, 10)), 6);
    }
}
