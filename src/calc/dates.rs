use crate::error::{TrackerError, TrackerResult};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current date in the viewer's local calendar.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Canonical zero-padded `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses exactly `YYYY-MM-DD`.
///
/// chrono alone accepts unpadded fields ("2025-9-1") and signed years, so the
/// shape is checked before the calendar value.
pub fn parse_date(s: &str) -> TrackerResult<NaiveDate> {
    let bytes = s.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(TrackerError::InvalidDate(s.to_string()));
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| TrackerError::InvalidDate(s.to_string()))
}

/// Adds signed whole days using calendar arithmetic.
pub fn shift_days(date: NaiveDate, delta_days: i64) -> TrackerResult<NaiveDate> {
    Duration::try_days(delta_days)
        .and_then(|d| date.checked_add_signed(d))
        .ok_or_else(|| {
            TrackerError::DateOutOfRange(format!("{} shifted by {} days", format_date(date), delta_days))
        })
}

/// Calendar date of an instant as seen in `tz`.
pub fn to_local_date<Tz: TimeZone, Z: TimeZone>(ts: &DateTime<Z>, tz: &Tz) -> NaiveDate {
    ts.with_timezone(tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_format_zero_pads() {
        assert_eq!(format_date(d(2025, 9, 1)), "2025-09-01");
        assert_eq!(format_date(d(987, 1, 2)), "0987-01-02");
    }

    #[test]
    fn test_parse_valid_date() {
        assert_eq!(parse_date("2025-09-01").unwrap(), d(2025, 9, 1));
        assert_eq!(parse_date("2024-02-29").unwrap(), d(2024, 2, 29));
    }

    #[test]
    fn test_parse_rejects_impossible_dates() {
        assert!(matches!(parse_date("2025-13-01"), Err(TrackerError::InvalidDate(_))));
        assert!(matches!(parse_date("2025-02-29"), Err(TrackerError::InvalidDate(_))));
        assert!(matches!(parse_date("2025-04-31"), Err(TrackerError::InvalidDate(_))));
        assert!(matches!(parse_date("2025-00-10"), Err(TrackerError::InvalidDate(_))));
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        for s in ["2025-9-1", "2025/09/01", "20250901", "", "2025-09-01T00:00", " 2025-09-01", "+025-09-01"] {
            assert!(parse_date(s).is_err(), "{s:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_format_roundtrip_across_a_leap_year() {
        let mut current = d(2023, 12, 25);
        while current <= d(2025, 1, 5) {
            assert_eq!(parse_date(&format_date(current)).unwrap(), current);
            current = current.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_shift_zero_is_identity() {
        assert_eq!(shift_days(d(2025, 9, 1), 0).unwrap(), d(2025, 9, 1));
    }

    #[test]
    fn test_shift_rolls_over_month_and_year() {
        assert_eq!(shift_days(d(2025, 9, 1), -1).unwrap(), d(2025, 8, 31));
        assert_eq!(shift_days(d(2025, 12, 31), 1).unwrap(), d(2026, 1, 1));
        assert_eq!(shift_days(d(2024, 2, 28), 1).unwrap(), d(2024, 2, 29));
        assert_eq!(shift_days(d(2025, 2, 28), 1).unwrap(), d(2025, 3, 1));
        assert_eq!(shift_days(d(2025, 1, 1), 365).unwrap(), d(2026, 1, 1));
    }

    #[test]
    fn test_shift_inverse() {
        let base = d(2025, 3, 30);
        for n in [-400, -31, -1, 1, 7, 29, 1000] {
            assert_eq!(shift_days(shift_days(base, n).unwrap(), -n).unwrap(), base);
        }
    }

    #[test]
    fn test_shift_out_of_range_fails() {
        assert!(matches!(shift_days(NaiveDate::MAX, 1), Err(TrackerError::DateOutOfRange(_))));
        assert!(shift_days(d(2025, 1, 1), i64::MAX).is_err());
    }

    #[test]
    fn test_to_local_date_uses_target_offset() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let ts = utc.with_ymd_and_hms(2025, 9, 1, 2, 30, 0).unwrap();
        let west = FixedOffset::west_opt(5 * 3600).unwrap();
        let east = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(to_local_date(&ts, &west), d(2025, 8, 31));
        assert_eq!(to_local_date(&ts, &east), d(2025, 9, 1));
    }
}
