//! Calendar helpers for lookback windows and forecast axes.
//!
//! Uses Rata Die day-numbering for O(1) day differences and offsets instead
//! of jiff's `Span` arithmetic.

use jiff::civil::Date;

/// Convert a civil date to a Rata Die day number (days since 0001-01-01).
///
/// Uses the proleptic Gregorian calendar algorithm from Baum (2017).
/// This is an O(1) operation with no branches beyond the month adjustment.
#[inline]
fn rata_die(d: Date) -> i32 {
    let y = d.year() as i32;
    let m = d.month() as i32;
    let day = d.day() as i32;

    // Shift March = month 1 so Feb (end of "year") is month 12
    let a = (14 - m) / 12;
    let y2 = y - a;
    let m2 = m + 12 * a - 3;

    day + (153 * m2 + 2) / 5 + 365 * y2 + y2 / 4 - y2 / 100 + y2 / 400 - 306
}

/// Calendar days from `d1` to `d2`, positive when `d2 > d1`
#[inline]
pub fn fast_days_between(d1: Date, d2: Date) -> i32 {
    rata_die(d2) - rata_die(d1)
}

/// Shift a date by `n` calendar days (negative moves backwards)
#[inline]
pub fn add_days(d: Date, n: i32) -> Date {
    rd_to_date(rata_die(d) + n)
}

/// Start of a lookback window of `years` years ending at `as_of`.
///
/// A year is counted as 365 days, so windows drift by the number of leap
/// days they cover.
#[must_use]
pub fn lookback_start(as_of: Date, years: u32) -> Date {
    add_days(as_of, -(365 * years as i32))
}

/// `count` consecutive calendar dates beginning at `start`
#[must_use]
pub fn date_range(start: Date, count: usize) -> Vec<Date> {
    let base = rata_die(start);
    (0..count as i32).map(|i| rd_to_date(base + i)).collect()
}

/// Convert a Rata Die day number back to a `jiff::civil::Date`.
///
/// Inverse of `rata_die()`, using the same proleptic Gregorian algorithm.
#[inline]
fn rd_to_date(rd: i32) -> Date {
    // Shift so day 0 = March 1, year 0
    let z = rd + 306;
    let h = 100 * z - 25;
    let a = h / 3_652_425;
    let b = a - a / 4;
    let y = (100 * b + h) / 36_525;
    let c = b + z - 365 * y - y / 4;
    let m = (5 * c + 456) / 153;
    let day = c - (153 * m - 457) / 5;

    let (year, month) = if m > 12 { (y + 1, m - 12) } else { (y, m) };

    jiff::civil::date(year as i16, month as i8, day as i8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn test_days_between_matches_jiff() {
        let pairs = [
            (date(2019, 10, 19), date(2024, 10, 17)),
            (date(2024, 2, 28), date(2024, 3, 1)),
            (date(2000, 3, 1), date(2100, 3, 1)),
            (date(2025, 12, 31), date(2026, 1, 1)),
        ];
        for (d1, d2) in pairs {
            assert_eq!(fast_days_between(d1, d2), (d2 - d1).get_days(), "{d1} -> {d2}");
            assert_eq!(fast_days_between(d2, d1), -(d2 - d1).get_days());
        }
    }

    #[test]
    fn test_add_days_crosses_boundaries() {
        assert_eq!(add_days(date(2024, 2, 28), 1), date(2024, 2, 29));
        assert_eq!(add_days(date(2025, 2, 28), 1), date(2025, 3, 1));
        assert_eq!(add_days(date(2025, 1, 1), -1), date(2024, 12, 31));
    }

    #[test]
    fn test_lookback_counts_365_day_years() {
        assert_eq!(lookback_start(date(2025, 6, 15), 0), date(2025, 6, 15));
        assert_eq!(lookback_start(date(2025, 6, 15), 1), date(2024, 6, 15));
        // 2024-02-29 falls inside the window
        assert_eq!(lookback_start(date(2025, 6, 15), 5), date(2020, 6, 16));
    }

    #[test]
    fn test_date_range_is_consecutive() {
        let range = date_range(date(2024, 12, 30), 4);
        assert_eq!(
            range,
            vec![
                date(2024, 12, 30),
                date(2024, 12, 31),
                date(2025, 1, 1),
                date(2025, 1, 2)
            ]
        );
        assert!(date_range(date(2024, 1, 1), 0).is_empty());
        for d in &range {
            assert_eq!(rd_to_date(rata_die(*d)), *d);
        }
    }
}
