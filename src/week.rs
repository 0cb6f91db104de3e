//! Calendar week keys
//!
//! Week labels use a custom, non-ISO scheme:
//! - the key is `(calendar year, week of year)`, where weeks start on Sunday and
//!   week 1 is the week containing January 1. Late-December days that share a
//!   week with the next January 1 therefore get week 1 of their own calendar year.
//! - the label is the first Monday on/after January 1 of that year, plus
//!   `week - 1` weeks.
//!
//! Labels must stay stable across runs, so this is never replaced by ISO weeks.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Sunday that starts the week containing `date`
fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

fn jan_first(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
}

/// Sunday-start week number of `date`; week 1 contains January 1
pub fn week_of_year(date: NaiveDate) -> u32 {
    let week_start = start_of_week(date);
    let year = date.year();

    // A date on/after the start of next year's first week belongs to week 1
    let week_year = match jan_first(year + 1) {
        Some(next) if week_start >= start_of_week(next) => year + 1,
        _ => year,
    };

    match jan_first(week_year) {
        Some(first) => ((week_start - start_of_week(first)).num_days() / 7) as u32 + 1,
        None => 1,
    }
}

/// `(calendar year, week of year)` for an instant, evaluated in UTC
pub fn week_key(instant: DateTime<Utc>) -> (i32, u32) {
    let date = instant.date_naive();
    (date.year(), week_of_year(date))
}

/// Monday that labels week `week` of `year`
pub fn week_start(year: i32, week: u32) -> Option<NaiveDate> {
    let first = jan_first(year)?;
    let to_monday = (7 - first.weekday().num_days_from_monday()) % 7;
    let first_monday = first + Duration::days(to_monday as i64);
    first_monday.checked_add_signed(Duration::weeks(week.saturating_sub(1) as i64))
}

/// `YYYY-MM-DD` label of the week containing `instant`
pub fn week_label(instant: DateTime<Utc>) -> Option<String> {
    let (year, week) = week_key(instant);
    week_start(year, week).map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_week_of_year_sunday_start() {
        // 2024-01-01 is a Monday; its week started Sunday 2023-12-31
        assert_eq!(week_of_year(date(2024, 1, 1)), 1);
        assert_eq!(week_of_year(date(2024, 1, 6)), 1);
        assert_eq!(week_of_year(date(2024, 1, 7)), 2);
        assert_eq!(week_of_year(date(2024, 12, 28)), 52);
    }

    #[test]
    fn test_late_december_rolls_into_week_one() {
        // 2024-12-29 is the Sunday of the week containing 2025-01-01
        assert_eq!(week_of_year(date(2024, 12, 29)), 1);
        assert_eq!(week_key(at(2024, 12, 29)), (2024, 1));
        // ...and is labelled with the first Monday of its own calendar year
        assert_eq!(week_label(at(2024, 12, 29)).unwrap(), "2024-01-01");
    }

    #[test]
    fn test_first_monday_when_jan_first_is_monday() {
        assert_eq!(week_start(2024, 1), Some(date(2024, 1, 1)));
    }

    #[test]
    fn test_first_monday_after_jan_first() {
        // 2023-01-01 is a Sunday, 2025-01-01 a Wednesday
        assert_eq!(week_start(2023, 1), Some(date(2023, 1, 2)));
        assert_eq!(week_start(2025, 1), Some(date(2025, 1, 6)));
        assert_eq!(week_start(2025, 3), Some(date(2025, 1, 20)));
    }

    #[test]
    fn test_week_labels() {
        assert_eq!(week_label(at(2024, 1, 1)).unwrap(), "2024-01-01");
        assert_eq!(week_label(at(2024, 1, 7)).unwrap(), "2024-01-08");
        assert_eq!(week_label(at(2024, 12, 28)).unwrap(), "2024-12-23");
        assert_eq!(week_label(at(2025, 1, 1)).unwrap(), "2025-01-06");
        // 1700000000000 ms = Tuesday 2023-11-14
        let instant = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        assert_eq!(week_key(instant), (2023, 46));
        assert_eq!(week_label(instant).unwrap(), "2023-11-13");
    }

    #[test]
    fn test_not_iso_weeks() {
        // ISO puts 2023-01-01 in week 52 of 2022
        assert_eq!(week_key(at(2023, 1, 1)), (2023, 1));
    }
}
