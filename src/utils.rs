use crate::error::{ProjectionError, Result};
use chrono::{Datelike, Duration, NaiveDate};

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Builds `year-month-dom`, pulling `dom` back to the last day of the month
/// when the month is shorter (a dom of 31 lands on Feb 28 or 29).
pub fn clamped_date(year: i32, month: u32, dom: u32) -> Option<NaiveDate> {
    let day = dom.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Months since year 0, so that consecutive calendar months differ by one.
pub fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

pub fn date_from_month_index(index: i64, dom: u32) -> Option<NaiveDate> {
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = index.rem_euclid(12) as u32 + 1;
    clamped_date(year, month, dom)
}

pub fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    month_index(end) - month_index(start)
}

pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
}

/// Number of points in the inclusive walk `from, from + step, ..` up to `to`.
pub fn series_point_count(from: NaiveDate, to: NaiveDate, step_days: u32) -> usize {
    let days = days_between(from, to);
    if days < 0 || step_days == 0 {
        return 0;
    }
    (days / step_days as i64) as usize + 1
}

/// Dates `from, from + step, ..` strictly before `until`, or up to and
/// including it when `inclusive` is set.
pub fn step_dates(
    from: NaiveDate,
    until: NaiveDate,
    step_days: u32,
    inclusive: bool,
) -> impl Iterator<Item = NaiveDate> {
    let step = step_days.max(1) as i64;
    std::iter::successors(Some(from), move |d| add_days(*d, step))
        .take_while(move |d| if inclusive { *d <= until } else { *d < until })
}

/// Strict `YYYY-MM-DD` parsing. Shape errors and impossible calendar dates
/// are reported separately, naming the offending field.
pub fn parse_iso_date(value: &str, field: &str) -> Result<NaiveDate> {
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(ProjectionError::MalformedDate {
            field: field.to_string(),
        });
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ProjectionError::InvalidCalendarDate {
            field: field.to_string(),
        }
    })
}
