//! Period open/close computation.

use chrono::{DateTime, Datelike, NaiveDate};
use fxhist_types::{CalendarError, Period};

const DAY: i64 = 86_400;
const WEEK: i64 = 7 * DAY;
/// 1970-01-01 was a Thursday; shifting by three days puts Monday at zero.
const MONDAY_SHIFT: i64 = 3 * DAY;

/// Half-open interval `[open_time, close_time)` a bar belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodBoundary {
    /// Bucket open time.
    pub open_time: i64,
    /// Bucket close time (exclusive).
    pub close_time: i64,
}

impl PeriodBoundary {
    /// Computes the bucket containing `time`.
    ///
    /// # Errors
    ///
    /// Returns an error if `time` cannot be mapped onto a calendar date.
    pub fn containing(time: i64, period: Period) -> Result<Self, CalendarError> {
        let open_time = period_open(time, period)?;
        Ok(Self {
            open_time,
            close_time: close_time(open_time, period)?,
        })
    }

    /// Returns true if `time` lies inside the interval.
    #[must_use]
    pub const fn contains(&self, time: i64) -> bool {
        self.open_time <= time && time < self.close_time
    }
}

/// Returns the open time of the bucket containing `time`.
///
/// Weeks start on Monday 00:00, months on the first day 00:00.
///
/// # Errors
///
/// Returns an error if `time` cannot be mapped onto a calendar date (`MN1` only).
pub fn period_open(time: i64, period: Period) -> Result<i64, CalendarError> {
    match (period, period.fixed_seconds()) {
        (Period::W1, _) => Ok(time - (time + MONDAY_SHIFT).rem_euclid(WEEK)),
        (_, Some(width)) => Ok(time - time.rem_euclid(width)),
        (_, None) => {
            let date = to_date(time)?;
            month_start(date.year(), date.month(), time)
        }
    }
}

/// Returns the close time of the bucket that opens at or contains `open_time`.
///
/// For periods up to `D1` this is plain bucket arithmetic; `W1` aligns to
/// the preceding Monday and adds seven days; `MN1` aligns to the first of
/// the month and adds one calendar month.
///
/// # Errors
///
/// Returns an error if `open_time` cannot be mapped onto a calendar date (`MN1` only).
pub fn close_time(open_time: i64, period: Period) -> Result<i64, CalendarError> {
    match (period, period.fixed_seconds()) {
        (Period::W1, _) => Ok(period_open(open_time, period)? + WEEK),
        (_, Some(width)) => Ok(open_time - open_time.rem_euclid(width) + width),
        (_, None) => {
            let date = to_date(open_time)?;
            let (year, month) = if date.month() == 12 {
                (date.year() + 1, 1)
            } else {
                (date.year(), date.month() + 1)
            };
            month_start(year, month, open_time)
        }
    }
}

fn to_date(time: i64) -> Result<NaiveDate, CalendarError> {
    DateTime::from_timestamp(time, 0)
        .map(|dt| dt.date_naive())
        .ok_or(CalendarError::OutOfRange(time))
}

fn month_start(year: i32, month: u32, time: i64) -> Result<i64, CalendarError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .ok_or(CalendarError::OutOfRange(time))
}
