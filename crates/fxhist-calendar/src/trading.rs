//! Trading-day classification.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Weekday};
use fxhist_types::CalendarError;

use crate::gmt_to_fxt;

/// Time zone in which a trading day is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CalendarZone {
    /// Greenwich Mean Time.
    Gmt,
    /// Forex Time (`America/New_York + 7h`).
    #[default]
    Fxt,
}

impl CalendarZone {
    /// Converts a GMT timestamp into this zone's local timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the FXT offset is unknown for `gmt_time`.
    pub fn local_time(self, gmt_time: i64) -> Result<i64, CalendarError> {
        match self {
            Self::Gmt => Ok(gmt_time),
            Self::Fxt => gmt_to_fxt(gmt_time),
        }
    }

    /// Returns the local calendar date of a GMT timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the time cannot be converted or mapped onto a date.
    pub fn local_date(self, gmt_time: i64) -> Result<NaiveDate, CalendarError> {
        let local = self.local_time(gmt_time)?;
        DateTime::from_timestamp(local, 0)
            .map(|dt| dt.date_naive())
            .ok_or(CalendarError::OutOfRange(local))
    }
}

/// A rule marking dates as non-trading.
pub trait HolidayRule: Send + Sync {
    /// Returns true if markets are closed on `date`.
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

/// A holiday on the same month and day every year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHoliday {
    month: u32,
    day: u32,
}

impl FixedHoliday {
    /// New Year's Day.
    pub const NEW_YEAR: Self = Self::new(1, 1);
    /// Christmas Day.
    pub const CHRISTMAS: Self = Self::new(12, 25);

    /// Creates a fixed holiday.
    #[must_use]
    pub const fn new(month: u32, day: u32) -> Self {
        Self { month, day }
    }
}

impl HolidayRule for FixedHoliday {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        date.month() == self.month && date.day() == self.day
    }
}

/// Weekend and holiday calendar.
///
/// The default calendar closes Saturdays, Sundays, January 1 and December 25.
#[derive(Clone)]
pub struct TradingCalendar {
    holidays: Vec<Arc<dyn HolidayRule>>,
}

impl TradingCalendar {
    /// Creates a calendar with weekends closed and no holidays.
    #[must_use]
    pub fn weekends_only() -> Self {
        Self {
            holidays: Vec::new(),
        }
    }

    /// Adds a holiday rule.
    #[must_use]
    pub fn with_holiday(mut self, rule: impl HolidayRule + 'static) -> Self {
        self.holidays.push(Arc::new(rule));
        self
    }

    /// Returns true if `date` is neither a weekend nor a holiday.
    #[must_use]
    pub fn is_trading_date(&self, date: NaiveDate) -> bool {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        !self.holidays.iter().any(|rule| rule.is_holiday(date))
    }

    /// Returns true if the GMT timestamp falls on a trading day in `zone`.
    ///
    /// # Errors
    ///
    /// Returns an error if the FXT offset is unknown for `gmt_time`.
    pub fn is_trading_day(&self, gmt_time: i64, zone: CalendarZone) -> Result<bool, CalendarError> {
        Ok(self.is_trading_date(zone.local_date(gmt_time)?))
    }
}

impl Default for TradingCalendar {
    fn default() -> Self {
        Self::weekends_only()
            .with_holiday(FixedHoliday::NEW_YEAR)
            .with_holiday(FixedHoliday::CHRISTMAS)
    }
}

impl fmt::Debug for TradingCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TradingCalendar")
            .field("holidays", &self.holidays.len())
            .finish()
    }
}
