//! Bar record representation.

use serde::{Deserialize, Serialize};

/// One OHLC(V) record for a fixed time bucket.
///
/// `open_time` is in unix seconds of whatever time base the owning store
/// uses (FXT or GMT).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bucket open time in seconds.
    pub open_time: i64,
    /// Opening price.
    pub open: f64,
    /// Highest price during the bucket.
    pub high: f64,
    /// Lowest price during the bucket.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Number of ticks in the bucket.
    pub ticks: u64,
    /// Spread in points (format 401 only).
    pub spread: i32,
    /// Traded volume (format 401 only).
    pub real_volume: u64,
}

impl Bar {
    /// Creates a new bar with tick volume only.
    #[must_use]
    pub const fn new(open_time: i64, open: f64, high: f64, low: f64, close: f64, ticks: u64) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
            ticks,
            spread: 0,
            real_volume: 0,
        }
    }

    /// Sets the spread and real volume carried by format 401.
    #[must_use]
    pub const fn with_extended(mut self, spread: i32, real_volume: u64) -> Self {
        self.spread = spread;
        self.real_volume = real_volume;
        self
    }

    /// Returns true if `low <= open, close <= high`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.low <= self.open
            && self.open <= self.high
            && self.low <= self.close
            && self.close <= self.high
    }

    /// Returns true if the bar satisfies the invariants of a feed-produced bar.
    #[must_use]
    pub fn is_valid_feed_bar(&self) -> bool {
        self.is_consistent() && self.ticks > 0
    }

    /// Folds a later bar of the same bucket into this one.
    pub fn merge(&mut self, later: &Self) {
        self.high = self.high.max(later.high);
        self.low = self.low.min(later.low);
        self.close = later.close;
        self.ticks += later.ticks;
        self.real_volume += later.real_volume;
        self.spread = later.spread;
    }
}

/// Raw M1 record as stored in a cached day file, prices in integer points.
///
/// The day file stores records as 24 bytes in little-endian order:
/// - `u32`: open time (FXT seconds)
/// - `u32`: open, high, low, close in points
/// - `u32`: tick count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBar {
    /// Open time in FXT seconds.
    pub time: u32,
    /// Open price in points.
    pub open: u32,
    /// High price in points.
    pub high: u32,
    /// Low price in points.
    pub low: u32,
    /// Close price in points.
    pub close: u32,
    /// Number of ticks.
    pub ticks: u32,
}

impl RawBar {
    /// Size in bytes of a raw record.
    pub const SIZE: usize = 24;

    /// Creates a new raw bar.
    #[must_use]
    pub const fn new(time: u32, open: u32, high: u32, low: u32, close: u32, ticks: u32) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            ticks,
        }
    }

    /// Converts point prices to decimal prices using the symbol's digits.
    ///
    /// With 5 digits a raw price of 112345 becomes 1.12345.
    #[must_use]
    pub fn normalize(self, digits: u32) -> Bar {
        let factor = 10f64.powi(digits as i32);
        Bar::new(
            i64::from(self.time),
            f64::from(self.open) / factor,
            f64::from(self.high) / factor,
            f64::from(self.low) / factor,
            f64::from(self.close) / factor,
            u64::from(self.ticks),
        )
    }
}
