//! Error types for fxhist.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for history store operations.
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Unsupported or corrupt history data. Always fatal for the affected file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The file is shorter than a history header.
    #[error("not a history file: {len} bytes is shorter than a header")]
    NotHistoryFile {
        /// Length of the data that was inspected.
        len: u64,
    },

    /// The header names a format version this crate cannot read.
    #[error("history format {0} not yet implemented")]
    UnsupportedFormat(u32),

    /// The header carries a period id that is not a standard timeframe.
    #[error("invalid period id {0} in history header")]
    InvalidPeriod(u32),

    /// A record slice does not have the size of the format's bar record.
    #[error("invalid record length: {actual} bytes (expected {expected})")]
    RecordLength {
        /// Record size of the format.
        expected: usize,
        /// Size of the slice handed in.
        actual: usize,
    },

    /// The file does not end on a record boundary.
    #[error("file size {len} leaves {extra} trailing bytes after the last full record")]
    TrailingBytes {
        /// Total file length.
        len: u64,
        /// Bytes past the last complete record.
        extra: u64,
    },

    /// The symbol does not fit the fixed-width header field.
    #[error("symbol '{0}' exceeds the header's symbol field")]
    SymbolTooLong(String),

    /// A bar time cannot be represented by the record layout.
    #[error("bar time {0} cannot be represented in this format")]
    TimeOutOfRange(i64),

    /// The header identity differs from the file that was asked for.
    #[error("header mismatch: expected {expected}, found {found}")]
    HeaderMismatch {
        /// Identity the caller asked for.
        expected: String,
        /// Identity found in the header.
        found: String,
    },
}

/// Errors from the trading-time layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// The FXT offset is not known for this GMT time.
    #[error("FXT offset unknown for timestamp {0}")]
    UnknownFxtOffset(i64),

    /// The timestamp cannot be mapped onto a calendar date.
    #[error("timestamp {0} is out of calendar range")]
    OutOfRange(i64),
}

/// Error for invalid date ranges.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    /// Start date is after end date.
    #[error("Invalid date range: {start} > {end}")]
    InvalidRange {
        /// The start date.
        start: NaiveDate,
        /// The end date.
        end: NaiveDate,
    },
}

/// Errors raised by history files and sets.
///
/// `NotFound` and `Gap` are frequently a legitimate branch for the caller;
/// `Format` and `SyncConflict` never are.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// Unsupported or corrupt header/record.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Trading-time lookup failed.
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// No history file at the given path.
    #[error("history file not found: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// Refused to overwrite an existing history file.
    #[error("history file already exists: {}", path.display())]
    AlreadyExists {
        /// Path that already exists.
        path: PathBuf,
    },

    /// The requested time falls in a gap between bars.
    #[error("no bar covers time {time}")]
    Gap {
        /// Requested time.
        time: i64,
    },

    /// Incoming data overlaps persisted data without being a duplicate.
    #[error("sync conflict at {time}: {reason}")]
    SyncConflict {
        /// Open time of the offending bar.
        time: i64,
        /// What did not match.
        reason: String,
    },

    /// Rejected operand for a bar transformation.
    #[error("invalid operand: {0}")]
    InvalidOperand(String),

    /// The store was already closed.
    #[error("history file is closed")]
    Closed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HistoryError {
    /// Returns true for the `NotFound` branch.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Creates a sync conflict for the bar at `time`.
    pub fn conflict(time: i64, reason: impl Into<String>) -> Self {
        Self::SyncConflict {
            time,
            reason: reason.into(),
        }
    }
}
