//! Errors raised while synchronizing symbols.

use std::path::PathBuf;

use chrono::NaiveDate;
use fxhist_types::{CalendarError, DateRangeError, FormatError, HistoryError};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while driving a synchronization run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A history file operation failed.
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Trading-time lookup failed.
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// The requested day range is empty.
    #[error(transparent)]
    DateRange(#[from] DateRangeError),

    /// The source has no data for a trading day.
    #[error("no source data for {symbol} on {date}: {}", path.display())]
    MissingSourceDay {
        /// Symbol being synchronized.
        symbol: String,
        /// FXT trading day.
        date: NaiveDate,
        /// Where the day file was expected.
        path: PathBuf,
    },

    /// Failed to read a source day file.
    #[error("failed to read source file '{}': {source}", path.display())]
    SourceRead {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A source day file holds a bar that cannot be ingested.
    #[error("invalid bar at {time} in source file '{}': {reason}", path.display())]
    InvalidSourceBar {
        /// The day file.
        path: PathBuf,
        /// Open time of the offending bar.
        time: i64,
        /// What is wrong with it.
        reason: String,
    },

    /// The catalog does not know the symbol.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    /// Neither the history files nor the catalog tell where to start.
    #[error("no history start recorded for {0}")]
    NoStartDate(String),

    /// The symbol catalog could not be read or written.
    #[error("symbol catalog '{}': {source}", path.display())]
    Catalog {
        /// Catalog location.
        path: PathBuf,
        /// The underlying error.
        source: BoxError,
    },

    /// The configuration could not be read or written.
    #[error("config '{}': {source}", path.display())]
    Config {
        /// Config location.
        path: PathBuf,
        /// The underlying error.
        source: BoxError,
    },
}

impl From<FormatError> for SyncError {
    fn from(error: FormatError) -> Self {
        Self::History(error.into())
    }
}

impl SyncError {
    pub(crate) fn catalog(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self::Catalog {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn config(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self::Config {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Result type for synchronization operations.
pub type Result<T> = std::result::Result<T, SyncError>;
