//! Core types for the fxhist price-history store.
//!
//! Core types shared by the fxhist crates: the `Bar` record, the raw M1 day
//! record, standard `Period`s, date ranges, symbol metadata and the error
//! taxonomy used across the workspace.
//!
//! This crate provides the fundamental data structures used throughout fxhist:
//!
//! - [`Bar`] - One OHLC(V) record for a fixed time bucket
//! - [`RawBar`] - Raw M1 record in integer points, as cached per day
//! - [`Period`] - Standard MetaTrader timeframe
//! - [`DateRange`] - Inclusive range of days
//! - [`SymbolInfo`] - Symbol metadata consumed from a catalog

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fxhist/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bar;
mod date_range;
mod error;
mod period;
mod symbol;

pub use bar::{Bar, RawBar};
pub use date_range::{DateRange, DayIterator};
pub use error::{CalendarError, DateRangeError, FormatError, HistoryError, Result};
pub use period::{Period, PeriodParseError};
pub use symbol::{SymbolInfo, SymbolKind};
