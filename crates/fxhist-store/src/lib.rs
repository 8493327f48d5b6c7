//! Binary per-timeframe history files for fxhist.
//!
//! Per-symbol, per-timeframe history files: create/open/append/synchronize/
//! close with the header acting as the crash-recovery checkpoint, a window
//! halving offset search, the multi-period `HistorySet`, and the in-place
//! `BarScaler`.
//!
//! Single writer: the store does not lock files. Running two writers against
//! the same file is an operational error.
//!
//! - [`search`] - Exact, floor, ceiling and covering lookups by open time
//! - [`HistoryFile`] - One open history file with buffered append and merge
//! - [`HistorySet`] - The files of one symbol across periods
//! - [`BarAggregator`] - Folds M1 bars into higher periods
//! - [`BarScaler`] - Rewrites prices of a file in place

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fxhist/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod aggregate;
mod file;
mod scale;
pub mod search;
mod set;

pub use aggregate::BarAggregator;
pub use file::{HistoryFile, HistoryInfo, StoreState, SyncOutcome};
pub use scale::{BarScaler, ScaleOp, ScaleRange, ScaleReport};
pub use search::{OpenTimes, SearchResult};
pub use set::HistorySet;
