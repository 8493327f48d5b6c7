//! Synchronization of raw M1 day data into history sets.
//!
//! Drives history sets from cached raw M1 day files, one FXT trading day at a
//! time. Weekends and holidays are skipped, a missing trading day stops the
//! symbol at its last fully synced day, and cancellation is checked between
//! days so the header checkpoint always describes a whole day.
//!
//! Also home to the symbol catalog, the data-root path builder and the JSON
//! configuration.
//!
//! - [`Synchronizer`] - Day loop with resume, skip and cancellation handling
//! - [`DaySource`] / [`FileDaySource`] - Where a day's M1 bars come from
//! - [`SymbolCatalog`] - Symbol metadata lookup
//! - [`Config`] - Data root and synchronization defaults

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fxhist/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cancel;
mod catalog;
mod config;
mod error;
pub mod paths;
mod source;
mod synchronizer;

pub use cancel::CancelToken;
pub use catalog::{JsonSymbolCatalog, MemoryCatalog, SymbolCatalog};
pub use config::{Config, DATA_ROOT_ENV, TimeBase};
pub use error::{Result, SyncError};
pub use paths::{PathKind, history_dir, history_path};
pub use source::{DaySource, FileDaySource};
pub use synchronizer::{DayProgress, SymbolOutcome, SyncReport, Synchronizer};
