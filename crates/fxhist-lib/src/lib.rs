//! Binary forex price-history store.
//!
//! Facade over the fxhist workspace: bar and period types, the FXT trading
//! calendar, the 400/401 record codec, history files and sets, and the
//! day-by-day synchronizer.
//!
//! # Quick Start
//!
//! ```ignore
//! use fxhist_lib::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(None)?;
//!     let catalog = JsonSymbolCatalog::load(config.catalog_path())?;
//!     let symbol = catalog.lookup("EURUSD")?;
//!
//!     let sync = Synchronizer::new(FileDaySource::new(&config.data_root), config.history_dir())
//!         .with_periods(&config.periods);
//!     let until = chrono::NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
//!     let report = sync.sync_symbol(&symbol, until)?;
//!     println!("{} bars appended", report.bars_appended);
//!
//!     Ok(())
//! }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fxhist/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use fxhist_types::*;

// Re-export the trading-time layer
pub use fxhist_calendar::{
    CalendarZone, FixedHoliday, HolidayRule, PeriodBoundary, TradingCalendar, close_time,
    fxt_offset, fxt_to_gmt, gmt_to_fxt, period_open,
};

// Re-export record formats
pub use fxhist_format::{
    BarCodec, FormatVersion, HEADER_SIZE, HistoryHeader, RewriteJournal, parse_raw_bars,
};

// Re-export history files
#[cfg(feature = "store")]
pub use fxhist_store::{
    BarAggregator, BarScaler, HistoryFile, HistoryInfo, HistorySet, OpenTimes, ScaleOp,
    ScaleRange, ScaleReport, SearchResult, StoreState, SyncOutcome, search,
};

// Re-export synchronization
#[cfg(feature = "sync")]
pub use fxhist_sync::{
    CancelToken, Config, DaySource, FileDaySource, JsonSymbolCatalog, MemoryCatalog, PathKind,
    SymbolCatalog, SymbolOutcome, SyncError, SyncReport, Synchronizer, TimeBase, history_dir,
    history_path,
};

/// Prelude module for convenient imports.
///
/// ```
/// use fxhist_lib::prelude::*;
/// ```
pub mod prelude {
    pub use fxhist_types::{
        Bar, DateRange, FormatError, HistoryError, Period, Result, SymbolInfo, SymbolKind,
    };

    pub use fxhist_calendar::{CalendarZone, TradingCalendar, close_time, period_open};

    pub use fxhist_format::FormatVersion;

    #[cfg(feature = "store")]
    pub use fxhist_store::{BarScaler, HistoryFile, HistorySet, ScaleOp, ScaleRange};

    #[cfg(feature = "sync")]
    pub use fxhist_sync::{
        CancelToken, Config, FileDaySource, JsonSymbolCatalog, SymbolCatalog, Synchronizer,
        TimeBase,
    };
}
