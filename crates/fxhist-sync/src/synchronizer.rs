//! Day-by-day synchronization of a symbol's history set.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use fxhist_calendar::{TradingCalendar, fxt_to_gmt};
use fxhist_format::FormatVersion;
use fxhist_store::HistorySet;
use fxhist_types::{DateRange, Period, SymbolInfo};
use tracing::{debug, error, info, warn};

use crate::{CancelToken, DaySource, Result, SymbolCatalog, SyncError, TimeBase};

/// Bars in a complete M1 trading day.
const MINUTES_PER_DAY: usize = 1440;

/// Progress of a run, reported after each processed day.
#[derive(Debug, Clone, Copy)]
pub struct DayProgress<'a> {
    /// Symbol being synchronized.
    pub symbol: &'a str,
    /// Day just processed.
    pub date: NaiveDate,
    /// Days processed so far, including this one.
    pub done: usize,
    /// Days in the run.
    pub total: usize,
}

type ProgressFn = dyn Fn(DayProgress<'_>) + Send + Sync;

/// What a synchronization run did for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// Symbol name.
    pub symbol: String,
    /// Days the run covered; `None` if the set was already up to date.
    pub range: Option<DateRange>,
    /// Trading days merged.
    pub days_synced: usize,
    /// Weekend and holiday days passed over.
    pub days_skipped: usize,
    /// Trading days with fewer than a full day of M1 bars.
    pub partial_days: usize,
    /// New M1 bars appended.
    pub bars_appended: usize,
    /// True if the run stopped early on cancellation.
    pub cancelled: bool,
}

impl SyncReport {
    fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ..Self::default()
        }
    }
}

/// Per-symbol result of a batch run.
#[derive(Debug)]
pub struct SymbolOutcome {
    /// Symbol as requested.
    pub symbol: String,
    /// Report or the error that stopped this symbol.
    pub result: Result<SyncReport>,
}

/// Merges daily M1 bars from a [`DaySource`] into history sets.
///
/// Each trading day is merged and checkpointed before the next one is
/// loaded, so an interrupted run leaves every file at a whole day.
pub struct Synchronizer<S> {
    source: S,
    history_dir: PathBuf,
    format: FormatVersion,
    periods: Vec<Period>,
    calendar: TradingCalendar,
    time_base: TimeBase,
    cancel: CancelToken,
    progress: Option<Box<ProgressFn>>,
}

impl<S: DaySource> Synchronizer<S> {
    /// Creates a synchronizer writing every standard period into `history_dir`.
    #[must_use]
    pub fn new(source: S, history_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            history_dir: history_dir.into(),
            format: FormatVersion::default(),
            periods: Period::all().to_vec(),
            calendar: TradingCalendar::default(),
            time_base: TimeBase::default(),
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    /// Sets the record layout for newly created files.
    #[must_use]
    pub fn with_format(mut self, format: FormatVersion) -> Self {
        self.format = format;
        self
    }

    /// Sets the periods maintained per symbol.
    #[must_use]
    pub fn with_periods(mut self, periods: &[Period]) -> Self {
        self.periods = periods.to_vec();
        self
    }

    /// Sets the trading calendar used to skip days.
    #[must_use]
    pub fn with_calendar(mut self, calendar: TradingCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Sets the clock of stored bar times.
    #[must_use]
    pub fn with_time_base(mut self, time_base: TimeBase) -> Self {
        self.time_base = time_base;
        self
    }

    /// Sets the token polled between days.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Sets a callback invoked after each processed day.
    #[must_use]
    pub fn with_progress(mut self, progress: impl Fn(DayProgress<'_>) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Returns the directory of the history files.
    #[must_use]
    pub fn history_dir(&self) -> &Path {
        &self.history_dir
    }

    /// Synchronizes one symbol from where its files left off through `until`.
    ///
    /// The files are closed on every path, including errors and cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MissingSourceDay`] if a trading day has no data,
    /// [`SyncError::NoStartDate`] for a new symbol without a catalog start,
    /// and history errors. Days before the failing one stay synced.
    pub fn sync_symbol(&self, symbol: &SymbolInfo, until: NaiveDate) -> Result<SyncReport> {
        let name = symbol.name().to_uppercase();
        let mut set = HistorySet::open_or_create(
            &self.history_dir,
            &name,
            symbol.digits(),
            self.format,
            &self.periods,
        )?;

        let result = self.sync_open_set(&mut set, symbol, until);
        let closed = set.close();
        let report = result?;
        closed?;

        info!(
            symbol = %name,
            days = report.days_synced,
            skipped = report.days_skipped,
            partial = report.partial_days,
            bars = report.bars_appended,
            cancelled = report.cancelled,
            "synchronized symbol"
        );
        Ok(report)
    }

    /// Synchronizes several symbols in order, continuing past failures.
    ///
    /// Stops before the next symbol once cancellation is requested.
    pub fn sync_symbols(
        &self,
        catalog: &dyn SymbolCatalog,
        symbols: &[String],
        until: NaiveDate,
    ) -> Vec<SymbolOutcome> {
        let mut outcomes = Vec::with_capacity(symbols.len());
        for name in symbols {
            if self.cancel.is_cancelled() {
                break;
            }
            let result = catalog
                .lookup(name)
                .and_then(|info| self.sync_symbol(&info, until));
            if let Err(e) = &result {
                error!(symbol = %name, error = %e, "synchronization failed");
            }
            outcomes.push(SymbolOutcome {
                symbol: name.clone(),
                result,
            });
        }
        outcomes
    }

    /// Returns the first day a run for this set has to process.
    ///
    /// That is the FXT day of the set's last sync time, which is re-synced
    /// idempotently, or the catalog's history start for a new set.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NoStartDate`] if neither is known.
    pub fn resume_date(&self, set: &HistorySet, symbol: &SymbolInfo) -> Result<NaiveDate> {
        match set.last_sync_time() {
            Some(time) => Ok(self.time_base.fxt_date(time)?),
            None => symbol
                .history_start()
                .ok_or_else(|| SyncError::NoStartDate(symbol.name().to_string())),
        }
    }

    fn sync_open_set(
        &self,
        set: &mut HistorySet,
        symbol: &SymbolInfo,
        until: NaiveDate,
    ) -> Result<SyncReport> {
        let start = self.resume_date(set, symbol)?;
        if start > until {
            debug!(symbol = symbol.name(), %start, %until, "history set is up to date");
            return Ok(SyncReport::new(symbol.name()));
        }
        self.run(set, symbol, DateRange::new(start, until)?)
    }

    /// Merges every trading day of `days` into an open set.
    ///
    /// Cancellation is checked before each day. The caller owns the set and
    /// is responsible for closing it.
    ///
    /// # Errors
    ///
    /// Returns the first day's error; earlier days stay checkpointed.
    pub fn run(&self, set: &mut HistorySet, symbol: &SymbolInfo, days: DateRange) -> Result<SyncReport> {
        let mut report = SyncReport::new(symbol.name());
        report.range = Some(days);
        let total = days.total_days();

        for (index, date) in days.days().enumerate() {
            if self.cancel.is_cancelled() {
                info!(symbol = symbol.name(), %date, "synchronization cancelled");
                report.cancelled = true;
                break;
            }

            if self.calendar.is_trading_date(date) {
                self.sync_day(set, symbol, date, &mut report)?;
            } else {
                debug!(symbol = symbol.name(), %date, "skipping non-trading day");
                report.days_skipped += 1;
            }

            if let Some(progress) = &self.progress {
                progress(DayProgress {
                    symbol: symbol.name(),
                    date,
                    done: index + 1,
                    total,
                });
            }
        }
        Ok(report)
    }

    fn sync_day(
        &self,
        set: &mut HistorySet,
        symbol: &SymbolInfo,
        date: NaiveDate,
        report: &mut SyncReport,
    ) -> Result<()> {
        let mut bars = self.source.load_day(symbol, date)?;
        if bars.len() < MINUTES_PER_DAY {
            warn!(symbol = symbol.name(), %date, bars = bars.len(), "partial trading day");
            report.partial_days += 1;
        }
        if self.time_base == TimeBase::Gmt {
            for bar in &mut bars {
                bar.open_time = fxt_to_gmt(bar.open_time)?;
            }
        }

        let outcomes = set.synchronize(&bars)?;
        let appended = outcomes
            .get(&Period::M1)
            .or_else(|| outcomes.values().next())
            .map_or(0, |outcome| outcome.appended);
        report.bars_appended += appended;
        report.days_synced += 1;

        debug!(symbol = symbol.name(), %date, bars = bars.len(), appended, "synchronized day");
        Ok(())
    }
}

impl<S: fmt::Debug> fmt::Debug for Synchronizer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synchronizer")
            .field("source", &self.source)
            .field("history_dir", &self.history_dir)
            .field("format", &self.format)
            .field("periods", &self.periods)
            .field("calendar", &self.calendar)
            .field("time_base", &self.time_base)
            .field("cancel", &self.cancel)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}
