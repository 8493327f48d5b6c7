//! End-to-end synchronization scenarios against an in-memory day source.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use fxhist_format::FormatVersion;
use fxhist_store::{HistoryFile, HistorySet};
use fxhist_sync::{
    CancelToken, DaySource, MemoryCatalog, Result, SyncError, Synchronizer, TimeBase,
};
use fxhist_types::{Bar, Period, SymbolInfo, SymbolKind};
use tempfile::TempDir;

#[derive(Debug, Default)]
struct MemorySource {
    days: BTreeMap<NaiveDate, Vec<Bar>>,
}

impl MemorySource {
    fn with_days(dates: &[NaiveDate]) -> Self {
        Self {
            days: dates.iter().map(|d| (*d, full_day(*d))).collect(),
        }
    }
}

impl DaySource for MemorySource {
    fn load_day(&self, symbol: &SymbolInfo, date: NaiveDate) -> Result<Vec<Bar>> {
        self.days
            .get(&date)
            .cloned()
            .ok_or_else(|| SyncError::MissingSourceDay {
                symbol: symbol.name().to_string(),
                date,
                path: Path::new("memory").to_path_buf(),
            })
    }
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn day_start(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp()
}

fn full_day(date: NaiveDate) -> Vec<Bar> {
    let start = day_start(date);
    (0..1440)
        .map(|i| {
            let price = 1.1 + (i % 100) as f64 * 0.00001;
            Bar::new(start + i * 60, price, price + 0.0002, price - 0.0002, price + 0.0001, 4)
        })
        .collect()
}

fn eurusd() -> SymbolInfo {
    SymbolInfo::new("EURUSD", "Euro vs US Dollar", SymbolKind::Forex, 5, "dukascopy")
        .with_history(Some(date(2)), None)
}

fn m1_bars(dir: &Path) -> Vec<Bar> {
    HistoryFile::open(dir, "EURUSD", Period::M1).unwrap().bars().unwrap()
}

#[test]
fn test_fresh_symbol_three_days() {
    let dir = TempDir::new().unwrap();
    let source = MemorySource::with_days(&[date(2), date(3), date(4)]);
    let sync = Synchronizer::new(source, dir.path()).with_periods(&[Period::M1, Period::H1, Period::D1]);

    let report = sync.sync_symbol(&eurusd(), date(4)).unwrap();
    assert_eq!(report.days_synced, 3);
    assert_eq!(report.bars_appended, 4320);
    assert_eq!(report.partial_days, 0);

    let bars = m1_bars(dir.path());
    assert_eq!(bars.len(), 4320);
    let last = bars.last().unwrap().open_time;
    assert_eq!(last, day_start(date(4)) + 1439 * 60);

    let info = HistoryFile::open_read_only(dir.path().join("EURUSD1.hst")).unwrap();
    assert_eq!(info.header.last_sync_time, Some(last));
    assert_eq!(HistoryFile::open_read_only(dir.path().join("EURUSD60.hst")).unwrap().bars, 72);
    assert_eq!(HistoryFile::open_read_only(dir.path().join("EURUSD1440.hst")).unwrap().bars, 3);
}

#[test]
fn test_weekend_is_skipped() {
    let dir = TempDir::new().unwrap();
    // Friday the 5th and Monday the 8th only
    let source = MemorySource::with_days(&[date(5), date(8)]);
    let symbol = eurusd().with_history(Some(date(5)), None);
    let sync = Synchronizer::new(source, dir.path()).with_periods(&[Period::M1, Period::W1]);

    let report = sync.sync_symbol(&symbol, date(8)).unwrap();
    assert_eq!(report.days_synced, 2);
    assert_eq!(report.days_skipped, 2);
    assert_eq!(m1_bars(dir.path()).len(), 2880);

    let weekly = HistoryFile::open(dir.path(), "EURUSD", Period::W1).unwrap().bars().unwrap();
    assert_eq!(weekly.len(), 2);
    assert_eq!(weekly[1].open_time, day_start(date(8)));
}

#[test]
fn test_resume_after_interruption() {
    let dir = TempDir::new().unwrap();
    let periods = [Period::M1, Period::H1];

    // day 1 fully, then the store is closed part way through day 2
    let mut set = HistorySet::create(dir.path(), "EURUSD", 5, FormatVersion::V400, &periods).unwrap();
    set.synchronize(&full_day(date(2))).unwrap();
    set.synchronize(&full_day(date(3))[..700]).unwrap();
    set.close().unwrap();

    let source = MemorySource::with_days(&[date(2), date(3)]);
    let sync = Synchronizer::new(source, dir.path()).with_periods(&periods);
    let report = sync.sync_symbol(&eurusd(), date(3)).unwrap();
    assert_eq!(report.range.unwrap().start, date(3));
    assert_eq!(report.bars_appended, 740);

    let bars = m1_bars(dir.path());
    assert_eq!(bars.len(), 2880);
    assert!(bars.windows(2).all(|pair| pair[0].open_time < pair[1].open_time));
    assert_eq!(bars.last().unwrap().open_time, day_start(date(3)) + 1439 * 60);

    let hourly = HistoryFile::open(dir.path(), "EURUSD", Period::H1).unwrap().bars().unwrap();
    assert_eq!(hourly.len(), 48);
    assert!(hourly.iter().all(|bar| bar.ticks == 60 * 4));
}

#[test]
fn test_second_run_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let source = MemorySource::with_days(&[date(2), date(3)]);
    let sync = Synchronizer::new(source, dir.path()).with_periods(&[Period::M1, Period::M15, Period::MN1]);
    sync.sync_symbol(&eurusd(), date(3)).unwrap();

    let snapshot = |name: &str| fs::read(dir.path().join(name)).unwrap();
    let before: Vec<_> = ["EURUSD1.hst", "EURUSD15.hst", "EURUSD43200.hst"].map(snapshot).to_vec();

    let again = sync.sync_symbol(&eurusd(), date(3)).unwrap();
    assert_eq!(again.bars_appended, 0);
    let after: Vec<_> = ["EURUSD1.hst", "EURUSD15.hst", "EURUSD43200.hst"].map(snapshot).to_vec();
    assert_eq!(before, after);
}

#[test]
fn test_missing_day_stops_only_that_symbol() {
    let dir = TempDir::new().unwrap();
    // Wednesday the 3rd is missing
    let source = MemorySource::with_days(&[date(2), date(4)]);
    let sync = Synchronizer::new(source, dir.path()).with_periods(&[Period::M1]);
    let catalog: MemoryCatalog = [eurusd()].into_iter().collect();

    let outcomes = sync.sync_symbols(
        &catalog,
        &["EURUSD".to_string(), "USDJPY".to_string()],
        date(4),
    );
    assert_eq!(outcomes.len(), 2);
    assert!(matches!(
        outcomes[0].result,
        Err(SyncError::MissingSourceDay { date: missing, .. }) if missing == date(3)
    ));
    assert!(matches!(outcomes[1].result, Err(SyncError::UnknownSymbol(_))));

    let bars = m1_bars(dir.path());
    assert_eq!(bars.len(), 1440);
    assert_eq!(bars.last().unwrap().open_time, day_start(date(2)) + 1439 * 60);
}

#[test]
fn test_cancelled_run_closes_files() {
    let dir = TempDir::new().unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let source = MemorySource::with_days(&[date(2)]);
    let sync = Synchronizer::new(source, dir.path())
        .with_periods(&[Period::M1])
        .with_cancel_token(cancel);

    let report = sync.sync_symbol(&eurusd(), date(2)).unwrap();
    assert!(report.cancelled);
    assert_eq!(report.days_synced, 0);
    assert!(HistoryFile::open(dir.path(), "EURUSD", Period::M1).unwrap().is_empty());
}

#[test]
fn test_cancel_between_days_keeps_finished_day() {
    let dir = TempDir::new().unwrap();
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let source = MemorySource::with_days(&[date(2), date(3), date(4)]);
    let sync = Synchronizer::new(source, dir.path())
        .with_periods(&[Period::M1, Period::H1])
        .with_cancel_token(cancel)
        .with_progress(move |progress| {
            if progress.done == 1 {
                trigger.cancel();
            }
        });

    let report = sync.sync_symbol(&eurusd(), date(4)).unwrap();
    assert!(report.cancelled);
    assert_eq!(report.days_synced, 1);
    assert_eq!(report.bars_appended, 1440);

    let last = day_start(date(2)) + 1439 * 60;
    let bars = m1_bars(dir.path());
    assert_eq!(bars.len(), 1440);
    assert_eq!(bars.last().unwrap().open_time, last);
    let info = HistoryFile::open_read_only(dir.path().join("EURUSD1.hst")).unwrap();
    assert_eq!(info.header.last_sync_time, Some(last));
    assert_eq!(HistoryFile::open_read_only(dir.path().join("EURUSD60.hst")).unwrap().bars, 24);
}

#[test]
fn test_holidays_inside_a_run_are_skipped() {
    let dir = TempDir::new().unwrap();
    let ymd = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
    // no source data for Christmas, New Year or the weekends around them
    let trading = [
        ymd(2023, 12, 22),
        ymd(2023, 12, 26),
        ymd(2023, 12, 27),
        ymd(2023, 12, 28),
        ymd(2023, 12, 29),
        ymd(2024, 1, 2),
    ];
    let source = MemorySource::with_days(&trading);
    let symbol = eurusd().with_history(Some(trading[0]), None);
    let sync = Synchronizer::new(source, dir.path()).with_periods(&[Period::M1, Period::D1]);

    let report = sync.sync_symbol(&symbol, ymd(2024, 1, 2)).unwrap();
    assert_eq!(report.days_synced, 6);
    assert_eq!(report.days_skipped, 6);
    assert!(!report.cancelled);

    let bars = m1_bars(dir.path());
    assert_eq!(bars.len(), 6 * 1440);
    for holiday in [ymd(2023, 12, 25), ymd(2024, 1, 1)] {
        let start = day_start(holiday);
        assert!(!bars.iter().any(|bar| (start..start + 86_400).contains(&bar.open_time)));
    }

    let daily = HistoryFile::open(dir.path(), "EURUSD", Period::D1).unwrap().bars().unwrap();
    let opens: Vec<i64> = daily.iter().map(|bar| bar.open_time).collect();
    assert_eq!(opens, trading.map(day_start).to_vec());
}

#[test]
fn test_gmt_time_base_shifts_bars() {
    let dir = TempDir::new().unwrap();
    let source = MemorySource::with_days(&[date(2)]);
    let sync = Synchronizer::new(source, dir.path())
        .with_periods(&[Period::M1, Period::D1])
        .with_time_base(TimeBase::Gmt);
    sync.sync_symbol(&eurusd(), date(2)).unwrap();

    // FXT is GMT+2 in January
    let bars = m1_bars(dir.path());
    assert_eq!(bars[0].open_time, day_start(date(2)) - 2 * 3600);

    let daily = HistoryFile::open(dir.path(), "EURUSD", Period::D1).unwrap().bars().unwrap();
    assert_eq!(daily.len(), 2);

    // resuming maps the GMT checkpoint back onto the FXT day
    let again = sync.sync_symbol(&eurusd(), date(2)).unwrap();
    assert_eq!(again.range.unwrap().start, date(2));
    assert_eq!(again.bars_appended, 0);
}
