//! Sources of daily M1 bars.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate};
use fxhist_format::{parse_raw_bars, raw_bar_count};
use fxhist_types::{Bar, SymbolInfo};

use crate::paths::{PathKind, history_path};
use crate::{Result, SyncError};

/// Provides the M1 bars of one FXT trading day.
pub trait DaySource {
    /// Returns the day's bars in ascending order with FXT open times.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MissingSourceDay`] if the source has nothing for
    /// that day, [`SyncError::InvalidSourceBar`] for malformed bars or bars of
    /// another day, and read or format errors.
    fn load_day(&self, symbol: &SymbolInfo, date: NaiveDate) -> Result<Vec<Bar>>;
}

/// Reads cached `M1.bin` day files below a data root.
#[derive(Debug, Clone)]
pub struct FileDaySource {
    root: PathBuf,
    default_source: Option<String>,
}

impl FileDaySource {
    /// Creates a source reading below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            default_source: None,
        }
    }

    /// Sets the source directory used for symbols that name none.
    #[must_use]
    pub fn with_default_source(mut self, source: impl Into<String>) -> Self {
        self.default_source = Some(source.into());
        self
    }

    /// Returns the data root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DaySource for FileDaySource {
    fn load_day(&self, symbol: &SymbolInfo, date: NaiveDate) -> Result<Vec<Bar>> {
        let path = match &self.default_source {
            Some(source) if symbol.source().is_empty() => history_path(
                &self.root,
                &symbol.clone().with_source(source.as_str()),
                PathKind::RawM1Day(date),
            ),
            _ => history_path(&self.root, symbol, PathKind::RawM1Day(date)),
        };
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SyncError::MissingSourceDay {
                    symbol: symbol.name().to_string(),
                    date,
                    path,
                });
            }
            Err(source) => return Err(SyncError::SourceRead { path, source }),
        };

        let digits = symbol.digits();
        let mut bars = Vec::with_capacity(raw_bar_count(data.len()));
        for raw in parse_raw_bars(&data)? {
            let bar = raw.normalize(digits);
            let day = DateTime::from_timestamp(bar.open_time, 0).map(|dt| dt.date_naive());
            let reason = if day != Some(date) {
                format!("bar is outside {date}")
            } else if !bar.is_valid_feed_bar() {
                format!(
                    "open {} high {} low {} close {} ticks {}",
                    bar.open, bar.high, bar.low, bar.close, bar.ticks
                )
            } else {
                bars.push(bar);
                continue;
            };
            return Err(SyncError::InvalidSourceBar {
                path,
                time: bar.open_time,
                reason,
            });
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxhist_types::SymbolKind;
    use tempfile::TempDir;

    fn eurusd() -> SymbolInfo {
        SymbolInfo::new("EURUSD", "", SymbolKind::Forex, 5, "dukascopy")
    }

    fn record(values: [u32; 6]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_reads_and_normalizes() {
        let dir = TempDir::new().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let path = history_path(dir.path(), &eurusd(), PathKind::RawM1Day(date));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, record([1_704_153_600, 110_000, 110_050, 109_990, 110_020, 14])).unwrap();

        let bars = FileDaySource::new(dir.path()).load_day(&eurusd(), date).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].open_time, 1_704_153_600);
        assert!((bars[0].high - 1.1005).abs() < 1e-9);
        assert_eq!(bars[0].ticks, 14);
    }

    #[test]
    fn test_default_source_for_unnamed_source() {
        let dir = TempDir::new().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let path = history_path(dir.path(), &eurusd(), PathKind::RawM1Day(date));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, record([1_704_153_600, 110_000, 110_050, 109_990, 110_020, 14])).unwrap();

        let unnamed = eurusd().with_source("");
        let source = FileDaySource::new(dir.path());
        assert!(source.load_day(&unnamed, date).is_err());

        let source = source.with_default_source("dukascopy");
        assert_eq!(source.load_day(&unnamed, date).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_day() {
        let dir = TempDir::new().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let result = FileDaySource::new(dir.path()).load_day(&eurusd(), date);
        assert!(matches!(result, Err(SyncError::MissingSourceDay { .. })));
    }

    #[test]
    fn test_rejects_malformed_bar() {
        let dir = TempDir::new().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let path = history_path(dir.path(), &eurusd(), PathKind::RawM1Day(date));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let source = FileDaySource::new(dir.path());

        // low above open
        fs::write(&path, record([1_704_153_600, 110_000, 110_050, 110_010, 110_020, 14])).unwrap();
        let result = source.load_day(&eurusd(), date);
        assert!(matches!(result, Err(SyncError::InvalidSourceBar { time: 1_704_153_600, .. })));

        // no ticks
        fs::write(&path, record([1_704_153_600, 110_000, 110_050, 109_990, 110_020, 0])).unwrap();
        assert!(matches!(
            source.load_day(&eurusd(), date),
            Err(SyncError::InvalidSourceBar { .. })
        ));
    }

    #[test]
    fn test_rejects_bar_of_another_day() {
        let dir = TempDir::new().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let path = history_path(dir.path(), &eurusd(), PathKind::RawM1Day(date));
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        // 2024-01-02 23:59 followed by 2024-01-03 00:00
        let mut data = record([1_704_239_940, 110_000, 110_050, 109_990, 110_020, 14]);
        data.extend(record([1_704_240_000, 110_020, 110_060, 110_000, 110_030, 9]));
        fs::write(&path, data).unwrap();

        let result = FileDaySource::new(dir.path()).load_day(&eurusd(), date);
        assert!(matches!(result, Err(SyncError::InvalidSourceBar { time: 1_704_240_000, .. })));
    }
}
