//! The history files of one symbol across periods.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fxhist_format::FormatVersion;
use fxhist_types::{Bar, HistoryError, Period, Result};
use tracing::{debug, warn};

use crate::file::{HistoryFile, SyncOutcome, check_feed};

/// One symbol's history files, one per period, fed from a single M1 stream.
#[derive(Debug)]
pub struct HistorySet {
    symbol: String,
    dir: PathBuf,
    files: BTreeMap<Period, HistoryFile>,
}

impl HistorySet {
    /// Creates a new empty file for every period.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::AlreadyExists`] if any of the files exists; no
    /// file is created in that case.
    pub fn create(
        dir: impl AsRef<Path>,
        symbol: &str,
        digits: u32,
        format: FormatVersion,
        periods: &[Period],
    ) -> Result<Self> {
        let dir = dir.as_ref();
        if let Some(period) = periods
            .iter()
            .find(|p| dir.join(HistoryFile::file_name(symbol, **p)).exists())
        {
            return Err(HistoryError::AlreadyExists {
                path: dir.join(HistoryFile::file_name(symbol, *period)),
            });
        }

        let mut files = BTreeMap::new();
        for period in periods {
            files.insert(*period, HistoryFile::create(dir, symbol, *period, digits, format)?);
        }
        Ok(Self::from_files(dir, symbol, files))
    }

    /// Opens the existing file of every period.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NotFound`] if any file is missing.
    pub fn open(dir: impl AsRef<Path>, symbol: &str, periods: &[Period]) -> Result<Self> {
        let dir = dir.as_ref();
        let mut files = BTreeMap::new();
        for period in periods {
            files.insert(*period, HistoryFile::open(dir, symbol, *period)?);
        }
        Ok(Self::from_files(dir, symbol, files))
    }

    /// Opens every period's file, creating those that do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns format or I/O errors from opening or creating a file.
    pub fn open_or_create(
        dir: impl AsRef<Path>,
        symbol: &str,
        digits: u32,
        format: FormatVersion,
        periods: &[Period],
    ) -> Result<Self> {
        let dir = dir.as_ref();
        let mut files = BTreeMap::new();
        for period in periods {
            let file = match HistoryFile::open(dir, symbol, *period) {
                Err(error) if error.is_not_found() => {
                    HistoryFile::create(dir, symbol, *period, digits, format)?
                }
                other => other?,
            };
            files.insert(*period, file);
        }

        let set = Self::from_files(dir, symbol, files);
        if let Some(lagging) = set.lagging_period() {
            warn!(
                symbol,
                %lagging,
                "history files are at different sync points; newer files skip the overlap"
            );
        }
        Ok(set)
    }

    fn from_files(dir: &Path, symbol: &str, files: BTreeMap<Period, HistoryFile>) -> Self {
        Self {
            symbol: symbol.to_string(),
            dir: dir.to_path_buf(),
            files,
        }
    }

    /// Returns the symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the directory holding the files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Iterates over the files by ascending period.
    pub fn files(&self) -> impl Iterator<Item = &HistoryFile> {
        self.files.values()
    }

    /// Returns the file of one period.
    #[must_use]
    pub fn file(&self, period: Period) -> Option<&HistoryFile> {
        self.files.get(&period)
    }

    /// Returns the file of one period for direct access.
    pub fn file_mut(&mut self, period: Period) -> Option<&mut HistoryFile> {
        self.files.get_mut(&period)
    }

    /// Oldest source watermark across the files.
    ///
    /// A new pass resumes from here; files that are further along drop the
    /// overlap as duplicates.
    #[must_use]
    pub fn last_sync_time(&self) -> Option<i64> {
        self.files
            .values()
            .map(HistoryFile::source_watermark)
            .min()
            .flatten()
    }

    fn lagging_period(&self) -> Option<Period> {
        let marks: Vec<_> = self.files.values().map(HistoryFile::source_watermark).collect();
        let newest = marks.iter().max().copied().flatten();
        self.files
            .iter()
            .find(|(_, file)| file.source_watermark() != newest)
            .map(|(period, _)| *period)
    }

    /// Feeds one batch of ascending M1 bars to every file.
    ///
    /// An M1 file without history takes the bars verbatim; every other file
    /// merges them through [`HistoryFile::synchronize`].
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::SyncConflict`] before touching any file if the
    /// batch is unsorted or holds a malformed bar. Otherwise stops at the first
    /// failing file and returns its error; files processed before it keep
    /// their progress.
    pub fn synchronize(&mut self, m1_bars: &[Bar]) -> Result<BTreeMap<Period, SyncOutcome>> {
        check_feed(m1_bars)?;
        let mut outcomes = BTreeMap::new();
        for (period, file) in &mut self.files {
            let outcome = if *period == Period::M1 && file.last_bar().is_none() {
                file.append_bars(m1_bars)?;
                file.flush()?;
                SyncOutcome {
                    appended: m1_bars.len(),
                    ..SyncOutcome::default()
                }
            } else {
                file.synchronize(m1_bars)?
            };
            outcomes.insert(*period, outcome);
        }
        debug!(symbol = %self.symbol, bars = m1_bars.len(), "synchronized history set");
        Ok(outcomes)
    }

    /// Flushes every file.
    ///
    /// # Errors
    ///
    /// Returns the first flush error.
    pub fn flush(&mut self) -> Result<()> {
        for file in self.files.values_mut() {
            file.flush()?;
        }
        Ok(())
    }

    /// Closes every file, even when some fail. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the first close error.
    pub fn close(&mut self) -> Result<()> {
        let mut first_error = None;
        for file in self.files.values_mut() {
            if let Err(error) = file.close() {
                warn!(path = %file.path().display(), %error, "failed to close history file");
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DAY: i64 = 1_704_153_600;

    fn m1_run(count: i64) -> Vec<Bar> {
        (0..count)
            .map(|i| Bar::new(DAY + i * 60, 1.1, 1.2, 1.0, 1.15, 3))
            .collect()
    }

    #[test]
    fn test_create_all_or_nothing() {
        let dir = TempDir::new().unwrap();
        HistoryFile::create(dir.path(), "GBPUSD", Period::H1, 5, FormatVersion::V400)
            .unwrap()
            .close()
            .unwrap();

        let result = HistorySet::create(
            dir.path(),
            "GBPUSD",
            5,
            FormatVersion::V400,
            &[Period::M1, Period::H1],
        );
        assert!(matches!(result, Err(HistoryError::AlreadyExists { .. })));
        assert!(!dir.path().join("GBPUSD1.hst").exists());
    }

    #[test]
    fn test_synchronize_all_periods() {
        let dir = TempDir::new().unwrap();
        let mut set =
            HistorySet::create(dir.path(), "GBPUSD", 5, FormatVersion::V401, Period::all()).unwrap();
        let outcomes = set.synchronize(&m1_run(1440)).unwrap();

        assert_eq!(outcomes[&Period::M1].appended, 1440);
        assert_eq!(outcomes[&Period::H1].appended, 24);
        assert_eq!(outcomes[&Period::D1].appended, 1);
        assert_eq!(set.last_sync_time(), Some(DAY + 1439 * 60));
        assert_eq!(set.file(Period::M5).unwrap().len(), 288);
        set.close().unwrap();
        set.close().unwrap();
    }

    #[test]
    fn test_open_or_create_fills_missing_periods() {
        let dir = TempDir::new().unwrap();
        let mut set = HistorySet::create(dir.path(), "GBPUSD", 5, FormatVersion::V400, &[Period::M1])
            .unwrap();
        set.synchronize(&m1_run(10)).unwrap();
        set.close().unwrap();

        let set = HistorySet::open_or_create(
            dir.path(),
            "GBPUSD",
            5,
            FormatVersion::V400,
            &[Period::M1, Period::H1],
        )
        .unwrap();
        assert_eq!(set.file(Period::M1).unwrap().len(), 10);
        assert!(set.file(Period::H1).unwrap().is_empty());
        assert_eq!(set.last_sync_time(), None);
    }

    #[test]
    fn test_open_requires_every_file() {
        let dir = TempDir::new().unwrap();
        HistorySet::create(dir.path(), "GBPUSD", 5, FormatVersion::V400, &[Period::M1])
            .unwrap()
            .close()
            .unwrap();

        let result = HistorySet::open(dir.path(), "GBPUSD", &[Period::M1, Period::D1]);
        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn test_malformed_bar_rejected_before_any_file() {
        let dir = TempDir::new().unwrap();
        let mut set =
            HistorySet::create(dir.path(), "GBPUSD", 5, FormatVersion::V400, &[Period::M1, Period::H1])
                .unwrap();

        let mut high_below_close = m1_run(10);
        high_below_close[4].high = 1.12;
        let result = set.synchronize(&high_below_close);
        assert!(matches!(result, Err(HistoryError::SyncConflict { time, .. }) if time == DAY + 240));

        let mut no_ticks = m1_run(10);
        no_ticks[9].ticks = 0;
        assert!(set.synchronize(&no_ticks).is_err());

        assert!(set.files().all(HistoryFile::is_empty));
        assert_eq!(set.last_sync_time(), None);
    }
}
