//! One open history file.
//!
//! The header doubles as the crash-recovery checkpoint. Bars are written
//! first and the header last, so `last_sync_time` never names a bar that
//! is not on disk. Bars past the checkpoint found on open are the remains
//! of an interrupted pass and are rolled back.
//!
//! Extending the checkpointed last bar in place overwrites data the
//! checkpoint vouches for, so its pre-image is journaled in the header's
//! reserved words first and put back on open if the pass never finished.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fxhist_format::{BarCodec, FormatVersion, HEADER_SIZE, HistoryHeader, RewriteJournal};
use fxhist_types::{Bar, FormatError, HistoryError, Period, Result};
use tracing::{debug, info, warn};

use crate::aggregate::BarAggregator;
use crate::search::{self, SearchResult};

/// Pending bars written to disk (without a checkpoint) once this many accumulate.
const DEFAULT_FLUSH_THRESHOLD: usize = 8192;

/// Records read per step when scanning back from the end of a file.
const SCAN_CHUNK: u64 = 4096;

/// Lifecycle state of a [`HistoryFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// Open with nothing pending.
    Idle,
    /// Open with bars or a checkpoint not yet flushed.
    Writing,
    /// Closed; every operation but `close` fails.
    Closed,
}

/// What one synchronize pass did to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOutcome {
    /// Bars added after the previous last bar.
    pub appended: usize,
    /// Times the last bar was extended in place.
    pub merged: usize,
    /// Incoming bars at or before the sync marker that were dropped.
    pub duplicates: usize,
}

/// Summary of a history file read without opening it for writing.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryInfo {
    /// Location of the file.
    pub path: PathBuf,
    /// Parsed header.
    pub header: HistoryHeader,
    /// Number of complete bar records.
    pub bars: u64,
    /// Oldest bar.
    pub first_bar: Option<Bar>,
    /// Newest bar.
    pub last_bar: Option<Bar>,
}

/// An open per-symbol, per-period history file.
///
/// Appended bars are buffered and written by [`flush`](Self::flush), which
/// also advances the header checkpoint. Dropping a file with unflushed
/// bars closes it; errors from that implicit close are only logged.
#[derive(Debug)]
pub struct HistoryFile {
    path: PathBuf,
    file: Option<File>,
    header: HistoryHeader,
    codec: BarCodec,
    persisted: u64,
    last_persisted: Option<Bar>,
    rewrite_last: Option<Bar>,
    pending: Vec<Bar>,
    watermark: Option<i64>,
    header_dirty: bool,
    flush_threshold: usize,
}

impl HistoryFile {
    /// File name used for a symbol and period, e.g. `EURUSD60.hst`.
    #[must_use]
    pub fn file_name(symbol: &str, period: Period) -> String {
        format!("{symbol}{}.hst", period.minutes())
    }

    /// Creates an empty history file in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::AlreadyExists`] if the file exists, and format or
    /// I/O errors otherwise.
    pub fn create(
        dir: impl AsRef<Path>,
        symbol: &str,
        period: Period,
        digits: u32,
        format: FormatVersion,
    ) -> Result<Self> {
        let header = HistoryHeader::new(symbol, period, digits, format)?;
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let path = dir.join(Self::file_name(symbol, period));
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    HistoryError::AlreadyExists { path: path.clone() }
                } else {
                    e.into()
                }
            })?;
        header.write(&mut file)?;
        file.sync_data()?;

        debug!(path = %path.display(), %period, %format, "created history file");
        Ok(Self::from_parts(path, file, header, 0, None))
    }

    /// Opens the file of `symbol` and `period` in `dir` for writing.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NotFound`] if the file does not exist,
    /// [`FormatError::HeaderMismatch`] if its header names another symbol or
    /// period, and format or I/O errors otherwise.
    pub fn open(dir: impl AsRef<Path>, symbol: &str, period: Period) -> Result<Self> {
        let path = dir.as_ref().join(Self::file_name(symbol, period));
        Self::open_checked(&path, Some((symbol, period)))
    }

    /// Opens a history file by path for writing.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NotFound`] if the file does not exist, and format
    /// or I/O errors otherwise.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_checked(path.as_ref(), None)
    }

    /// Reads a file's header and bounds without opening it for writing.
    ///
    /// No recovery is performed; bars past the checkpoint are counted.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::NotFound`] if the file does not exist, and format
    /// or I/O errors otherwise.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<HistoryInfo> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| not_found(e, path))?;
        let header = HistoryHeader::read(&mut file)?;
        let codec = BarCodec::for_version(header.format);
        let bars = record_count(file.metadata()?.len(), codec.record_size())?;

        let (first_bar, last_bar) = if bars == 0 {
            (None, None)
        } else {
            (
                read_records(&mut file, codec, 0, 1)?.pop(),
                read_records(&mut file, codec, bars - 1, 1)?.pop(),
            )
        };

        Ok(HistoryInfo {
            path: path.to_path_buf(),
            header,
            bars,
            first_bar,
            last_bar,
        })
    }

    fn open_checked(path: &Path, expected: Option<(&str, Period)>) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| not_found(e, path))?;
        let header = HistoryHeader::read(&mut file)?;

        if let Some((symbol, period)) = expected
            && (!header.symbol.eq_ignore_ascii_case(symbol) || header.period != period)
        {
            return Err(FormatError::HeaderMismatch {
                expected: format!("{symbol} {period}"),
                found: format!("{} {}", header.symbol, header.period),
            }
            .into());
        }

        let codec = BarCodec::for_version(header.format);
        let persisted = record_count(file.metadata()?.len(), codec.record_size())?;
        let last_persisted = if persisted == 0 {
            None
        } else {
            read_records(&mut file, codec, persisted - 1, 1)?.pop()
        };

        let mut store = Self::from_parts(path.to_path_buf(), file, header, persisted, last_persisted);
        store.recover()?;
        Ok(store)
    }

    fn from_parts(
        path: PathBuf,
        file: File,
        header: HistoryHeader,
        persisted: u64,
        last_persisted: Option<Bar>,
    ) -> Self {
        Self {
            path,
            codec: BarCodec::for_version(header.format),
            file: Some(file),
            watermark: header.sync_marker.or(header.last_sync_time),
            header,
            persisted,
            last_persisted,
            rewrite_last: None,
            pending: Vec::new(),
            header_dirty: false,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }

    /// Sets how many pending bars trigger an early write of bar data.
    #[must_use]
    pub fn with_flush_threshold(mut self, bars: usize) -> Self {
        self.flush_threshold = bars.max(1);
        self
    }

    /// Returns the file's location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the header as of the last flush.
    #[must_use]
    pub const fn header(&self) -> &HistoryHeader {
        &self.header
    }

    /// Returns the symbol stored in the header.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.header.symbol
    }

    /// Returns the file's period.
    #[must_use]
    pub const fn period(&self) -> Period {
        self.header.period
    }

    /// Returns the record layout.
    #[must_use]
    pub const fn format(&self) -> FormatVersion {
        self.header.format
    }

    /// Returns the price precision.
    #[must_use]
    pub const fn digits(&self) -> u32 {
        self.header.digits
    }

    /// Number of bars including pending ones.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.persisted + self.pending.len() as u64
    }

    /// Returns true if the file holds no bars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> StoreState {
        if self.file.is_none() {
            StoreState::Closed
        } else if self.header_dirty
            || self.header.rewrite_journal.is_some()
            || self.rewrite_last.is_some()
            || !self.pending.is_empty()
        {
            StoreState::Writing
        } else {
            StoreState::Idle
        }
    }

    /// Open time of the newest bar covered by the last checkpoint.
    #[must_use]
    pub const fn last_sync_time(&self) -> Option<i64> {
        self.header.last_sync_time
    }

    /// Open time of the newest source bar merged into this file, flushed or not.
    #[must_use]
    pub const fn source_watermark(&self) -> Option<i64> {
        self.watermark
    }

    /// Returns the newest bar, flushed or not.
    #[must_use]
    pub fn last_bar(&self) -> Option<Bar> {
        self.pending
            .last()
            .copied()
            .or(self.rewrite_last)
            .or(self.last_persisted)
    }

    /// Buffers bars for appending.
    ///
    /// Bars must be strictly ascending and newer than the last bar. The batch
    /// is rejected as a whole if any bar is out of order.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::SyncConflict`] for out-of-order bars,
    /// [`HistoryError::Closed`] after close, and I/O errors from an early write.
    pub fn append_bars(&mut self, bars: &[Bar]) -> Result<()> {
        self.ensure_open()?;

        let mut previous = self.last_bar().map(|b| b.open_time);
        for bar in bars {
            if previous.is_some_and(|t| bar.open_time <= t) {
                return Err(HistoryError::conflict(
                    bar.open_time,
                    "bars must be appended in strictly ascending order",
                ));
            }
            previous = Some(bar.open_time);
        }

        let Some(newest) = bars.last() else {
            return Ok(());
        };
        self.pending.extend_from_slice(bars);
        self.watermark = Some(newest.open_time);
        self.header_dirty = true;
        self.write_if_full()
    }

    /// Merges ascending M1 bars into this file and flushes.
    ///
    /// Bars at or before the sync marker are overlap from an earlier pass. On
    /// M1 files they must match the persisted bars exactly and are dropped; on
    /// other periods they are dropped unchecked. Newer bars are folded into the
    /// file's period, extending the last bar in place while they fall into its
    /// bucket and appending new bars after that.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::SyncConflict`] for unsorted or malformed input
    /// and for overlap that disagrees with persisted data, and calendar, format
    /// or I/O errors.
    pub fn synchronize(&mut self, bars: &[Bar]) -> Result<SyncOutcome> {
        self.ensure_open()?;
        check_feed(bars)?;

        let watermark = self.watermark;
        let split = bars.partition_point(|b| watermark.is_some_and(|w| b.open_time <= w));
        let (overlap, fresh) = bars.split_at(split);
        let mut outcome = SyncOutcome {
            duplicates: overlap.len(),
            ..SyncOutcome::default()
        };

        if !overlap.is_empty() && self.period() == Period::M1 {
            self.verify_overlap(overlap)?;
        }
        let Some(newest) = fresh.last() else {
            return Ok(outcome);
        };

        let period = self.period();
        let mut aggregator = match self.last_bar() {
            Some(last) if period != Period::M1 => BarAggregator::resume(period, last),
            _ => BarAggregator::new(period),
        };
        for bar in fresh {
            if let Some(done) = aggregator.process(bar)? {
                self.stage(done, &mut outcome)?;
            }
        }
        if let Some(partial) = aggregator.finish() {
            self.stage(partial, &mut outcome)?;
        }

        self.watermark = Some(newest.open_time);
        self.header_dirty = true;
        self.flush()?;

        debug!(
            path = %self.path.display(),
            appended = outcome.appended,
            merged = outcome.merged,
            duplicates = outcome.duplicates,
            "synchronized history file"
        );
        Ok(outcome)
    }

    /// Writes pending bars, then the header checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Closed`] after close, and format or I/O errors.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.write_pending()?;
        if !self.header_dirty && self.header.rewrite_journal.is_none() {
            return Ok(());
        }

        self.header.last_sync_time = self.last_persisted.map(|b| b.open_time);
        self.header.sync_marker = self.watermark;
        self.header.rewrite_journal = None;

        let file = self.file.as_mut().ok_or(HistoryError::Closed)?;
        file.sync_data()?;
        self.header.write(file)?;
        file.sync_data()?;
        self.header_dirty = false;
        Ok(())
    }

    /// Flushes and releases the file. Closing twice is a no-op.
    ///
    /// The handle is released even if the final flush fails.
    ///
    /// # Errors
    ///
    /// Returns the error of the final flush.
    pub fn close(&mut self) -> Result<()> {
        if self.file.is_none() {
            return Ok(());
        }
        let result = self.flush();
        self.file = None;
        result
    }

    /// Reads every bar, including pending ones.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Closed`] after close, and format or I/O errors.
    pub fn bars(&mut self) -> Result<Vec<Bar>> {
        self.read_from(0)
    }

    /// Reads the bars with open times in `[from, to]`.
    ///
    /// Only the bounds are searched on disk; the records in between are read
    /// in one go.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Closed`] after close, and format or I/O errors.
    pub fn read_range(&mut self, from: i64, to: i64) -> Result<Vec<Bar>> {
        let (Some(first), Some(last)) = (self.find(from)?.ceiling, self.find(to)?.floor) else {
            return Ok(Vec::new());
        };
        if first > last {
            return Ok(Vec::new());
        }
        self.read_span(first as u64, (last - first + 1) as u64)
    }

    /// Locates `time` among the bars, reading only open times.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Closed`] after close, and format or I/O errors.
    pub fn find(&mut self, time: i64) -> Result<SearchResult> {
        self.ensure_open()?;
        let count = self.len() as usize;
        search::try_search(count, time, |index| self.open_time_at(index as u64))
    }

    /// Returns the bar whose `[open_time, close_time)` contains `time`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Gap`] if no bar covers `time`, and read errors.
    pub fn bar_covering(&mut self, time: i64) -> Result<Bar> {
        self.ensure_open()?;
        let count = self.len() as usize;
        let period = self.period();
        let index = search::try_find_bar_covering(count, period, time, |index| {
            self.open_time_at(index as u64)
        })?
        .ok_or(HistoryError::Gap { time })?;
        self.read_span(index as u64, 1)?
            .pop()
            .ok_or(HistoryError::Gap { time })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.file.is_none() {
            return Err(HistoryError::Closed);
        }
        Ok(())
    }

    fn stage(&mut self, bar: Bar, outcome: &mut SyncOutcome) -> Result<()> {
        match self.last_bar() {
            Some(last) if bar.open_time == last.open_time && self.period() != Period::M1 => {
                if let Some(newest) = self.pending.last_mut() {
                    *newest = bar;
                } else {
                    self.rewrite_last = Some(bar);
                }
                outcome.merged += 1;
                Ok(())
            }
            Some(last) if bar.open_time <= last.open_time => Err(HistoryError::conflict(
                bar.open_time,
                format!("bar would precede the last bar at {}", last.open_time),
            )),
            _ => {
                self.pending.push(bar);
                outcome.appended += 1;
                self.write_if_full()
            }
        }
    }

    fn verify_overlap(&mut self, overlap: &[Bar]) -> Result<()> {
        let existing = self.bars_since(overlap[0].open_time)?;
        for bar in overlap {
            match search::find_exact(existing.as_slice(), bar.open_time) {
                Some(index) if existing[index] == self.codec.retained(bar) => {}
                Some(_) => {
                    return Err(HistoryError::conflict(
                        bar.open_time,
                        "bar differs from persisted data",
                    ));
                }
                None => {
                    return Err(HistoryError::conflict(
                        bar.open_time,
                        "bar is missing from persisted data",
                    ));
                }
            }
        }
        Ok(())
    }

    fn bars_since(&mut self, time: i64) -> Result<Vec<Bar>> {
        match self.find(time)?.ceiling {
            Some(start) => self.read_from(start as u64),
            None => Ok(Vec::new()),
        }
    }

    fn read_from(&mut self, start: u64) -> Result<Vec<Bar>> {
        let count = self.len().saturating_sub(start);
        self.read_span(start, count)
    }

    /// Reads `count` bars from index `start`, overlaying unwritten changes.
    fn read_span(&mut self, start: u64, count: u64) -> Result<Vec<Bar>> {
        let end = start + count;
        let mut bars = self.read_persisted(start, end.min(self.persisted).saturating_sub(start))?;
        if let Some(bar) = self.rewrite_last
            && start < self.persisted
            && end >= self.persisted
            && let Some(last) = bars.last_mut()
        {
            *last = bar;
        }

        let pending_from = start.saturating_sub(self.persisted) as usize;
        let pending_to = end.saturating_sub(self.persisted) as usize;
        if let Some(pending) = self.pending.get(pending_from..pending_to) {
            bars.extend_from_slice(pending);
        }
        Ok(bars)
    }

    /// Open time of the bar at `index`, reading only its time field.
    fn open_time_at(&mut self, index: u64) -> Result<i64> {
        if index >= self.persisted {
            let offset = (index - self.persisted) as usize;
            return self
                .pending
                .get(offset)
                .map(|bar| bar.open_time)
                .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }

        // an in-place rewrite keeps the open time of the record it replaces
        let codec = self.codec;
        let mut buf = [0u8; 8];
        let field = &mut buf[..codec.time_size()];
        let file = self.file.as_mut().ok_or(HistoryError::Closed)?;
        file.seek(SeekFrom::Start(record_offset(index, codec.record_size())))?;
        file.read_exact(field)?;
        Ok(codec.decode_time(field)?)
    }

    fn read_persisted(&mut self, start: u64, count: u64) -> Result<Vec<Bar>> {
        let codec = self.codec;
        let file = self.file.as_mut().ok_or(HistoryError::Closed)?;
        read_records(file, codec, start, count)
    }

    fn write_if_full(&mut self) -> Result<()> {
        if self.pending.len() >= self.flush_threshold {
            self.write_pending()?;
        }
        Ok(())
    }

    fn write_pending(&mut self) -> Result<()> {
        if self.rewrite_last.is_none() && self.pending.is_empty() {
            return Ok(());
        }

        let codec = self.codec;
        let size = codec.record_size();
        let mut buf = Vec::with_capacity(size * (self.pending.len() + 1));
        let start = match self.rewrite_last {
            Some(bar) => {
                self.journal_rewrite()?;
                codec.encode_into(&bar, &mut buf)?;
                self.persisted.saturating_sub(1)
            }
            None => self.persisted,
        };
        for bar in &self.pending {
            codec.encode_into(bar, &mut buf)?;
        }

        let file = self.file.as_mut().ok_or(HistoryError::Closed)?;
        file.seek(SeekFrom::Start(record_offset(start, size)))?;
        file.write_all(&buf)?;

        self.persisted = start + (buf.len() / size) as u64;
        self.last_persisted = self.last_bar();
        self.rewrite_last = None;
        self.pending.clear();
        Ok(())
    }

    /// Saves the checkpointed last bar in the header before it is overwritten.
    fn journal_rewrite(&mut self) -> Result<()> {
        let Some(before) = self.last_persisted else {
            return Ok(());
        };
        if self.header.rewrite_journal.is_some()
            || self.header.last_sync_time != Some(before.open_time)
        {
            return Ok(());
        }

        self.header.rewrite_journal = Some(RewriteJournal::capture(&before));
        let file = self.file.as_mut().ok_or(HistoryError::Closed)?;
        self.header.write(file)?;
        file.sync_data()?;
        Ok(())
    }

    fn recover(&mut self) -> Result<()> {
        self.check_checkpoint()?;
        self.undo_rewrite()
    }

    fn check_checkpoint(&mut self) -> Result<()> {
        let newest = self.last_persisted.map(|b| b.open_time);
        match (self.header.last_sync_time, newest) {
            (None, None) => Ok(()),
            (None, Some(newest)) => {
                info!(
                    path = %self.path.display(),
                    bars = self.persisted,
                    "adopting bars of a file without a sync checkpoint"
                );
                self.watermark = self.header.sync_marker.or(Some(newest));
                self.header_dirty = true;
                Ok(())
            }
            (Some(checkpoint), Some(newest)) if newest > checkpoint => self.roll_back(checkpoint),
            (Some(checkpoint), Some(newest)) if newest == checkpoint => Ok(()),
            (Some(checkpoint), newest) => Err(FormatError::HeaderMismatch {
                expected: format!("last bar at {checkpoint}"),
                found: newest.map_or_else(|| "no bars".to_string(), |t| format!("last bar at {t}")),
            }
            .into()),
        }
    }

    /// Puts back the journaled pre-image of the checkpointed last bar.
    fn undo_rewrite(&mut self) -> Result<()> {
        let Some(journal) = self.header.rewrite_journal.take() else {
            return Ok(());
        };

        let size = self.codec.record_size();
        let restored = match self.last_persisted {
            Some(last) if self.header.last_sync_time == Some(last.open_time) => {
                let restored = journal.restore(&last);
                warn!(
                    path = %self.path.display(),
                    time = last.open_time,
                    "restoring bar rewritten after the last sync checkpoint"
                );
                Some((restored, self.codec.encode(&restored)?))
            }
            _ => None,
        };

        let file = self.file.as_mut().ok_or(HistoryError::Closed)?;
        if let Some((_, record)) = &restored {
            file.seek(SeekFrom::Start(record_offset(self.persisted - 1, size)))?;
            file.write_all(record)?;
            file.sync_data()?;
        }
        self.header.write(file)?;
        file.sync_data()?;

        if let Some((bar, _)) = restored {
            self.last_persisted = Some(bar);
        }
        Ok(())
    }

    fn roll_back(&mut self, checkpoint: i64) -> Result<()> {
        let mut keep = self.persisted;
        let mut kept_last = None;
        while keep > 0 {
            let start = keep.saturating_sub(SCAN_CHUNK);
            let chunk = self.read_persisted(start, keep - start)?;
            if let Some(index) = chunk.iter().rposition(|b| b.open_time <= checkpoint) {
                keep = start + index as u64 + 1;
                kept_last = Some(chunk[index]);
                break;
            }
            keep = start;
        }

        if kept_last.map(|b| b.open_time) != Some(checkpoint) {
            return Err(FormatError::HeaderMismatch {
                expected: format!("bar at {checkpoint}"),
                found: "no bar at the sync checkpoint".to_string(),
            }
            .into());
        }

        warn!(
            path = %self.path.display(),
            dropped = self.persisted - keep,
            checkpoint,
            "rolling back bars written after the last sync checkpoint"
        );
        let size = self.codec.record_size();
        let file = self.file.as_mut().ok_or(HistoryError::Closed)?;
        file.set_len(record_offset(keep, size))?;
        file.sync_data()?;
        self.persisted = keep;
        self.last_persisted = kept_last;
        Ok(())
    }
}

impl Drop for HistoryFile {
    fn drop(&mut self) {
        if self.state() == StoreState::Writing
            && let Err(error) = self.close()
        {
            warn!(path = %self.path.display(), %error, "failed to flush history file on drop");
        }
    }
}

/// Rejects source batches that are unsorted or hold malformed bars.
pub(crate) fn check_feed(bars: &[Bar]) -> Result<()> {
    if let Some(pair) = bars.windows(2).find(|pair| pair[1].open_time <= pair[0].open_time) {
        return Err(HistoryError::conflict(
            pair[1].open_time,
            "source bars are not strictly ascending",
        ));
    }
    if let Some(bar) = bars.iter().find(|bar| !bar.is_valid_feed_bar()) {
        return Err(HistoryError::conflict(
            bar.open_time,
            format!(
                "malformed source bar: open {} high {} low {} close {} ticks {}",
                bar.open, bar.high, bar.low, bar.close, bar.ticks
            ),
        ));
    }
    Ok(())
}

const fn record_offset(index: u64, record_size: usize) -> u64 {
    HEADER_SIZE as u64 + index * record_size as u64
}

fn record_count(len: u64, record_size: usize) -> std::result::Result<u64, FormatError> {
    let body = len.saturating_sub(HEADER_SIZE as u64);
    let size = record_size as u64;
    if body % size != 0 {
        return Err(FormatError::TrailingBytes {
            len,
            extra: body % size,
        });
    }
    Ok(body / size)
}

fn read_records(file: &mut File, codec: BarCodec, start: u64, count: u64) -> Result<Vec<Bar>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let size = codec.record_size();
    let mut buf = vec![0u8; count as usize * size];
    file.seek(SeekFrom::Start(record_offset(start, size)))?;
    file.read_exact(&mut buf)?;
    Ok(codec.decode_all(&buf)?.collect())
}

fn not_found(error: io::Error, path: &Path) -> HistoryError {
    if error.kind() == io::ErrorKind::NotFound {
        HistoryError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        error.into()
    }
}
