//! History file header.
//!
//! Every history file starts with a 148-byte header, identical for
//! formats 400 and 401:
//! - `i32`: format version (bytes 0-3)
//! - `[u8; 64]`: copyright text (bytes 4-67)
//! - `[u8; 12]`: symbol, NUL padded (bytes 68-79)
//! - `i32`: period in minutes (bytes 80-83)
//! - `i32`: digits (bytes 84-87)
//! - `u32`: sync marker (bytes 88-91)
//! - `u32`: last sync time (bytes 92-95)
//! - `[u32; 13]`: reserved (bytes 96-147)
//!
//! The reserved words carry a [`RewriteJournal`] while the last
//! checkpointed bar is being rewritten in place:
//! - `u32`: journal tag (bytes 96-99), zero when no journal is present
//! - `f64`: high, low, close (bytes 100-123)
//! - `u64`: ticks (bytes 124-131)
//! - `u64`: real volume (bytes 132-139)
//! - `i32`: spread (bytes 140-143)

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{ByteOrder, LittleEndian};
use fxhist_types::{Bar, FormatError, HistoryError, Period};

use crate::FormatVersion;

/// Size in bytes of the header.
pub const HEADER_SIZE: usize = 148;

/// Maximum symbol length, leaving room for the terminating NUL.
pub const SYMBOL_LEN: usize = 11;

const COPYRIGHT: &[u8] = b"fxhist history store";

/// Marks the reserved words as holding a rewrite journal ("RWJ1").
const JOURNAL_TAG: u32 = 0x314A_5752;

/// Pre-image of the checkpointed last bar, saved before it is rewritten.
///
/// Only the fields a merge can change are kept; the bar's open time is the
/// header's `last_sync_time` and its open price never changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewriteJournal {
    /// High before the rewrite.
    pub high: f64,
    /// Low before the rewrite.
    pub low: f64,
    /// Close before the rewrite.
    pub close: f64,
    /// Tick count before the rewrite.
    pub ticks: u64,
    /// Spread before the rewrite.
    pub spread: i32,
    /// Real volume before the rewrite.
    pub real_volume: u64,
}

impl RewriteJournal {
    /// Captures the mutable fields of `bar`.
    #[must_use]
    pub const fn capture(bar: &Bar) -> Self {
        Self {
            high: bar.high,
            low: bar.low,
            close: bar.close,
            ticks: bar.ticks,
            spread: bar.spread,
            real_volume: bar.real_volume,
        }
    }

    /// Returns `bar` with the captured fields put back.
    #[must_use]
    pub const fn restore(&self, bar: &Bar) -> Bar {
        Bar {
            high: self.high,
            low: self.low,
            close: self.close,
            ticks: self.ticks,
            spread: self.spread,
            real_volume: self.real_volume,
            ..*bar
        }
    }

    fn parse(bytes: &[u8]) -> Option<Self> {
        if LittleEndian::read_u32(&bytes[96..100]) != JOURNAL_TAG {
            return None;
        }
        Some(Self {
            high: LittleEndian::read_f64(&bytes[100..108]),
            low: LittleEndian::read_f64(&bytes[108..116]),
            close: LittleEndian::read_f64(&bytes[116..124]),
            ticks: LittleEndian::read_u64(&bytes[124..132]),
            real_volume: LittleEndian::read_u64(&bytes[132..140]),
            spread: LittleEndian::read_i32(&bytes[140..144]),
        })
    }

    fn write(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[96..100], JOURNAL_TAG);
        LittleEndian::write_f64(&mut buf[100..108], self.high);
        LittleEndian::write_f64(&mut buf[108..116], self.low);
        LittleEndian::write_f64(&mut buf[116..124], self.close);
        LittleEndian::write_u64(&mut buf[124..132], self.ticks);
        LittleEndian::write_u64(&mut buf[132..140], self.real_volume);
        LittleEndian::write_i32(&mut buf[140..144], self.spread);
    }
}

/// Metadata block at the start of a history file.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryHeader {
    /// Record layout of the bars that follow.
    pub format: FormatVersion,
    /// Symbol name.
    pub symbol: String,
    /// Timeframe of the bars.
    pub period: Period,
    /// Price precision.
    pub digits: u32,
    /// Open time of the newest source bar merged at the last sync pass.
    pub sync_marker: Option<i64>,
    /// Open time of the newest bar physically present.
    pub last_sync_time: Option<i64>,
    /// Pre-image of the bar at `last_sync_time` while it is being rewritten.
    pub rewrite_journal: Option<RewriteJournal>,
}

impl HistoryHeader {
    /// Creates a header for an empty file.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::SymbolTooLong`] if the symbol does not fit the field.
    pub fn new(
        symbol: impl Into<String>,
        period: Period,
        digits: u32,
        format: FormatVersion,
    ) -> Result<Self, FormatError> {
        let symbol = symbol.into();
        if symbol.len() > SYMBOL_LEN {
            return Err(FormatError::SymbolTooLong(symbol));
        }
        Ok(Self {
            format,
            symbol,
            period,
            digits,
            sync_marker: None,
            last_sync_time: None,
            rewrite_journal: None,
        })
    }

    /// Parses a header from the first bytes of a file.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::NotHistoryFile`] if `bytes` is shorter than a header,
    /// [`FormatError::UnsupportedFormat`] for an unknown version and
    /// [`FormatError::InvalidPeriod`] for a non-standard period id.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < HEADER_SIZE {
            return Err(FormatError::NotHistoryFile {
                len: bytes.len() as u64,
            });
        }

        let version = LittleEndian::read_u32(&bytes[0..4]);
        let format = FormatVersion::try_from(version)?;

        let raw_symbol = &bytes[68..80];
        let end = raw_symbol.iter().position(|b| *b == 0).unwrap_or(raw_symbol.len());
        let symbol = String::from_utf8_lossy(&raw_symbol[..end]).into_owned();

        let period_id = LittleEndian::read_u32(&bytes[80..84]);
        let period = Period::from_minutes(period_id).ok_or(FormatError::InvalidPeriod(period_id))?;

        Ok(Self {
            format,
            symbol,
            period,
            digits: LittleEndian::read_u32(&bytes[84..88]),
            sync_marker: non_zero(LittleEndian::read_u32(&bytes[88..92])),
            last_sync_time: non_zero(LittleEndian::read_u32(&bytes[92..96])),
            rewrite_journal: RewriteJournal::parse(bytes),
        })
    }

    /// Serializes the header.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is too long or a sync time does not fit 32 bits.
    pub fn to_bytes(&self) -> Result<[u8; HEADER_SIZE], FormatError> {
        if self.symbol.len() > SYMBOL_LEN {
            return Err(FormatError::SymbolTooLong(self.symbol.clone()));
        }

        let mut buf = [0u8; HEADER_SIZE];
        LittleEndian::write_u32(&mut buf[0..4], self.format.number());
        buf[4..4 + COPYRIGHT.len()].copy_from_slice(COPYRIGHT);
        buf[68..68 + self.symbol.len()].copy_from_slice(self.symbol.as_bytes());
        LittleEndian::write_u32(&mut buf[80..84], self.period.minutes());
        LittleEndian::write_u32(&mut buf[84..88], self.digits);
        LittleEndian::write_u32(&mut buf[88..92], to_u32(self.sync_marker)?);
        LittleEndian::write_u32(&mut buf[92..96], to_u32(self.last_sync_time)?);
        if let Some(journal) = &self.rewrite_journal {
            journal.write(&mut buf);
        }
        Ok(buf)
    }

    /// Reads the header from the start of a file.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] for short, unsupported or corrupt headers and
    /// [`HistoryError::Io`] for read failures.
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self, HistoryError> {
        reader.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::with_capacity(HEADER_SIZE);
        reader.by_ref().take(HEADER_SIZE as u64).read_to_end(&mut buf)?;
        Ok(Self::parse(&buf)?)
    }

    /// Overwrites the header region only; bar data is never touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be serialized or written.
    pub fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<(), HistoryError> {
        let bytes = self.to_bytes()?;
        writer.seek(SeekFrom::Start(0))?;
        writer.write_all(&bytes)?;
        Ok(())
    }
}

const fn non_zero(value: u32) -> Option<i64> {
    if value == 0 { None } else { Some(value as i64) }
}

fn to_u32(time: Option<i64>) -> Result<u32, FormatError> {
    match time {
        None => Ok(0),
        Some(t) => u32::try_from(t).map_err(|_| FormatError::TimeOutOfRange(t)),
    }
}
