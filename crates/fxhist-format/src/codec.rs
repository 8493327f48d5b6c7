//! Bar record encoding for history formats 400 and 401.
//!
//! Format 400 stores bars as 44 bytes in little-endian order:
//! - `i32`: open time (bytes 0-3)
//! - `f64`: open, low, high, close (bytes 4-35)
//! - `f64`: tick volume (bytes 36-43)
//!
//! Format 401 stores bars as 60 bytes in little-endian order:
//! - `i64`: open time (bytes 0-7)
//! - `f64`: open, high, low, close (bytes 8-39)
//! - `u64`: tick volume (bytes 40-47)
//! - `i32`: spread (bytes 48-51)
//! - `u64`: real volume (bytes 52-59)

use byteorder::{ByteOrder, LittleEndian};
use fxhist_types::{Bar, FormatError};
use serde::{Deserialize, Serialize};

/// Physical record layout of a history file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FormatVersion {
    /// Compact layout with tick volume only.
    #[default]
    V400,
    /// Extended layout with spread and real volume.
    V401,
}

impl FormatVersion {
    /// Returns the version number written into headers.
    #[must_use]
    pub const fn number(self) -> u32 {
        match self {
            Self::V400 => 400,
            Self::V401 => 401,
        }
    }

    /// Returns the size in bytes of one bar record.
    #[must_use]
    pub const fn record_size(self) -> usize {
        match self {
            Self::V400 => 44,
            Self::V401 => 60,
        }
    }
}

impl TryFrom<u32> for FormatVersion {
    type Error = FormatError;

    fn try_from(number: u32) -> Result<Self, Self::Error> {
        match number {
            400 => Ok(Self::V400),
            401 => Ok(Self::V401),
            other => Err(FormatError::UnsupportedFormat(other)),
        }
    }
}

impl From<FormatVersion> for u32 {
    fn from(version: FormatVersion) -> Self {
        version.number()
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Stateless codec for one record layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarCodec {
    version: FormatVersion,
}

impl BarCodec {
    /// Creates a codec for a format version number.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::UnsupportedFormat`] for anything but 400 and 401.
    pub fn new(version: u32) -> Result<Self, FormatError> {
        Ok(Self::for_version(FormatVersion::try_from(version)?))
    }

    /// Creates a codec for a validated format version.
    #[must_use]
    pub const fn for_version(version: FormatVersion) -> Self {
        Self { version }
    }

    /// Returns the format version.
    #[must_use]
    pub const fn version(&self) -> FormatVersion {
        self.version
    }

    /// Returns the size in bytes of one record.
    #[must_use]
    pub const fn record_size(&self) -> usize {
        self.version.record_size()
    }

    /// Appends the encoded record to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::TimeOutOfRange`] if format 400 cannot hold the bar time.
    pub fn encode_into(&self, bar: &Bar, out: &mut Vec<u8>) -> Result<(), FormatError> {
        let compact_time = match self.version {
            FormatVersion::V400 => i32::try_from(bar.open_time)
                .map_err(|_| FormatError::TimeOutOfRange(bar.open_time))?,
            FormatVersion::V401 => 0,
        };

        let start = out.len();
        out.resize(start + self.record_size(), 0);
        let buf = &mut out[start..];

        match self.version {
            FormatVersion::V400 => {
                LittleEndian::write_i32(&mut buf[0..4], compact_time);
                LittleEndian::write_f64(&mut buf[4..12], bar.open);
                LittleEndian::write_f64(&mut buf[12..20], bar.low);
                LittleEndian::write_f64(&mut buf[20..28], bar.high);
                LittleEndian::write_f64(&mut buf[28..36], bar.close);
                LittleEndian::write_f64(&mut buf[36..44], bar.ticks as f64);
            }
            FormatVersion::V401 => {
                LittleEndian::write_i64(&mut buf[0..8], bar.open_time);
                LittleEndian::write_f64(&mut buf[8..16], bar.open);
                LittleEndian::write_f64(&mut buf[16..24], bar.high);
                LittleEndian::write_f64(&mut buf[24..32], bar.low);
                LittleEndian::write_f64(&mut buf[32..40], bar.close);
                LittleEndian::write_u64(&mut buf[40..48], bar.ticks);
                LittleEndian::write_i32(&mut buf[48..52], bar.spread);
                LittleEndian::write_u64(&mut buf[52..60], bar.real_volume);
            }
        }
        Ok(())
    }

    /// Encodes one bar into a fixed-size record.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::TimeOutOfRange`] if format 400 cannot hold the bar time.
    pub fn encode(&self, bar: &Bar) -> Result<Vec<u8>, FormatError> {
        let mut out = Vec::with_capacity(self.record_size());
        self.encode_into(bar, &mut out)?;
        Ok(out)
    }

    /// Decodes one record.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::RecordLength`] if `bytes` is not exactly one record.
    pub fn decode(&self, bytes: &[u8]) -> Result<Bar, FormatError> {
        if bytes.len() != self.record_size() {
            return Err(FormatError::RecordLength {
                expected: self.record_size(),
                actual: bytes.len(),
            });
        }
        Ok(self.decode_record(bytes))
    }

    /// Returns the size in bytes of the open time field leading each record.
    #[must_use]
    pub const fn time_size(&self) -> usize {
        match self.version {
            FormatVersion::V400 => 4,
            FormatVersion::V401 => 8,
        }
    }

    /// Decodes the open time from the leading bytes of a record.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::RecordLength`] if `bytes` is shorter than the time field.
    pub fn decode_time(&self, bytes: &[u8]) -> Result<i64, FormatError> {
        if bytes.len() < self.time_size() {
            return Err(FormatError::RecordLength {
                expected: self.time_size(),
                actual: bytes.len(),
            });
        }
        Ok(match self.version {
            FormatVersion::V400 => i64::from(LittleEndian::read_i32(&bytes[0..4])),
            FormatVersion::V401 => LittleEndian::read_i64(&bytes[0..8]),
        })
    }

    /// Decodes a run of consecutive records.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::RecordLength`] if `data` is not a whole number of records.
    pub fn decode_all<'a>(
        &self,
        data: &'a [u8],
    ) -> Result<impl Iterator<Item = Bar> + use<'a>, FormatError> {
        let size = self.record_size();
        if !data.len().is_multiple_of(size) {
            return Err(FormatError::RecordLength {
                expected: size,
                actual: data.len() % size,
            });
        }
        let codec = *self;
        Ok(data.chunks_exact(size).map(move |chunk| codec.decode_record(chunk)))
    }

    /// Returns the bar as it reads back after a write in this format.
    ///
    /// Format 400 drops spread and real volume.
    #[must_use]
    pub const fn retained(&self, bar: &Bar) -> Bar {
        match self.version {
            FormatVersion::V400 => bar.with_extended(0, 0),
            FormatVersion::V401 => *bar,
        }
    }

    #[inline]
    fn decode_record(&self, buf: &[u8]) -> Bar {
        match self.version {
            FormatVersion::V400 => Bar::new(
                i64::from(LittleEndian::read_i32(&buf[0..4])),
                LittleEndian::read_f64(&buf[4..12]),
                LittleEndian::read_f64(&buf[20..28]),
                LittleEndian::read_f64(&buf[12..20]),
                LittleEndian::read_f64(&buf[28..36]),
                LittleEndian::read_f64(&buf[36..44]).round() as u64,
            ),
            FormatVersion::V401 => Bar::new(
                LittleEndian::read_i64(&buf[0..8]),
                LittleEndian::read_f64(&buf[8..16]),
                LittleEndian::read_f64(&buf[16..24]),
                LittleEndian::read_f64(&buf[24..32]),
                LittleEndian::read_f64(&buf[32..40]),
                LittleEndian::read_u64(&buf[40..48]),
            )
            .with_extended(
                LittleEndian::read_i32(&buf[48..52]),
                LittleEndian::read_u64(&buf[52..60]),
            ),
        }
    }
}

/// Encodes one bar for a format version number.
///
/// # Errors
///
/// Returns an error for unsupported versions or unrepresentable times.
pub fn encode(bar: &Bar, version: u32) -> Result<Vec<u8>, FormatError> {
    BarCodec::new(version)?.encode(bar)
}

/// Decodes one record for a format version number.
///
/// # Errors
///
/// Returns an error for unsupported versions or a wrong slice length.
pub fn decode(bytes: &[u8], version: u32) -> Result<Bar, FormatError> {
    BarCodec::new(version)?.decode(bytes)
}
