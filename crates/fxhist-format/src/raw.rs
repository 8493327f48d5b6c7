//! Raw M1 day-file parsing.

use byteorder::{ByteOrder, LittleEndian};
use fxhist_types::{FormatError, RawBar};

/// Parses raw M1 records from a cached day file.
///
/// Day files store records as 24 bytes in little-endian order:
/// - `u32`: open time in FXT seconds (bytes 0-3)
/// - `u32`: open in points (bytes 4-7)
/// - `u32`: high in points (bytes 8-11)
/// - `u32`: low in points (bytes 12-15)
/// - `u32`: close in points (bytes 16-19)
/// - `u32`: tick count (bytes 20-23)
///
/// # Errors
///
/// Returns [`FormatError::TrailingBytes`] if the data length is not a multiple
/// of the record size.
pub fn parse_raw_bars(data: &[u8]) -> Result<impl Iterator<Item = RawBar> + '_, FormatError> {
    if !data.len().is_multiple_of(RawBar::SIZE) {
        return Err(FormatError::TrailingBytes {
            len: data.len() as u64,
            extra: (data.len() % RawBar::SIZE) as u64,
        });
    }

    Ok(data.chunks_exact(RawBar::SIZE).map(parse_single_bar))
}

#[inline]
fn parse_single_bar(data: &[u8]) -> RawBar {
    RawBar::new(
        LittleEndian::read_u32(&data[0..4]),
        LittleEndian::read_u32(&data[4..8]),
        LittleEndian::read_u32(&data[8..12]),
        LittleEndian::read_u32(&data[12..16]),
        LittleEndian::read_u32(&data[16..20]),
        LittleEndian::read_u32(&data[20..24]),
    )
}

/// Returns the number of raw records in data of the given length.
#[must_use]
pub const fn raw_bar_count(data_len: usize) -> usize {
    data_len / RawBar::SIZE
}
