//! Binary history record and header codecs for fxhist.
//!
//! Little-endian codecs for MetaTrader-compatible history files: the
//! 148-byte header shared by formats 400 and 401, the 44-byte (400) and
//! 60-byte (401) bar records, and the 24-byte records of cached raw M1 day
//! files.
//!
//! - [`BarCodec`] - Encodes and decodes bar records of format 400 or 401
//! - [`HistoryHeader`] - Fixed-size metadata block prefixed to every history file
//! - [`parse_raw_bars`] - Parses cached raw M1 day files

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fxhist/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod codec;
mod header;
mod raw;

pub use codec::{BarCodec, FormatVersion, decode, encode};
pub use header::{HEADER_SIZE, HistoryHeader, RewriteJournal, SYMBOL_LEN};
pub use raw::{parse_raw_bars, raw_bar_count};
