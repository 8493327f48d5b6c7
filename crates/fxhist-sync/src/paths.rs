//! Data-root path construction.
//!
//! Raw day files live at
//! `{root}/history/{source}/{kind}/{SYMBOL}/{YYYY}/{MM}/{DD}/M1.bin`,
//! merged history files at `{root}/history/{provider}/{SYMBOL}{minutes}.hst`.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use fxhist_store::HistoryFile;
use fxhist_types::{Period, SymbolInfo};

/// Which file of a symbol to locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind<'a> {
    /// Cached raw M1 bars of one FXT day.
    RawM1Day(NaiveDate),
    /// Merged history file of one period.
    History {
        /// Provider directory name.
        provider: &'a str,
        /// Period of the file.
        period: Period,
    },
}

/// Directory holding a provider's history files.
#[must_use]
pub fn history_dir(root: &Path, provider: &str) -> PathBuf {
    root.join("history").join(provider)
}

/// Builds the path of one file of `info` under `root`.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use fxhist_sync::{PathKind, history_path};
/// use fxhist_types::{SymbolInfo, SymbolKind};
/// use std::path::Path;
///
/// let info = SymbolInfo::new("eurusd", "Euro vs US Dollar", SymbolKind::Forex, 5, "dukascopy");
/// let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
/// let path = history_path(Path::new("/data"), &info, PathKind::RawM1Day(date));
/// assert_eq!(path, Path::new("/data/history/dukascopy/forex/EURUSD/2024/01/05/M1.bin"));
/// ```
#[must_use]
pub fn history_path(root: &Path, info: &SymbolInfo, kind: PathKind<'_>) -> PathBuf {
    let symbol = info.name().to_uppercase();
    match kind {
        PathKind::RawM1Day(date) => root
            .join("history")
            .join(info.source())
            .join(info.kind().as_str())
            .join(&symbol)
            .join(format!("{:04}", date.year()))
            .join(format!("{:02}", date.month()))
            .join(format!("{:02}", date.day()))
            .join("M1.bin"),
        PathKind::History { provider, period } => {
            history_dir(root, provider).join(HistoryFile::file_name(&symbol, period))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxhist_types::SymbolKind;

    fn gold() -> SymbolInfo {
        SymbolInfo::new("XAUUSD", "Gold", SymbolKind::Metals, 2, "dukascopy")
    }

    #[test]
    fn test_raw_day_path_pads_month_and_day() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        let path = history_path(Path::new("/srv"), &gold(), PathKind::RawM1Day(date));
        assert_eq!(
            path,
            Path::new("/srv/history/dukascopy/metals/XAUUSD/2023/12/01/M1.bin")
        );
    }

    #[test]
    fn test_history_file_path() {
        let kind = PathKind::History {
            provider: "fxhist",
            period: Period::H4,
        };
        let path = history_path(Path::new("/srv"), &gold(), kind);
        assert_eq!(path, Path::new("/srv/history/fxhist/XAUUSD240.hst"));
    }
}
