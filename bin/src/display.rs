//! Argument parsing and output formatting for the fxhist CLI.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use fxhist_lib::prelude::*;
use fxhist_lib::gmt_to_fxt;

/// Parse a `YYYY-MM-DD` date argument.
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Invalid date: {s}"))
}

/// Parse a bar time argument, read in the clock of the history file.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM` and `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn parse_time(s: &str) -> Result<i64> {
    let s = s.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(time) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(time.and_utc().timestamp());
        }
    }
    let date = parse_date(s)?;
    match date.and_hms_opt(0, 0, 0) {
        Some(time) => Ok(time.and_utc().timestamp()),
        None => bail!("Invalid time: {s}"),
    }
}

/// Format an optional bar time as `YYYY-MM-DD HH:MM`.
pub(crate) fn format_time(time: Option<i64>) -> String {
    time.and_then(|t| DateTime::from_timestamp(t, 0))
        .map_or_else(|| "-".to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

/// Format an optional date, `-` when unset.
pub(crate) fn format_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

/// The current FXT trading day.
pub(crate) fn fxt_today() -> Result<NaiveDate> {
    let now = gmt_to_fxt(Utc::now().timestamp())?;
    DateTime::from_timestamp(now, 0)
        .map(|dt| dt.date_naive())
        .context("Current time out of range")
}

/// Resolve the requested symbols against the catalog, or list all of them.
pub(crate) fn select_symbols(
    catalog: &dyn SymbolCatalog,
    requested: &[String],
) -> Result<Vec<SymbolInfo>> {
    if requested.is_empty() {
        let symbols = catalog.symbols();
        if symbols.is_empty() {
            bail!("The symbol catalog lists no symbols");
        }
        return Ok(symbols);
    }
    requested
        .iter()
        .map(|name| catalog.lookup(name).map_err(Into::into))
        .collect()
}
