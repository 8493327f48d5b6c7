//! Scale command implementation.

use crate::display::{format_time, parse_time};
use anyhow::{Context, Result};
use fxhist_lib::prelude::*;
use inquire::Confirm;
use std::path::Path;

/// Rewrite the prices of the bars of `file` within `[from, to)`.
pub(crate) fn scale(
    file: &Path,
    op_str: &str,
    value: f64,
    from_str: Option<&str>,
    to_str: Option<&str>,
    yes: bool,
) -> Result<()> {
    let op: ScaleOp = op_str.parse()?;
    let from = from_str.map(parse_time).transpose()?;
    let to = to_str.map(parse_time).transpose()?;
    let scaler = BarScaler::new(op, value, ScaleRange::new(from, to))?;

    let info = HistoryFile::open_read_only(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if !yes {
        println!("File:   {}", file.display());
        println!(
            "Symbol: {} {} ({} digits, {} bars)",
            info.header.symbol, info.header.period, info.header.digits, info.bars
        );
        println!("Range:  {} -> {}", format_time(from), format_time(to));
        println!("Change: price {op} {value}");
        println!();

        let confirmed = Confirm::new("Rewrite the bars in place?")
            .with_default(false)
            .prompt()
            .context("Confirmation cancelled")?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let report = scaler
        .scale_file(file)
        .with_context(|| format!("Failed to scale {}", file.display()))?;
    println!("Rewrote {} of {} bars.", report.rewritten, report.scanned);
    Ok(())
}
