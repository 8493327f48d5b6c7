//! History status command.

use crate::display::{format_time, select_symbols};
use anyhow::{Context, Result};
use fxhist_lib::prelude::*;
use fxhist_lib::{PathKind, history_path};

/// Print the sync state of every history file of the selected symbols.
pub(crate) fn status(config: &Config, symbols: &[String]) -> Result<()> {
    let catalog =
        JsonSymbolCatalog::load(config.catalog_path()).context("Failed to load symbol catalog")?;
    let symbols = select_symbols(&catalog, symbols)?;

    println!(
        "{:<12} {:<6} {:>10} {:<17} {:<17} {:<17}",
        "SYMBOL", "PERIOD", "BARS", "FIRST", "LAST", "LAST SYNC"
    );
    println!("{}", "-".repeat(84));

    let mut missing = 0usize;
    for info in &symbols {
        for &period in &config.periods {
            let kind = PathKind::History {
                provider: &config.provider,
                period,
            };
            let path = history_path(&config.data_root, info, kind);

            let report = match HistoryFile::open_read_only(&path) {
                Ok(report) => report,
                Err(e) if e.is_not_found() => {
                    missing += 1;
                    println!("{:<12} {:<6} {:>10}", info.name(), period, "missing");
                    continue;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to read {}", path.display()));
                }
            };

            println!(
                "{:<12} {:<6} {:>10} {:<17} {:<17} {:<17}",
                info.name(),
                period,
                report.bars,
                format_time(report.first_bar.map(|bar| bar.open_time)),
                format_time(report.last_bar.map(|bar| bar.open_time)),
                format_time(report.header.last_sync_time),
            );
        }
    }

    println!("\nTotal: {} symbols", symbols.len());
    if missing > 0 {
        println!("{missing} history files not created yet. Run `fxhist update` to build them.");
    }
    Ok(())
}
