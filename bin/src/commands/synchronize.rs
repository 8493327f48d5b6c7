//! Catalog synchronize command.
//!
//! Compares the history range recorded in the symbol catalog with the range
//! actually present in each symbol's M1 history file.

use crate::display::{format_date, select_symbols};
use anyhow::{Context, Result};
use fxhist_lib::prelude::*;
use fxhist_lib::{PathKind, history_path};

/// Report catalog ranges that differ from the files, storing them with `write`.
pub(crate) fn synchronize(config: &Config, symbols: &[String], write: bool) -> Result<()> {
    let mut catalog =
        JsonSymbolCatalog::load(config.catalog_path()).context("Failed to load symbol catalog")?;
    let symbols = select_symbols(&catalog, symbols)?;

    println!(
        "{:<12} {:<23} {:<23} {:<8}",
        "SYMBOL", "CATALOG", "FILE", "STATE"
    );
    println!("{}", "-".repeat(70));

    let mut changed = 0usize;
    for info in &symbols {
        let kind = PathKind::History {
            provider: &config.provider,
            period: Period::M1,
        };
        let path = history_path(&config.data_root, info, kind);

        let (start, end) = match HistoryFile::open_read_only(&path) {
            Ok(report) => (
                report
                    .first_bar
                    .map(|bar| config.time_base.fxt_date(bar.open_time))
                    .transpose()?,
                report
                    .last_bar
                    .map(|bar| config.time_base.fxt_date(bar.open_time))
                    .transpose()?,
            ),
            Err(e) if e.is_not_found() => (None, None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let recorded = (info.history_start(), info.history_end());
        let in_sync = recorded == (start, end);
        // A symbol without a file keeps its configured start for the first update
        let store = !in_sync && write && start.is_some();
        let state = if in_sync {
            "ok"
        } else if store {
            "updated"
        } else if start.is_none() {
            "no file"
        } else {
            "differs"
        };

        println!(
            "{:<12} {:<23} {:<23} {:<8}",
            info.name(),
            format!("{} .. {}", format_date(recorded.0), format_date(recorded.1)),
            format!("{} .. {}", format_date(start), format_date(end)),
            state,
        );

        if store {
            catalog.set_history_range(info.name(), start, end)?;
            changed += 1;
        }
    }

    if changed > 0 {
        catalog.save().context("Failed to save symbol catalog")?;
        println!("\nUpdated {changed} catalog entries.");
    } else if !write {
        println!("\nUse --write to store the file ranges in the catalog.");
    }
    Ok(())
}
