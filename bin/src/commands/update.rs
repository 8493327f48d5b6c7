//! Update command implementation.
//!
//! Merges cached daily M1 files into the history files of each symbol, one
//! checkpointed day at a time. Ctrl-C stops the run after the current day.

use crate::display::{fxt_today, parse_date};
use anyhow::{Context, Result, bail};
use fxhist_lib::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

/// Update the history files of the selected symbols.
pub(crate) async fn update(
    config: &Config,
    symbols: Vec<String>,
    period: Option<Period>,
    until_str: Option<&str>,
    quiet: bool,
) -> Result<()> {
    let catalog =
        JsonSymbolCatalog::load(config.catalog_path()).context("Failed to load symbol catalog")?;

    let symbols = if symbols.is_empty() {
        catalog
            .symbols()
            .iter()
            .map(|info| info.name().to_string())
            .collect()
    } else {
        symbols
    };
    if symbols.is_empty() {
        bail!("No symbols to update");
    }

    // The current day is still being written by the source
    let until = match until_str {
        Some(s) => parse_date(s)?,
        None => fxt_today()?.pred_opt().context("Current date out of range")?,
    };

    let periods = period.map_or_else(|| config.periods.clone(), |period| vec![period]);

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} days {msg}")
                .context("Invalid progress template")?
                .progress_chars("=>-"),
        );
        pb
    };

    let cancel = CancelToken::new();
    let handler = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handler.cancel();
        }
    });

    let bar = progress.clone();
    let source = FileDaySource::new(config.data_root.clone()).with_default_source(config.source.clone());
    let sync = Synchronizer::new(source, config.history_dir())
        .with_format(config.format_version)
        .with_periods(&periods)
        .with_time_base(config.time_base)
        .with_cancel_token(cancel.clone())
        .with_progress(move |day| {
            bar.set_length(day.total as u64);
            bar.set_position(day.done as u64);
            bar.set_message(format!("{} {}", day.symbol, day.date));
        });
    debug!(?sync, %until, "starting update");

    let outcomes = tokio::task::spawn_blocking(move || sync.sync_symbols(&catalog, &symbols, until))
        .await
        .context("Update task failed")?;
    progress.finish_and_clear();

    let mut failed = 0usize;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(report) => {
                if quiet {
                    continue;
                }
                let range = report.range.map_or_else(
                    || "up to date".to_string(),
                    |range| format!("{} -> {}", range.start, range.end),
                );
                println!(
                    "{:<12} {:<26} {:>4} days {:>8} bars{}{}",
                    outcome.symbol,
                    range,
                    report.days_synced,
                    report.bars_appended,
                    if report.partial_days > 0 {
                        format!(" ({} partial days)", report.partial_days)
                    } else {
                        String::new()
                    },
                    if report.cancelled { " (cancelled)" } else { "" },
                );
            }
            Err(e) => {
                failed += 1;
                eprintln!("{:<12} failed: {e}", outcome.symbol);
            }
        }
    }

    if cancel.is_cancelled() {
        println!("Cancelled. Completed days are kept; run update again to resume.");
    }
    if failed > 0 {
        bail!("{failed} of {} symbols failed to update", outcomes.len());
    }
    Ok(())
}
