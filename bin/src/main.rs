//! fxhist CLI - MetaTrader history files built from daily M1 data.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use fxhist_lib::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

#[derive(Parser)]
#[command(name = "fxhist")]
#[command(about = "MetaTrader history files built from daily M1 data", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file. Defaults to config.json in the platform config directory.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the sync state of each history file
    Status {
        /// Symbols to report (defaults to every catalog symbol)
        symbols: Vec<String>,
    },

    /// Merge new daily M1 data into the history files
    Update {
        /// Symbols to update (defaults to every catalog symbol)
        symbols: Vec<String>,

        /// Update a single period (M1, M5, M15, M30, H1, H4, D1, W1, MN1)
        #[arg(short, long)]
        period: Option<Period>,

        /// Last FXT day to merge (YYYY-MM-DD). Defaults to yesterday.
        #[arg(short, long)]
        until: Option<String>,
    },

    /// Rewrite bar prices of a history file with an arithmetic operation
    Scale {
        /// History file to rewrite
        file: PathBuf,

        /// Operator: + - * /
        #[arg(allow_hyphen_values = true)]
        op: String,

        /// Operand
        #[arg(allow_negative_numbers = true)]
        value: f64,

        /// First bar time to rewrite (YYYY-MM-DD or "YYYY-MM-DD HH:MM")
        #[arg(long)]
        from: Option<String>,

        /// End of the rewritten range, exclusive
        #[arg(long)]
        to: Option<String>,

        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Compare catalog history ranges with the M1 history files
    Synchronize {
        /// Symbols to check (defaults to every catalog symbol)
        symbols: Vec<String>,

        /// Store the file ranges into the catalog
        #[arg(long)]
        write: bool,
    },
}

/// Installs the fmt subscriber. `RUST_LOG` wins over the flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match command {
        Commands::Status { symbols } => commands::status::status(&config, &symbols),
        Commands::Update {
            symbols,
            period,
            until,
        } => commands::update::update(&config, symbols, period, until.as_deref(), cli.quiet).await,
        Commands::Scale {
            file,
            op,
            value,
            from,
            to,
            yes,
        } => commands::scale::scale(&file, &op, value, from.as_deref(), to.as_deref(), yes),
        Commands::Synchronize { symbols, write } => {
            commands::synchronize::synchronize(&config, &symbols, write)
        }
    }
}
