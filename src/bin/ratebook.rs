//! ratebook CLI - load exchange-rate feeds and inspect the store
//!
//! ## Example Usage
//!
//! ```bash
//! # Register the currencies the feed carries
//! ratebook add-currency "Japanese yen" JPY
//!
//! # Preview a feed load, then run it for real
//! ratebook load rms_rep.tsv --dry-run
//! ratebook load rms_rep.tsv --yes
//!
//! # Show the quarter boundaries of a year
//! ratebook quarters 2011
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ratebook::ingest;
use ratebook::loader;
use ratebook::quarters::Quarter;
use ratebook::reconcile::ReconcileOptions;
use ratebook::store::RateStore;
use std::path::PathBuf;
use std::process;

/// ratebook: exchange-rate feed reconciliation
#[derive(Parser)]
#[command(name = "ratebook")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Exchange-rate feed reconciliation", long_about = None)]
struct Cli {
    /// Path to the rate database
    #[arg(long, global = true, default_value = "rates.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a currency in the store
    AddCurrency {
        /// Full currency name, e.g. "Japanese yen"
        name: String,
        /// ISO code, e.g. JPY
        abbrev: String,
    },

    /// Load an IMF TSV feed and reconcile it
    Load {
        /// Path to the TSV report file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Classify only, write nothing
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Emit the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the fiscal quarter boundaries of a year
    Quarters {
        year: i32,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::AddCurrency { name, abbrev } => {
            let store = RateStore::open(&cli.db)?;
            let id = store.insert_currency(&name, &abbrev)?;
            println!("Registered {} ({}) with id {}", name, abbrev, id);
        }

        Commands::Load {
            file,
            dry_run,
            yes,
            json,
        } => {
            if !file.is_file() {
                bail!("No file found at: {}", file.display());
            }

            let mut store = RateStore::open(&cli.db)?;
            let feed = ingest::read_feed(&file)
                .with_context(|| format!("Failed to parse feed {}", file.display()))?;
            let items = ingest::to_new_items(&feed, &store)?;

            let options = ReconcileOptions {
                dry_run,
                prompt: !yes && !dry_run,
            };
            let report = loader::load_daily_rates(&mut store, &items, options)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Daily:     {}", report.daily);
                println!("Quarterly: {}", report.quarterly);
                if !report.persisted && !dry_run {
                    println!("No changes were written.");
                }
            }
        }

        Commands::Quarters { year } => {
            for end in Quarter::dates_in_year(year) {
                let quarter = Quarter::from_end_date(end)?;
                println!("{}  {} to {}", quarter.label(), quarter.start_date(), end);
            }
        }
    }

    Ok(())
}
