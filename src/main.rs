//! # pack-pricer CLI
//!
//! ## Usage
//!
//! ```bash
//! pack-pricer --config ./config/pack-pricer.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pack-pricer init` | Create the SQLite database and run schema migrations |
//! | `pack-pricer import <file>` | Load catalogue entities from a JSON array |
//! | `pack-pricer run` | Scrape, rank, and merge every configured pack |
//! | `pack-pricer show` | Print the stored aggregate report |
//!
//! The process exits with status 0 on success and 1 after logging any
//! unrecovered error.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chrono::{Offset, Utc};
use clap::{Parser, Subcommand};
use tracing::error;

use pack_pricer::config::{self, Config};
use pack_pricer::{catalogue, db, logging, migrate, pipeline, report};

/// pack-pricer: scrape entity prices, rank them, and maintain a report of
/// named top-N packs.
#[derive(Parser)]
#[command(name = "pack-pricer", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/pack-pricer.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Import catalogue entities from a JSON array of `{id, name, rating}`.
    Import {
        /// Path to the JSON file.
        path: PathBuf,
    },

    /// Scrape prices for every configured pack and update the report.
    Run,

    /// Print the stored aggregate report.
    Show {
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = config::load_config(&cli.config);
    let offset = loaded
        .as_ref()
        .map(|c| c.report.offset())
        .unwrap_or_else(|_| Utc.fix());
    if let Err(e) = logging::init(offset) {
        eprintln!("{:#}", e);
    }

    let outcome = match loaded {
        Ok(cfg) => execute(cli.command, &cfg).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "pack-pricer failed");
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Commands, cfg: &Config) -> Result<()> {
    match command {
        Commands::Init => {
            migrate::run_migrations(cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { path } => {
            let pool = db::connect(cfg).await?;
            migrate::apply_schema(&pool).await?;
            let count = catalogue::import_catalogue(&pool, &path).await;
            pool.close().await;
            println!("imported entities: {}", count?);
        }
        Commands::Run => {
            let summary = pipeline::run(cfg).await?;
            for pack in &summary.packs {
                println!(
                    "{}: {} candidates, {} scraped, {} failed, {} ranked, {} dropped{}",
                    pack.name,
                    pack.candidates,
                    pack.scraped,
                    pack.failed,
                    pack.ranked,
                    pack.dropped,
                    if pack.persisted { "" } else { " (prices not saved)" },
                );
            }
            println!("ok");
        }
        Commands::Show { json } => {
            report::run_show(cfg, json).await?;
        }
    }

    Ok(())
}
