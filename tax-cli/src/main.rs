use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing::debug;

use tax_cli::commands::Command;
use tax_cli::config::CliConfig;
use tax_cli::{app, logging};
use tax_core::TaxEngine;

// --- CLI definition ---

/// Tax computations over the administrative rate and bracket tables.
///
/// Opens the configured database, reads the tables in effect on the as-of
/// date and prints the result of one computation as JSON.
#[derive(Debug, Parser)]
#[command(name = "tax-engine", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database connection string, overriding the configuration.
    /// For SQLite this is a file path (e.g. `rates.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Date the rate table is read at (YYYY-MM-DD). Defaults to today.
    #[arg(long, global = true)]
    as_of: Option<NaiveDate>,

    /// Log filter, e.g. `debug` or `warn,tax_core=trace`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Print compact JSON instead of pretty-printed.
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

// --- Entry point ---

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load_or_default(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database.connection_string = db;
    }

    logging::init_logging(
        cli.log_level.as_deref().or(config.logging.level.as_deref()),
        cli.log_file.as_deref().or(config.logging.file.as_deref()),
    )?;

    let as_of = cli.as_of.unwrap_or_else(|| Local::now().date_naive());
    let tables = app::load_tables(&config, as_of).await?;
    let engine = TaxEngine::new(&tables);

    debug!(command = ?cli.command, "Running command");
    let output = cli.command.execute(&engine)?;

    let text = if cli.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{text}");

    Ok(())
}
