use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::config::EngineConfig;
use tax_data::{BracketLoader, RateLoader};
use tax_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

/// Load administrative rate data from CSV files into the database.
#[derive(Parser, Debug)]
#[command(name = "tax-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// SQLite database URL (e.g., sqlite:tax.db?mode=rwc to create if missing)
    #[arg(short, long, default_value = "sqlite:tax.db?mode=rwc", global = true)]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false, global = true)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long, global = true)]
    seeds: Option<PathBuf>,

    /// `tax-engine` configuration file; its `[engine]` section supplies the
    /// bracket contiguity tolerance
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load flat rates.
    ///
    /// Columns: category, rate (fraction, e.g. 0.15), effective_date (YYYY-MM-DD).
    Rates {
        /// Path to the CSV file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Load progressive bracket schedules.
    ///
    /// Columns: schedule, lower_bound, upper_bound (empty for the top band),
    /// marginal_rate, subtraction_constant (optional).
    Brackets {
        /// Path to the CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Largest gap allowed between one band's upper bound and the next
        /// band's lower bound, overriding the configured tolerance
        #[arg(short, long)]
        tolerance: Option<Decimal>,
    },
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open: {}", path.display()))
}

/// The part of the `tax-engine` configuration file the loader reads.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    engine: EngineConfig,
}

fn engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let file: ConfigFile =
        toml::from_str(&raw).with_context(|| format!("Invalid config: {}", path.display()))?;
    file.engine
        .validate()
        .context("invalid engine configuration")?;
    Ok(file.engine)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = engine_config(args.config.as_deref())?;

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    match &args.command {
        Command::Rates { file } => {
            println!("Loading flat rates from: {}", file.display());
            let records = RateLoader::parse(open(file)?)
                .with_context(|| format!("Failed to parse CSV: {}", file.display()))?;
            println!("Parsed {} records from CSV", records.len());

            let inserted = RateLoader::load(&repo, &records)
                .await
                .context("Failed to load flat rates into database")?;
            println!("Successfully loaded {} rate rows into the database.", inserted);
        }
        Command::Brackets { file, tolerance } => {
            println!("Loading bracket schedules from: {}", file.display());
            let records = BracketLoader::parse(open(file)?)
                .with_context(|| format!("Failed to parse CSV: {}", file.display()))?;
            println!("Parsed {} records from CSV", records.len());

            if let Some(tolerance) = tolerance {
                config.brackets.contiguity_tolerance = *tolerance;
            }
            let inserted = BracketLoader::load_with_config(&repo, &records, &config)
                .await
                .context("Failed to load bracket schedules into database")?;
            println!("Successfully loaded {} bands into the database.", inserted);
        }
    }

    Ok(())
}
