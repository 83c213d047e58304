use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info};

use tax_core::TaxTables;
use tax_core::db::RepositoryRegistry;
use tax_db_sqlite::SqliteRepositoryFactory;

use crate::config::CliConfig;

/// Registry with every backend this binary ships.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Opens the configured repository and reads the snapshot in effect on
/// `as_of`.
pub async fn load_tables(
    config: &CliConfig,
    as_of: NaiveDate,
) -> Result<TaxTables> {
    debug!(backend = %config.database.backend, "Opening repository");
    let repo = build_registry()
        .create(&config.database)
        .await
        .with_context(|| format!("Failed to open the {} repository", config.database.backend))?;

    let tables = TaxTables::load(&*repo, config.engine.clone(), as_of)
        .await
        .context("Failed to load the rate tables")?;

    info!(
        %as_of,
        categories = tables.rates().categories().len(),
        schedules = ?tables.schedule_names(),
        "Rate tables loaded"
    );
    Ok(tables)
}
