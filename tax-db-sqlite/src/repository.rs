use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Row, sqlite::SqlitePool};
use tax_core::{Bracket, RateEntry, RepositoryError, TaxRepository};
use tracing::{debug, info};

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Connects to a sqlx SQLite URL such as `sqlite:rates.db?mode=rwc` or
    /// `sqlite::memory:`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            info!(file = %path.display(), "Applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_rate_entry(row: &sqlx::sqlite::SqliteRow) -> Result<RateEntry, RepositoryError> {
    Ok(RateEntry {
        category: row
            .try_get("category")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        rate: get_decimal(row, "rate")?,
        effective_date: row
            .try_get::<NaiveDate, _>("effective_date")
            .map_err(|e| RepositoryError::Database(format!("Failed to get effective_date: {}", e)))?,
    })
}

fn row_to_bracket(row: &sqlx::sqlite::SqliteRow) -> Result<Bracket, RepositoryError> {
    Ok(Bracket {
        lower_bound: get_decimal(row, "lower_bound")?,
        upper_bound: get_optional_decimal(row, "upper_bound")?,
        marginal_rate: get_decimal(row, "marginal_rate")?,
        subtraction_constant: get_decimal(row, "subtraction_constant")?,
    })
}

#[async_trait]
impl TaxRepository for SqliteRepository {
    async fn list_rate_entries(&self) -> Result<Vec<RateEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT category, rate, effective_date FROM tax_rates
             ORDER BY category, effective_date",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_rate_entry).collect()
    }

    async fn get_rate_entries(
        &self,
        category: &str,
    ) -> Result<Vec<RateEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT category, rate, effective_date FROM tax_rates
             WHERE category = ?
             ORDER BY effective_date",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter().map(row_to_rate_entry).collect()
    }

    async fn upsert_rate_entry(
        &self,
        entry: &RateEntry,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO tax_rates (category, rate, effective_date) VALUES (?, ?, ?)
             ON CONFLICT (category, effective_date) DO UPDATE SET rate = excluded.rate",
        )
        .bind(&entry.category)
        .bind(decimal_to_text(entry.rate))
        .bind(entry.effective_date)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        debug!(category = %entry.category, rate = %entry.rate, "Stored rate entry");
        Ok(())
    }

    async fn delete_rate_entries(
        &self,
        category: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM tax_rates WHERE category = ?")
            .bind(category)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn list_schedules(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query("SELECT DISTINCT schedule FROM tax_brackets ORDER BY schedule")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get("schedule")
                    .map_err(|e| RepositoryError::Database(e.to_string()))
            })
            .collect()
    }

    async fn get_brackets(
        &self,
        schedule: &str,
    ) -> Result<Vec<Bracket>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT lower_bound, upper_bound, marginal_rate, subtraction_constant
             FROM tax_brackets
             WHERE schedule = ?",
        )
        .bind(schedule)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut brackets = rows
            .iter()
            .map(row_to_bracket)
            .collect::<Result<Vec<_>, _>>()?;
        // TEXT columns sort lexically; order numerically here.
        brackets.sort_by(|a, b| a.lower_bound.cmp(&b.lower_bound));
        Ok(brackets)
    }

    async fn insert_bracket(
        &self,
        schedule: &str,
        bracket: &Bracket,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO tax_brackets (schedule, lower_bound, upper_bound, marginal_rate, subtraction_constant)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(schedule)
        .bind(decimal_to_text(bracket.lower_bound))
        .bind(bracket.upper_bound.map(decimal_to_text))
        .bind(decimal_to_text(bracket.marginal_rate))
        .bind(decimal_to_text(bracket.subtraction_constant))
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn delete_brackets(
        &self,
        schedule: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM tax_brackets WHERE schedule = ?")
            .bind(schedule)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }
}
