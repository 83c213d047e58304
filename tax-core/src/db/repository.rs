use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Bracket, RateEntry};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Storage for the administrative rate and bracket tables.
///
/// The engine only reads; the write methods exist for the data loader.
#[async_trait]
pub trait TaxRepository: Send + Sync {
    // Flat rates
    async fn list_rate_entries(&self) -> Result<Vec<RateEntry>, RepositoryError>;

    /// Every row stored for `category`, oldest first. Empty when the
    /// category is unknown.
    async fn get_rate_entries(
        &self,
        category: &str,
    ) -> Result<Vec<RateEntry>, RepositoryError>;

    /// Inserts the row, replacing any row with the same category and
    /// effective date.
    async fn upsert_rate_entry(
        &self,
        entry: &RateEntry,
    ) -> Result<(), RepositoryError>;

    async fn delete_rate_entries(
        &self,
        category: &str,
    ) -> Result<(), RepositoryError>;

    // Bracket schedules
    async fn list_schedules(&self) -> Result<Vec<String>, RepositoryError>;

    /// Brackets of `schedule` ordered by lower bound. Empty when the
    /// schedule is unknown.
    async fn get_brackets(
        &self,
        schedule: &str,
    ) -> Result<Vec<Bracket>, RepositoryError>;

    async fn insert_bracket(
        &self,
        schedule: &str,
        bracket: &Bracket,
    ) -> Result<(), RepositoryError>;

    async fn delete_brackets(
        &self,
        schedule: &str,
    ) -> Result<(), RepositoryError>;
}
