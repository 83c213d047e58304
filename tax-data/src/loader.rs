use std::collections::BTreeMap;
use std::io::Read;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::calculations::common::is_fraction;
use tax_core::calculations::{BracketTable, BracketTableError};
use tax_core::config::EngineConfig;
use tax_core::{Bracket, RateEntry, RepositoryError, TaxRepository};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading flat rate data.
#[derive(Debug, Error)]
pub enum RateLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Empty category on row {row}")]
    EmptyCategory { row: usize },

    #[error("Rate {rate} for '{category}' is outside [0, 1]")]
    InvalidRate { category: String, rate: Decimal },

    #[error("'{category}' has two rows effective {effective_date}")]
    DuplicateEffectiveDate {
        category: String,
        effective_date: NaiveDate,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for RateLoaderError {
    fn from(err: csv::Error) -> Self {
        RateLoaderError::CsvParse(err.to_string())
    }
}

/// Errors that can occur when loading bracket schedules.
#[derive(Debug, Error)]
pub enum BracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Empty schedule name on row {row}")]
    EmptySchedule { row: usize },

    #[error("Schedule '{schedule}' is not a valid bracket table: {source}")]
    InvalidSchedule {
        schedule: String,
        #[source]
        source: BracketTableError,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for BracketLoaderError {
    fn from(err: csv::Error) -> Self {
        BracketLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the flat rates CSV file.
///
/// - `category`: the rate category (e.g., `VAT`, `Withholding_Fees`)
/// - `rate`: the rate as a fraction (e.g., 0.15 for 15%)
/// - `effective_date`: ISO date from which the rate applies
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RateRecord {
    pub category: String,
    pub rate: Decimal,
    pub effective_date: NaiveDate,
}

impl From<&RateRecord> for RateEntry {
    fn from(record: &RateRecord) -> Self {
        RateEntry {
            category: record.category.trim().to_string(),
            rate: record.rate,
            effective_date: record.effective_date,
        }
    }
}

/// A single record from the bracket schedules CSV file.
///
/// - `schedule`: the schedule name (e.g., `PAYE`)
/// - `lower_bound`: the first amount taxed in this band
/// - `upper_bound`: the last amount taxed in this band (empty for the top band)
/// - `marginal_rate`: the rate applied within the band
/// - `subtraction_constant`: optional; defaults to zero
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub schedule: String,
    pub lower_bound: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_bound: Option<Decimal>,
    pub marginal_rate: Decimal,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub subtraction_constant: Option<Decimal>,
}

impl From<&BracketRecord> for Bracket {
    fn from(record: &BracketRecord) -> Self {
        Bracket {
            lower_bound: record.lower_bound,
            upper_bound: record.upper_bound,
            marginal_rate: record.marginal_rate,
            subtraction_constant: record.subtraction_constant.unwrap_or(Decimal::ZERO),
        }
    }
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn parse_records<R, T, E>(reader: R) -> Result<Vec<T>, E>
where
    R: Read,
    T: serde::de::DeserializeOwned,
    E: From<csv::Error>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for result in csv_reader.deserialize() {
        let record: T = result?;
        records.push(record);
    }

    Ok(records)
}

/// Loader for the flat rate table.
///
/// Each category present in the input replaces every stored row for that
/// category. Categories absent from the input are left untouched.
pub struct RateLoader;

impl RateLoader {
    /// Parse rate records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<RateRecord>, RateLoaderError> {
        parse_records(reader)
    }

    /// Group records by category and check them without touching storage.
    pub fn validate(
        records: &[RateRecord]
    ) -> Result<BTreeMap<String, Vec<RateEntry>>, RateLoaderError> {
        let mut groups: BTreeMap<String, Vec<RateEntry>> = BTreeMap::new();

        for (index, record) in records.iter().enumerate() {
            let entry = RateEntry::from(record);
            if entry.category.is_empty() {
                return Err(RateLoaderError::EmptyCategory { row: index + 1 });
            }
            if !is_fraction(entry.rate) {
                return Err(RateLoaderError::InvalidRate {
                    category: entry.category,
                    rate: entry.rate,
                });
            }

            let group = groups.entry(entry.category.clone()).or_default();
            if group
                .iter()
                .any(|existing| existing.effective_date == entry.effective_date)
            {
                return Err(RateLoaderError::DuplicateEffectiveDate {
                    category: entry.category,
                    effective_date: entry.effective_date,
                });
            }
            group.push(entry);
        }

        Ok(groups)
    }

    /// Load rate records into the database.
    ///
    /// All records are validated first; nothing is written when any of them
    /// is rejected. Loading the same records twice leaves the same rows.
    pub async fn load<R: TaxRepository + ?Sized>(
        repo: &R,
        records: &[RateRecord],
    ) -> Result<usize, RateLoaderError> {
        let groups = Self::validate(records)?;
        let mut inserted = 0;

        for (category, entries) in groups {
            repo.delete_rate_entries(&category).await?;
            for entry in &entries {
                repo.upsert_rate_entry(entry).await?;
                inserted += 1;
            }
            debug!(%category, rows = entries.len(), "Replaced rate rows");
        }

        info!(inserted, "Loaded flat rates");
        Ok(inserted)
    }
}

/// Loader for progressive bracket schedules.
///
/// A schedule is only written when its rows form a valid bracket table under
/// the given contiguity tolerance. [`BracketLoader::load_with_config`] takes
/// the tolerance from an [`EngineConfig`], so an engine built from the same
/// configuration accepts every schedule the loader wrote.
pub struct BracketLoader;

impl BracketLoader {
    /// Parse bracket records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketRecord>, BracketLoaderError> {
        parse_records(reader)
    }

    /// Group records by schedule and check each group as a bracket table.
    pub fn validate(
        records: &[BracketRecord],
        tolerance: Decimal,
    ) -> Result<BTreeMap<String, Vec<Bracket>>, BracketLoaderError> {
        let mut groups: BTreeMap<String, Vec<Bracket>> = BTreeMap::new();

        for (index, record) in records.iter().enumerate() {
            let schedule = record.schedule.trim();
            if schedule.is_empty() {
                return Err(BracketLoaderError::EmptySchedule { row: index + 1 });
            }
            groups
                .entry(schedule.to_string())
                .or_default()
                .push(Bracket::from(record));
        }

        for (schedule, brackets) in &groups {
            BracketTable::new(brackets.clone(), tolerance).map_err(|source| {
                BracketLoaderError::InvalidSchedule {
                    schedule: schedule.clone(),
                    source,
                }
            })?;
        }

        Ok(groups)
    }

    /// Load bracket records into the database.
    ///
    /// For each schedule in the records this deletes the stored bands and
    /// inserts the new ones, so loading is idempotent.
    pub async fn load<R: TaxRepository + ?Sized>(
        repo: &R,
        records: &[BracketRecord],
        tolerance: Decimal,
    ) -> Result<usize, BracketLoaderError> {
        let groups = Self::validate(records, tolerance)?;
        let mut inserted = 0;

        for (schedule, brackets) in groups {
            repo.delete_brackets(&schedule).await?;
            for bracket in &brackets {
                repo.insert_bracket(&schedule, bracket).await?;
                inserted += 1;
            }
            debug!(%schedule, bands = brackets.len(), "Replaced bracket schedule");
        }

        info!(inserted, "Loaded bracket schedules");
        Ok(inserted)
    }

    /// [`BracketLoader::load`] with the engine's configured contiguity
    /// tolerance.
    pub async fn load_with_config<R: TaxRepository + ?Sized>(
        repo: &R,
        records: &[BracketRecord],
        config: &EngineConfig,
    ) -> Result<usize, BracketLoaderError> {
        Self::load(repo, records, config.brackets.contiguity_tolerance).await
    }
}
