//! The immutable rate and bracket snapshot every computation reads from.
//!
//! A [`TaxTables`] is built once, either from a [`TaxRepository`] or from
//! rows supplied directly, and is then shared by reference (or `Arc`) for as
//! long as the data is current. Refreshing the rates means building a new
//! snapshot.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calculations::{
    BracketTable, BracketTableError, LevyError, LevyStack, ProgressiveTaxCalculator, RateResolver,
    RateTableError,
};
use crate::config::{ConfigError, EngineConfig};
use crate::db::{RepositoryError, TaxRepository};
use crate::models::{Bracket, RateEntry};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TablesError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid rate table: {0}")]
    RateTable(#[from] RateTableError),

    #[error("invalid bracket schedule '{schedule}': {source}")]
    BracketTable {
        schedule: String,
        source: BracketTableError,
    },

    #[error("invalid levy configuration: {0}")]
    Levy(#[from] LevyError),

    #[error("bracket schedule '{0}' not found")]
    MissingSchedule(String),

    #[error("failed to load tables: {0}")]
    Repository(#[from] RepositoryError),
}

/// Resolved rates, validated bracket schedules and the levy stack.
#[derive(Debug, Clone)]
pub struct TaxTables {
    rates: RateResolver,
    schedules: HashMap<String, BracketTable>,
    levies: LevyStack,
    config: EngineConfig,
    as_of: NaiveDate,
}

impl TaxTables {
    /// Builds a snapshot from rows already in memory.
    ///
    /// # Errors
    ///
    /// Returns [`TablesError`] if the configuration, the rate rows, any
    /// schedule or the levy stack is invalid.
    pub fn from_parts(
        rate_entries: &[RateEntry],
        schedules: BTreeMap<String, Vec<Bracket>>,
        config: EngineConfig,
        as_of: NaiveDate,
    ) -> Result<Self, TablesError> {
        config.validate()?;

        let rates = RateResolver::new(rate_entries, as_of, config.rates.clone())?;
        let levies = LevyStack::new(config.levies.clone())?;

        let tolerance = config.brackets.contiguity_tolerance;
        let schedules = schedules
            .into_iter()
            .map(|(name, brackets)| match BracketTable::new(brackets, tolerance) {
                Ok(table) => Ok((name, table)),
                Err(source) => Err(TablesError::BracketTable {
                    schedule: name,
                    source,
                }),
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self {
            rates,
            schedules,
            levies,
            config,
            as_of,
        })
    }

    /// Reads every rate row and bracket schedule from `repo` and builds a
    /// snapshot effective on `as_of`.
    ///
    /// Schedules whose rates decrease, or whose stored subtraction
    /// constants disagree with marginal accumulation, are accepted with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns [`TablesError::Repository`] if a read fails, and the errors of
    /// [`TaxTables::from_parts`] otherwise.
    pub async fn load(
        repo: &dyn TaxRepository,
        config: EngineConfig,
        as_of: NaiveDate,
    ) -> Result<Self, TablesError> {
        let rate_entries = repo.list_rate_entries().await?;
        debug!(count = rate_entries.len(), "Loaded rate entries");

        let mut schedules = BTreeMap::new();
        for name in repo.list_schedules().await? {
            let brackets = repo.get_brackets(&name).await?;
            debug!(schedule = %name, count = brackets.len(), "Loaded bracket schedule");
            schedules.insert(name, brackets);
        }

        let tables = Self::from_parts(&rate_entries, schedules, config, as_of)?;

        for name in tables.schedule_names() {
            let Some(table) = tables.schedules.get(name) else {
                continue;
            };
            if !table.is_progressive() {
                warn!(schedule = %name, "Marginal rates decrease between bands");
            }
            let discrepancies = ProgressiveTaxCalculator::new(table).subtraction_constant_discrepancies();
            for d in &discrepancies {
                warn!(
                    schedule = %name,
                    lower = %d.lower,
                    stored = %d.stored,
                    expected = %d.expected,
                    "Stored subtraction constant disagrees with marginal accumulation"
                );
            }
        }

        if !tables.schedules.contains_key(&tables.config.brackets.default_schedule) {
            warn!(
                schedule = %tables.config.brackets.default_schedule,
                "Default bracket schedule is not in the repository"
            );
        }

        info!(
            %as_of,
            categories = tables.rates.categories().len(),
            schedules = tables.schedules.len(),
            levies = tables.levies.levies().len(),
            "Tax tables loaded"
        );

        Ok(tables)
    }

    pub fn rates(&self) -> &RateResolver {
        &self.rates
    }

    pub fn levies(&self) -> &LevyStack {
        &self.levies
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// # Errors
    ///
    /// Returns [`TablesError::MissingSchedule`] if no schedule has that name.
    pub fn schedule(
        &self,
        name: &str,
    ) -> Result<&BracketTable, TablesError> {
        self.schedules
            .get(name)
            .ok_or_else(|| TablesError::MissingSchedule(name.to_string()))
    }

    /// The schedule named by `brackets.default_schedule`.
    pub fn default_schedule(&self) -> Result<&BracketTable, TablesError> {
        self.schedule(&self.config.brackets.default_schedule)
    }

    /// Schedule names, sorted.
    pub fn schedule_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.schedules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::TaxCategory;

    pub fn effective_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
    }

    pub fn seeded_rates() -> Vec<RateEntry> {
        let rates: [(TaxCategory, Decimal); 11] = [
            (TaxCategory::Vat, dec!(0.15)),
            (TaxCategory::WithholdingRoyalties, dec!(0.15)),
            (TaxCategory::WithholdingFees, dec!(0.20)),
            (TaxCategory::WithholdingInterest, dec!(0.10)),
            (TaxCategory::WithholdingTenders, dec!(0.30)),
            (TaxCategory::CorporateIncome, dec!(0.24)),
            (TaxCategory::IndividualIncome, dec!(0.24)),
            (TaxCategory::Agriculture, dec!(0.10)),
            (TaxCategory::Insurance, dec!(0.05)),
            (TaxCategory::Financial, dec!(0.03)),
            (TaxCategory::Healthcare, dec!(0.20)),
        ];
        rates
            .into_iter()
            .map(|(category, rate)| RateEntry {
                category: category.as_str().to_string(),
                rate,
                effective_date: effective_date(),
            })
            .collect()
    }

    pub fn paye_brackets() -> Vec<Bracket> {
        vec![
            Bracket::bounded(dec!(0), dec!(100), dec!(0)),
            Bracket::bounded(dec!(100.01), dec!(300), dec!(0.20)).with_subtraction_constant(dec!(20)),
            Bracket::bounded(dec!(300.01), dec!(1000), dec!(0.25)).with_subtraction_constant(dec!(35)),
            Bracket::bounded(dec!(1000.01), dec!(2000), dec!(0.30)).with_subtraction_constant(dec!(85)),
            Bracket::bounded(dec!(2000.01), dec!(3000), dec!(0.35)).with_subtraction_constant(dec!(185)),
            Bracket::unbounded(dec!(3000.01), dec!(0.40)).with_subtraction_constant(dec!(335)),
        ]
    }

    /// The seeded deployment: eleven flat rates, the PAYE schedule and the
    /// default configuration.
    pub fn seeded_tables() -> TaxTables {
        TaxTables::from_parts(
            &seeded_rates(),
            BTreeMap::from([("PAYE".to_string(), paye_brackets())]),
            EngineConfig::default(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
        .unwrap()
    }
}
