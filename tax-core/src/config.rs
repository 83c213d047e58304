//! Engine configuration.
//!
//! Everything the calculators need besides the rate and bracket rows:
//! fallback rates, the levy stack, the bracket contiguity tolerance and a
//! few policy switches. The defaults reproduce the behaviour of the
//! existing deployment (3% AIDS levy, 25% corporate fallback, PAYE bands
//! stored with one-cent steps).
//!
//! The struct deserializes from any serde format; the CLI reads it from
//! TOML:
//!
//! ```toml
//! [rates]
//! default_rate = "0"
//!
//! [rates.categories]
//! Corporate_Income = "0.25"
//!
//! [[levies]]
//! name = "AIDS Levy"
//! rate = "0.03"
//!
//! [brackets]
//! contiguity_tolerance = "0.01"
//! default_schedule = "PAYE"
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::is_fraction;
use crate::models::{Levy, TaxCategory};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("bracket contiguity tolerance must be non-negative, got {0}")]
    InvalidTolerance(Decimal),

    #[error("default bracket schedule must not be empty")]
    EmptyDefaultSchedule,

    #[error("capital allowance rate must be between 0 and 1, got {0}")]
    InvalidAllowanceRate(Decimal),

    #[error("VAT deferment threshold must be non-negative, got {0}")]
    InvalidDefermentThreshold(Decimal),
}

/// Rates used when a category has no active row in the rate table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateFallbacks {
    /// Rate for categories without a row or a specific fallback.
    pub default_rate: Decimal,

    /// Explicit per-category fallbacks.
    pub categories: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BracketConfig {
    /// Largest gap between one band's upper bound and the next band's lower
    /// bound that still counts as contiguous.
    pub contiguity_tolerance: Decimal,

    /// Schedule used by the income tax and PAYE computations.
    pub default_schedule: String,
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self {
            contiguity_tolerance: Decimal::new(1, 2),
            default_schedule: "PAYE".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatTaxPolicy {
    /// Lets negative amounts produce negative (refund) flat taxes instead of
    /// being clamped to zero.
    pub allow_refunds: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowanceConfig {
    /// Rate applied to qualifying asset values when none is supplied.
    pub capital_allowance_rate: Decimal,

    /// Equipment value from which VAT deferment is granted.
    pub vat_deferment_threshold: Decimal,

    /// Deferment period granted at or above the threshold.
    pub vat_deferment_days: u32,
}

impl Default for AllowanceConfig {
    fn default() -> Self {
        Self {
            capital_allowance_rate: Decimal::new(10, 2),
            vat_deferment_threshold: Decimal::from(10_000),
            vat_deferment_days: 30,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rates: RateFallbacks,
    pub levies: Vec<Levy>,
    pub brackets: BracketConfig,
    pub flat: FlatTaxPolicy,
    pub allowances: AllowanceConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rates: RateFallbacks {
                default_rate: Decimal::ZERO,
                categories: BTreeMap::from([(
                    TaxCategory::CorporateIncome.as_str().to_string(),
                    Decimal::new(25, 2),
                )]),
            },
            levies: vec![Levy::aids_levy()],
            brackets: BracketConfig::default(),
            flat: FlatTaxPolicy::default(),
            allowances: AllowanceConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Checks the settings not covered by the rate resolver and levy stack
    /// constructors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a negative contiguity tolerance, an empty
    /// default schedule, a capital allowance rate outside `[0, 1]` or a
    /// negative deferment threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.brackets.contiguity_tolerance < Decimal::ZERO {
            return Err(ConfigError::InvalidTolerance(
                self.brackets.contiguity_tolerance,
            ));
        }
        if self.brackets.default_schedule.trim().is_empty() {
            return Err(ConfigError::EmptyDefaultSchedule);
        }
        if !is_fraction(self.allowances.capital_allowance_rate) {
            return Err(ConfigError::InvalidAllowanceRate(
                self.allowances.capital_allowance_rate,
            ));
        }
        if self.allowances.vat_deferment_threshold < Decimal::ZERO {
            return Err(ConfigError::InvalidDefermentThreshold(
                self.allowances.vat_deferment_threshold,
            ));
        }
        Ok(())
    }
}
