//! Capital allowances, income reliefs and credits, and VAT deferment.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::{is_fraction, non_negative, saturating_sum};
use crate::config::AllowanceConfig;
use crate::models::{Bucket, LooseAmount};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllowanceError {
    #[error("allowance rate must be between 0 and 1, got {0}")]
    InvalidRate(Decimal),

    #[error("deferment threshold must be non-negative, got {0}")]
    InvalidThreshold(Decimal),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapitalAllowanceInput {
    /// Cost of each qualifying asset.
    pub qualifying_assets: Bucket,
    /// Overrides the configured allowance rate.
    pub allowance_rate: Option<LooseAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalAllowanceResult {
    pub rate: Decimal,
    pub per_asset: BTreeMap<String, Decimal>,
    pub total_allowances: Decimal,
}

/// Taxable income with reliefs or credits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncomeAdjustmentInput {
    pub taxable_income: LooseAmount,
    #[serde(alias = "reliefs", alias = "credits")]
    pub items: Bucket,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustedIncome {
    pub taxable_income: Decimal,
    pub total_adjustments: Decimal,
    /// Never negative.
    pub adjusted_income: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VatDefermentInput {
    pub equipment_value: LooseAmount,
    /// Overrides the configured threshold.
    pub threshold: Option<LooseAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatDefermentResult {
    pub eligible: bool,
    pub threshold: Decimal,
    pub deferment_days: u32,
}

pub struct AllowanceCalculator<'a> {
    config: &'a AllowanceConfig,
}

impl<'a> AllowanceCalculator<'a> {
    pub fn new(config: &'a AllowanceConfig) -> Self {
        Self { config }
    }

    /// Σ asset cost × allowance rate.
    ///
    /// # Errors
    ///
    /// Returns [`AllowanceError::InvalidRate`] if a supplied rate lies
    /// outside `[0, 1]`.
    pub fn capital_allowances(
        &self,
        input: &CapitalAllowanceInput,
    ) -> Result<CapitalAllowanceResult, AllowanceError> {
        let rate = input
            .allowance_rate
            .map_or(self.config.capital_allowance_rate, LooseAmount::value);
        if !is_fraction(rate) {
            return Err(AllowanceError::InvalidRate(rate));
        }

        let per_asset: BTreeMap<String, Decimal> = input
            .qualifying_assets
            .iter()
            .map(|(label, cost)| (label.to_string(), cost * rate))
            .collect();
        let total_allowances = saturating_sum(per_asset.values().copied());

        Ok(CapitalAllowanceResult {
            rate,
            per_asset,
            total_allowances,
        })
    }

    /// Taxable income less the sum of reliefs (or credits), floored at zero.
    pub fn adjust_income(
        &self,
        input: &IncomeAdjustmentInput,
    ) -> AdjustedIncome {
        let taxable_income = input.taxable_income.value();
        let total_adjustments = input.items.total();
        AdjustedIncome {
            taxable_income,
            total_adjustments,
            adjusted_income: non_negative(taxable_income.saturating_sub(total_adjustments)),
        }
    }

    /// Equipment valued at or above the threshold earns the configured
    /// deferment period.
    ///
    /// # Errors
    ///
    /// Returns [`AllowanceError::InvalidThreshold`] for a negative
    /// threshold.
    pub fn vat_deferment(
        &self,
        input: &VatDefermentInput,
    ) -> Result<VatDefermentResult, AllowanceError> {
        let threshold = input
            .threshold
            .map_or(self.config.vat_deferment_threshold, LooseAmount::value);
        if threshold < Decimal::ZERO {
            return Err(AllowanceError::InvalidThreshold(threshold));
        }

        let eligible = input.equipment_value.value() >= threshold;
        Ok(VatDefermentResult {
            eligible,
            threshold,
            deferment_days: if eligible { self.config.vat_deferment_days } else { 0 },
        })
    }
}
