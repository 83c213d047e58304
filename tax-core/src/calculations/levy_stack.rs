//! Secondary levies charged as a percentage of a primary tax.
//!
//! Every levy is computed on the primary tax itself, so levies never
//! compound and their order only affects how the breakdown is listed.
//! Levy amounts and totals saturate at [`Decimal::MAX`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::{non_negative, round_half_up, saturating_sum};
use crate::models::{Levy, LevyAmount};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevyError {
    #[error("levy '{name}' has a negative rate {rate}")]
    NegativeRate { name: String, rate: Decimal },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevyOutcome {
    pub primary_tax: Decimal,
    /// One entry per levy, in declared order.
    pub levies: Vec<LevyAmount>,
    pub total_tax: Decimal,
}

impl LevyOutcome {
    pub fn levy_total(&self) -> Decimal {
        saturating_sum(self.levies.iter().map(|levy| levy.amount))
    }

    pub fn rounded(&self) -> Self {
        Self {
            primary_tax: round_half_up(self.primary_tax),
            levies: self
                .levies
                .iter()
                .map(|levy| LevyAmount {
                    amount: round_half_up(levy.amount),
                    ..levy.clone()
                })
                .collect(),
            total_tax: round_half_up(self.total_tax),
        }
    }
}

/// An ordered, validated list of levies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevyStack {
    levies: Vec<Levy>,
}

impl LevyStack {
    /// # Errors
    ///
    /// Returns [`LevyError::NegativeRate`] for the first levy with a rate
    /// below zero.
    pub fn new(levies: Vec<Levy>) -> Result<Self, LevyError> {
        if let Some(levy) = levies.iter().find(|levy| levy.rate < Decimal::ZERO) {
            return Err(LevyError::NegativeRate {
                name: levy.name.clone(),
                rate: levy.rate,
            });
        }
        Ok(Self { levies })
    }

    pub fn levies(&self) -> &[Levy] {
        &self.levies
    }

    pub fn is_empty(&self) -> bool {
        self.levies.is_empty()
    }

    /// Applies every levy to `primary_tax`, clamping a negative primary tax to
    /// zero first.
    pub fn apply(
        &self,
        primary_tax: Decimal,
    ) -> LevyOutcome {
        let primary_tax = non_negative(primary_tax);
        let levies: Vec<LevyAmount> = self
            .levies
            .iter()
            .map(|levy| LevyAmount {
                name: levy.name.clone(),
                rate: levy.rate,
                amount: primary_tax.saturating_mul(levy.rate),
            })
            .collect();
        let total_tax = primary_tax.saturating_add(saturating_sum(levies.iter().map(|levy| levy.amount)));

        LevyOutcome {
            primary_tax,
            levies,
            total_tax,
        }
    }
}

/// Validates `levies` and applies them to `primary_tax` in one step.
///
/// # Errors
///
/// Returns [`LevyError`] if any levy rate is negative.
pub fn apply_levies(
    primary_tax: Decimal,
    levies: &[Levy],
) -> Result<LevyOutcome, LevyError> {
    Ok(LevyStack::new(levies.to_vec())?.apply(primary_tax))
}
