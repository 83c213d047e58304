use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{round_half_up, saturating_sum};
use crate::models::LevyAmount;

/// Outcome of a liability computation.
///
/// Amounts are kept at full precision; call [`LiabilityResult::rounded`] for
/// the two-decimal presentation copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiabilityResult {
    /// Taxable base the primary tax was computed on.
    pub base_amount: Decimal,

    /// Tax before secondary levies.
    pub primary_tax: Decimal,

    /// Levies in declared order.
    pub secondary_levies: Vec<LevyAmount>,

    /// `primary_tax` plus every levy amount.
    pub total_tax: Decimal,

    /// Intermediate aggregates, keyed by name.
    pub breakdown: BTreeMap<String, Decimal>,
}

impl LiabilityResult {
    /// Total of the secondary levies.
    pub fn levy_total(&self) -> Decimal {
        saturating_sum(self.secondary_levies.iter().map(|levy| levy.amount))
    }

    /// Returns a copy with every monetary figure rounded half-up to two
    /// decimal places. Levy rates are left untouched.
    pub fn rounded(&self) -> Self {
        Self {
            base_amount: round_half_up(self.base_amount),
            primary_tax: round_half_up(self.primary_tax),
            secondary_levies: self
                .secondary_levies
                .iter()
                .map(|levy| LevyAmount {
                    name: levy.name.clone(),
                    rate: levy.rate,
                    amount: round_half_up(levy.amount),
                })
                .collect(),
            total_tax: round_half_up(self.total_tax),
            breakdown: self
                .breakdown
                .iter()
                .map(|(key, value)| (key.clone(), round_half_up(*value)))
                .collect(),
        }
    }
}
