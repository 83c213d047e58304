use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A stored income band.
///
/// `upper_bound` of `None` marks the unbounded top band. The
/// `subtraction_constant` is kept as stored; progressive tax is always
/// computed by marginal accumulation and never reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub lower_bound: Decimal,
    pub upper_bound: Option<Decimal>,
    pub marginal_rate: Decimal,
    pub subtraction_constant: Decimal,
}

impl Bracket {
    pub fn bounded(
        lower_bound: Decimal,
        upper_bound: Decimal,
        marginal_rate: Decimal,
    ) -> Self {
        Self {
            lower_bound,
            upper_bound: Some(upper_bound),
            marginal_rate,
            subtraction_constant: Decimal::ZERO,
        }
    }

    pub fn unbounded(
        lower_bound: Decimal,
        marginal_rate: Decimal,
    ) -> Self {
        Self {
            lower_bound,
            upper_bound: None,
            marginal_rate,
            subtraction_constant: Decimal::ZERO,
        }
    }

    pub fn with_subtraction_constant(
        mut self,
        constant: Decimal,
    ) -> Self {
        self.subtraction_constant = constant;
        self
    }
}
