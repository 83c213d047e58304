//! Progressive (graduated) tax by marginal accumulation.
//!
//! Each band taxes only the part of the base that falls inside it:
//!
//! ```text
//! tax = Σ rate_i × (min(base, upper_i) − lower_i)   for every band with base > lower_i
//! ```
//!
//! Stored subtraction constants are never used to compute tax. They can be
//! checked against the marginal result with
//! [`ProgressiveTaxCalculator::subtraction_constant_discrepancies`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::bracket_table::BracketTable;
use crate::calculations::common::round_half_up;

/// Tax attributed to a single band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandPortion {
    pub lower: Decimal,
    pub upper: Option<Decimal>,
    pub marginal_rate: Decimal,
    /// Part of the base taxed in this band.
    pub taxed_amount: Decimal,
    pub tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressiveTaxResult {
    pub taxable_base: Decimal,
    pub tax: Decimal,
    /// Rate of the highest band the base reaches; zero below the threshold.
    pub marginal_rate: Decimal,
    /// Only the bands that taxed something.
    pub bands: Vec<BandPortion>,
}

impl ProgressiveTaxResult {
    /// `tax / taxable_base`, or zero for a zero base.
    pub fn effective_rate(&self) -> Decimal {
        if self.taxable_base <= Decimal::ZERO {
            Decimal::ZERO
        } else {
            self.tax / self.taxable_base
        }
    }

    /// Copy with every amount rounded half-up to cents. Rates and band
    /// bounds are left as stored.
    pub fn rounded(&self) -> Self {
        Self {
            taxable_base: round_half_up(self.taxable_base),
            tax: round_half_up(self.tax),
            marginal_rate: self.marginal_rate,
            bands: self
                .bands
                .iter()
                .map(|band| BandPortion {
                    taxed_amount: round_half_up(band.taxed_amount),
                    tax: round_half_up(band.tax),
                    ..band.clone()
                })
                .collect(),
        }
    }
}

/// A stored subtraction constant that disagrees with marginal accumulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantDiscrepancy {
    /// Effective lower bound of the band.
    pub lower: Decimal,
    pub stored: Decimal,
    /// `lower × rate − tax(lower)`, rounded to cents.
    pub expected: Decimal,
}

pub struct ProgressiveTaxCalculator<'a> {
    table: &'a BracketTable,
}

impl<'a> ProgressiveTaxCalculator<'a> {
    pub fn new(table: &'a BracketTable) -> Self {
        Self { table }
    }

    /// Tax on `base` at full precision. Zero for a base at or below zero.
    pub fn compute(
        &self,
        base: Decimal,
    ) -> Decimal {
        self.portions(base).iter().map(|portion| portion.tax).sum()
    }

    pub fn compute_detailed(
        &self,
        base: Decimal,
    ) -> ProgressiveTaxResult {
        let bands = self.portions(base);
        let tax = bands.iter().map(|portion| portion.tax).sum();
        let marginal_rate = bands
            .last()
            .map_or(Decimal::ZERO, |portion| portion.marginal_rate);

        ProgressiveTaxResult {
            taxable_base: base.max(Decimal::ZERO),
            tax,
            marginal_rate,
            bands,
        }
    }

    /// Compares every stored subtraction constant with the value implied by
    /// marginal accumulation. A correct constant `c` for a band satisfies
    /// `base × rate − c == tax(base)` for every base in the band.
    ///
    /// Constants are compared at cent precision. An empty result means the
    /// stored constants agree with the marginal computation.
    pub fn subtraction_constant_discrepancies(&self) -> Vec<ConstantDiscrepancy> {
        self.table
            .bands()
            .iter()
            .filter_map(|band| {
                let expected = round_half_up(band.lower * band.marginal_rate - self.compute(band.lower));
                let stored = band.source.subtraction_constant;
                (round_half_up(stored) != expected).then(|| ConstantDiscrepancy {
                    lower: band.lower,
                    stored,
                    expected,
                })
            })
            .collect()
    }

    fn portions(
        &self,
        base: Decimal,
    ) -> Vec<BandPortion> {
        let mut portions = Vec::new();
        if base <= Decimal::ZERO {
            return portions;
        }

        for band in self.table.bands() {
            if base <= band.lower {
                break;
            }
            let top = band.upper.map_or(base, |upper| base.min(upper));
            let taxed_amount = top - band.lower;
            if taxed_amount <= Decimal::ZERO {
                continue;
            }
            portions.push(BandPortion {
                lower: band.lower,
                upper: band.upper,
                marginal_rate: band.marginal_rate,
                taxed_amount,
                tax: taxed_amount * band.marginal_rate,
            });
        }

        portions
    }
}
