//! Validated progressive bracket tables.
//!
//! A [`BracketTable`] is built from stored [`Bracket`] rows and refuses to
//! exist unless the rows form one contiguous, non-overlapping sequence that
//! ends in a single unbounded band. A malformed table is a configuration
//! problem, so it is reported when the table is built rather than when a tax
//! is computed.
//!
//! # Contiguity
//!
//! Stored tables often start each band one cent above the previous band's
//! upper bound (`0–100`, `100.01–300`, ...). A gap no wider than the
//! tolerance passed to [`BracketTable::new`] is closed: the band is taxed
//! from the previous upper bound, so no income falls between bands.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::is_fraction;
use crate::models::Bracket;

/// Reasons a set of brackets cannot form a table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BracketTableError {
    #[error("bracket table has no brackets")]
    Empty,

    #[error("bracket lower bound must be non-negative, got {0}")]
    NegativeLowerBound(Decimal),

    #[error("bracket starting at {lower} must end above its lower bound, got upper bound {upper}")]
    EmptyRange { lower: Decimal, upper: Decimal },

    #[error("marginal rate for bracket starting at {lower} must be between 0 and 1, got {rate}")]
    InvalidRate { lower: Decimal, rate: Decimal },

    #[error("bracket starting at {lower} overlaps the previous bracket ending at {previous_upper}")]
    Overlap {
        lower: Decimal,
        previous_upper: Decimal,
    },

    #[error("gap between {previous_upper} and {lower} exceeds the contiguity tolerance {tolerance}")]
    Gap {
        previous_upper: Decimal,
        lower: Decimal,
        tolerance: Decimal,
    },

    #[error("unbounded bracket starting at {0} is not the last bracket")]
    UnboundedNotLast(Decimal),

    #[error("last bracket must have no upper bound")]
    MissingUnboundedTail,
}

/// One band of a validated table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBand {
    /// Where income starts being taxed in this band. Equal to the previous
    /// band's upper bound, or the stored lower bound for the first band.
    pub lower: Decimal,

    /// `None` for the top band.
    pub upper: Option<Decimal>,

    pub marginal_rate: Decimal,

    /// The row as stored.
    pub source: Bracket,
}

/// An ordered, validated set of bands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketTable {
    bands: Vec<TaxBand>,
}

impl BracketTable {
    /// Validates and orders `brackets`.
    ///
    /// Rows may be supplied in any order; they are sorted by lower bound.
    /// A negative `tolerance` is treated as zero.
    ///
    /// # Errors
    ///
    /// Returns [`BracketTableError`] if the table is empty, a row has a
    /// negative lower bound, an empty range or a rate outside `[0, 1]`,
    /// rows overlap, a gap exceeds `tolerance`, or the table does not end in
    /// exactly one unbounded band.
    pub fn new(
        mut brackets: Vec<Bracket>,
        tolerance: Decimal,
    ) -> Result<Self, BracketTableError> {
        if brackets.is_empty() {
            return Err(BracketTableError::Empty);
        }
        let tolerance = tolerance.max(Decimal::ZERO);

        for bracket in &brackets {
            validate_row(bracket)?;
        }

        brackets.sort_by(|a, b| a.lower_bound.cmp(&b.lower_bound));

        let mut bands: Vec<TaxBand> = Vec::with_capacity(brackets.len());
        for bracket in brackets {
            let lower = match bands.last() {
                None => bracket.lower_bound,
                Some(previous) => {
                    let previous_upper = previous
                        .upper
                        .ok_or(BracketTableError::UnboundedNotLast(previous.lower))?;
                    if bracket.lower_bound < previous_upper {
                        return Err(BracketTableError::Overlap {
                            lower: bracket.lower_bound,
                            previous_upper,
                        });
                    }
                    if bracket.lower_bound - previous_upper > tolerance {
                        return Err(BracketTableError::Gap {
                            previous_upper,
                            lower: bracket.lower_bound,
                            tolerance,
                        });
                    }
                    previous_upper
                }
            };

            bands.push(TaxBand {
                lower,
                upper: bracket.upper_bound,
                marginal_rate: bracket.marginal_rate,
                source: bracket,
            });
        }

        if bands.last().is_some_and(|band| band.upper.is_some()) {
            return Err(BracketTableError::MissingUnboundedTail);
        }

        Ok(Self { bands })
    }

    /// Bands in ascending order. Never empty; the last band is unbounded.
    pub fn bands(&self) -> &[TaxBand] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Where taxation starts (the first band's lower bound).
    pub fn threshold(&self) -> Decimal {
        self.bands.first().map_or(Decimal::ZERO, |band| band.lower)
    }

    /// True when marginal rates never decrease from one band to the next.
    ///
    /// Not required for a valid table, but expected of real schedules.
    pub fn is_progressive(&self) -> bool {
        self.bands
            .windows(2)
            .all(|pair| pair[0].marginal_rate <= pair[1].marginal_rate)
    }

    /// The band containing `income`, treating each band as `(lower, upper]`.
    pub fn band_for(
        &self,
        income: Decimal,
    ) -> Option<&TaxBand> {
        if income <= self.threshold() {
            return self.bands.first();
        }
        self.bands
            .iter()
            .find(|band| income > band.lower && band.upper.is_none_or(|upper| income <= upper))
    }
}

fn validate_row(bracket: &Bracket) -> Result<(), BracketTableError> {
    if bracket.lower_bound < Decimal::ZERO {
        return Err(BracketTableError::NegativeLowerBound(bracket.lower_bound));
    }
    if let Some(upper) = bracket.upper_bound {
        if upper <= bracket.lower_bound {
            return Err(BracketTableError::EmptyRange {
                lower: bracket.lower_bound,
                upper,
            });
        }
    }
    if !is_fraction(bracket.marginal_rate) {
        return Err(BracketTableError::InvalidRate {
            lower: bracket.lower_bound,
            rate: bracket.marginal_rate,
        });
    }
    Ok(())
}
