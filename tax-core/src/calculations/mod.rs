//! Tax calculation modules.
//!
//! The rate models ([`RateResolver`], [`BracketTable`] with
//! [`ProgressiveTaxCalculator`], [`FlatCategoryCalculator`]), the
//! [`LevyStack`] and the [`CompositeAggregator`] are pure and independent of
//! each other. [`computations`] combines them into the concrete liabilities.

pub mod bracket_table;
pub mod common;
pub mod composite;
pub mod computations;
pub mod flat;
pub mod levy_stack;
pub mod progressive;
pub mod rate_resolver;

pub use bracket_table::{BracketTable, BracketTableError, TaxBand};
pub use composite::{CompositeAggregator, CompositeBreakdown, CompositeInput, CompositeOutcome};
pub use flat::{FlatCategoryCalculator, FlatTaxResult};
pub use levy_stack::{LevyError, LevyOutcome, LevyStack, apply_levies};
pub use progressive::{BandPortion, ConstantDiscrepancy, ProgressiveTaxCalculator, ProgressiveTaxResult};
pub use rate_resolver::{RateResolver, RateSource, RateTableError, ResolvedRate};
