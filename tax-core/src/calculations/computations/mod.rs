//! Concrete liability computations built from the rate models.
//!
//! Each computation reads a [`TaxTables`](crate::TaxTables) snapshot and
//! loosely typed input figures (see [`LooseAmount`](crate::LooseAmount)).
//! Liabilities that carry the secondary levies are returned as a
//! [`LiabilityResult`]; the other computations return a small result type of
//! their own.

pub mod allowances;
pub mod corporate;
pub mod income_tax;
pub mod indirect;

use std::collections::BTreeMap;

use rust_decimal::Decimal;

pub use allowances::{
    AdjustedIncome, AllowanceCalculator, AllowanceError, CapitalAllowanceInput, CapitalAllowanceResult,
    IncomeAdjustmentInput, VatDefermentInput, VatDefermentResult,
};
pub use corporate::{CorporateIncomeInput, CorporateTaxCalculator};
pub use income_tax::{IncomeTaxCalculator, IndividualIncomeInput, PayeInput};
pub use indirect::{ImportedServicesInput, IndirectTaxCalculator, Sector, UnknownKind, WithholdingKind};

use crate::calculations::LevyStack;
use crate::models::LiabilityResult;

/// Applies `levies` to `primary_tax` and packages the result.
pub(crate) fn finish(
    levies: &LevyStack,
    base_amount: Decimal,
    primary_tax: Decimal,
    breakdown: BTreeMap<String, Decimal>,
) -> LiabilityResult {
    let outcome = levies.apply(primary_tax);
    LiabilityResult {
        base_amount,
        primary_tax: outcome.primary_tax,
        secondary_levies: outcome.levies,
        total_tax: outcome.total_tax,
        breakdown,
    }
}

/// Builds a breakdown map from name/value pairs.
pub(crate) fn breakdown<const N: usize>(items: [(&str, Decimal); N]) -> BTreeMap<String, Decimal> {
    items
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}
