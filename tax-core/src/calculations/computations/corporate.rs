//! Corporate income tax.
//!
//! Two forms share the flat `Corporate_Income` rate and the levy stack:
//!
//! * the simple form adjusts a single profit figure:
//!   `max(0, profits − (deductions − non-deductible) + recoupments)`;
//! * the comprehensive form reduces a full profit and loss statement with the
//!   [`CompositeAggregator`] and merges its breakdown into the result.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{breakdown, finish};
use crate::calculations::common::non_negative;
use crate::calculations::{CompositeAggregator, CompositeInput, FlatCategoryCalculator};
use crate::models::{LiabilityResult, LooseAmount, TaxCategory};
use crate::tables::TaxTables;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorporateIncomeInput {
    pub profits: LooseAmount,
    pub deductions: LooseAmount,
    /// Expenses booked as deductions that the law disallows (fines, private
    /// expenses). Added back.
    pub non_deductible: LooseAmount,
    /// Allowances recovered on disposal. Added back.
    pub recoupments: LooseAmount,
}

pub struct CorporateTaxCalculator<'a> {
    tables: &'a TaxTables,
}

impl<'a> CorporateTaxCalculator<'a> {
    pub fn new(tables: &'a TaxTables) -> Self {
        Self { tables }
    }

    pub fn simple(
        &self,
        input: &CorporateIncomeInput,
    ) -> LiabilityResult {
        let profits = input.profits.value();
        let deductions = input.deductions.value();
        let non_deductible = input.non_deductible.value();
        let recoupments = input.recoupments.value();

        let taxable_income = non_negative(
            profits
                .saturating_sub(deductions.saturating_sub(non_deductible))
                .saturating_add(recoupments),
        );
        let flat = self.flat().compute_detailed(taxable_income, TaxCategory::CorporateIncome.as_str());

        finish(
            self.tables.levies(),
            taxable_income,
            flat.tax,
            breakdown([
                ("profits", profits),
                ("deductions", deductions),
                ("non_deductible", non_deductible),
                ("recoupments", recoupments),
                ("taxable_income", taxable_income),
                ("rate", flat.rate.rate),
            ]),
        )
    }

    pub fn comprehensive(
        &self,
        input: &CompositeInput,
    ) -> LiabilityResult {
        let outcome = CompositeAggregator::aggregate(input);
        let flat = self
            .flat()
            .compute_detailed(outcome.taxable_base, TaxCategory::CorporateIncome.as_str());

        let mut details = outcome.breakdown.to_map();
        details.insert("rate".to_string(), flat.rate.rate);

        finish(self.tables.levies(), outcome.taxable_base, flat.tax, details)
    }

    /// The rate applied to corporate income under the current snapshot.
    pub fn rate(&self) -> Decimal {
        self.tables.rates().rate(TaxCategory::CorporateIncome.as_str())
    }

    fn flat(&self) -> FlatCategoryCalculator<'a> {
        // Taxable income is clamped before it reaches the flat calculator.
        FlatCategoryCalculator::new(self.tables.rates())
    }
}
