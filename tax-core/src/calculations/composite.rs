//! Reduction of income, expense and adjustment buckets to a taxable base.
//!
//! # Steps
//!
//! | Step | Aggregate | Computation |
//! |------|-----------|-------------|
//! | 1    | `income` | Σ additive income |
//! | 2a   | `gross_profit` | income − Σ cost of sales |
//! | 2b   | `operating_profit` | gross profit − Σ operating expenses |
//! | 3    | | − Σ non-taxable income |
//! | 4    | | + Σ non-deductible expenses |
//! | 4a   | | + Σ tax income (recoupments) |
//! | 4b   | | − Σ tax expenditure |
//! | 5    | `unclamped_base` | − Σ capital allowances |
//! | 6    | `taxable_base` | max(0, unclamped base) |
//!
//! All aggregates are kept at full precision and saturate at the bounds of
//! [`Decimal`], so aggregation never fails. [`CompositeBreakdown::rounded`]
//! gives the two-decimal presentation copy.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::Bucket;
//! use tax_core::calculations::{CompositeAggregator, CompositeInput};
//!
//! let input = CompositeInput {
//!     income: Bucket::new().with("sales", dec!(1000)),
//!     cost_of_sales: Bucket::new().with("costOfGoodsSold", dec!(400)),
//!     non_taxable_income: Bucket::new().with("x", dec!(50)),
//!     non_deductible_expenses: Bucket::new().with("y", dec!(20)),
//!     capital_allowances: Bucket::new().with("z", dec!(30)),
//!     ..CompositeInput::default()
//! };
//!
//! let outcome = CompositeAggregator::aggregate(&input);
//! assert_eq!(outcome.taxable_base, dec!(540));
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::Bucket;

/// Buckets fed to the aggregator. Empty buckets contribute zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeInput {
    pub income: Bucket,
    pub cost_of_sales: Bucket,
    pub operating_expenses: Bucket,
    pub non_taxable_income: Bucket,
    pub non_deductible_expenses: Bucket,
    pub tax_income: Bucket,
    pub tax_expenditure: Bucket,
    pub capital_allowances: Bucket,
}

/// Every intermediate aggregate of one aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeBreakdown {
    pub income: Decimal,
    pub cost_of_sales: Decimal,
    pub gross_profit: Decimal,
    pub operating_expenses: Decimal,
    pub operating_profit: Decimal,
    pub non_taxable_income: Decimal,
    pub non_deductible_expenses: Decimal,
    pub tax_income: Decimal,
    pub tax_expenditure: Decimal,
    pub capital_allowances: Decimal,
    /// Base before clamping; negative when adjustments exceed profit.
    pub unclamped_base: Decimal,
    pub taxable_base: Decimal,
}

impl CompositeBreakdown {
    pub fn rounded(&self) -> Self {
        Self {
            income: round_half_up(self.income),
            cost_of_sales: round_half_up(self.cost_of_sales),
            gross_profit: round_half_up(self.gross_profit),
            operating_expenses: round_half_up(self.operating_expenses),
            operating_profit: round_half_up(self.operating_profit),
            non_taxable_income: round_half_up(self.non_taxable_income),
            non_deductible_expenses: round_half_up(self.non_deductible_expenses),
            tax_income: round_half_up(self.tax_income),
            tax_expenditure: round_half_up(self.tax_expenditure),
            capital_allowances: round_half_up(self.capital_allowances),
            unclamped_base: round_half_up(self.unclamped_base),
            taxable_base: round_half_up(self.taxable_base),
        }
    }

    /// The aggregates as an ordered name → value map, for merging into a
    /// [`LiabilityResult`](crate::LiabilityResult) breakdown.
    pub fn to_map(&self) -> BTreeMap<String, Decimal> {
        [
            ("income", self.income),
            ("cost_of_sales", self.cost_of_sales),
            ("gross_profit", self.gross_profit),
            ("operating_expenses", self.operating_expenses),
            ("operating_profit", self.operating_profit),
            ("non_taxable_income", self.non_taxable_income),
            ("non_deductible_expenses", self.non_deductible_expenses),
            ("tax_income", self.tax_income),
            ("tax_expenditure", self.tax_expenditure),
            ("capital_allowances", self.capital_allowances),
            ("unclamped_base", self.unclamped_base),
            ("taxable_base", self.taxable_base),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeOutcome {
    pub taxable_base: Decimal,
    pub breakdown: CompositeBreakdown,
}

pub struct CompositeAggregator;

impl CompositeAggregator {
    pub fn aggregate(input: &CompositeInput) -> CompositeOutcome {
        let income = input.income.total();
        let cost_of_sales = input.cost_of_sales.total();
        let gross_profit = income.saturating_sub(cost_of_sales);

        let operating_expenses = input.operating_expenses.total();
        let operating_profit = gross_profit.saturating_sub(operating_expenses);

        let non_taxable_income = input.non_taxable_income.total();
        let non_deductible_expenses = input.non_deductible_expenses.total();
        let tax_income = input.tax_income.total();
        let tax_expenditure = input.tax_expenditure.total();
        let capital_allowances = input.capital_allowances.total();

        let unclamped_base = operating_profit
            .saturating_sub(non_taxable_income)
            .saturating_add(non_deductible_expenses)
            .saturating_add(tax_income)
            .saturating_sub(tax_expenditure)
            .saturating_sub(capital_allowances);
        let taxable_base = non_negative(unclamped_base);

        CompositeOutcome {
            taxable_base,
            breakdown: CompositeBreakdown {
                income,
                cost_of_sales,
                gross_profit,
                operating_expenses,
                operating_profit,
                non_taxable_income,
                non_deductible_expenses,
                tax_income,
                tax_expenditure,
                capital_allowances,
                unclamped_base,
                taxable_base,
            },
        }
    }
}
