use serde::{Deserialize, Serialize};

use crate::calculations::composite::CompositeInput;
use crate::models::{Bucket, LooseAmount};

/// Profit and loss section of a comprehensive corporate submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfitAndLoss {
    pub sales: LooseAmount,
    pub other_trading_income: LooseAmount,
    pub cost_of_goods_sold: LooseAmount,
    pub operating_expenses: Bucket,
    pub advertising_marketing: LooseAmount,
    pub training_event: LooseAmount,
    pub bank_charges: LooseAmount,
    pub imtt: LooseAmount,
    pub salaries: LooseAmount,
}

/// Tax adjustments applied to the accounting profit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxAdjustments {
    pub non_taxable_income: Bucket,
    pub non_deductible_expenses: Bucket,
    pub tax_income: Bucket,
    pub tax_expenditure: Bucket,
}

/// A comprehensive corporate submission as sent by the input forms.
///
/// Every section and field is optional; absent or non-numeric figures are
/// read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompositeRequest {
    pub profit_loss: ProfitAndLoss,
    pub tax_computation: TaxAdjustments,
    pub capital_allowance: Bucket,
}

impl CompositeRequest {
    /// Sorts the submission into aggregation buckets.
    ///
    /// The named expense fields (`advertisingMarketing`, `bankCharges`, ...)
    /// join the free-form operating expenses under their own labels.
    pub fn into_input(self) -> CompositeInput {
        let pl = self.profit_loss;

        let income = Bucket::new()
            .with("sales", pl.sales.value())
            .with("otherTradingIncome", pl.other_trading_income.value());

        let cost_of_sales = Bucket::new().with("costOfGoodsSold", pl.cost_of_goods_sold.value());

        let mut operating_expenses = pl.operating_expenses;
        for (label, amount) in [
            ("advertisingMarketing", pl.advertising_marketing),
            ("trainingEvent", pl.training_event),
            ("bankCharges", pl.bank_charges),
            ("imtt", pl.imtt),
            ("salaries", pl.salaries),
        ] {
            if !amount.value().is_zero() {
                operating_expenses.add(label, amount.value());
            }
        }

        CompositeInput {
            income,
            cost_of_sales,
            operating_expenses,
            non_taxable_income: self.tax_computation.non_taxable_income,
            non_deductible_expenses: self.tax_computation.non_deductible_expenses,
            tax_income: self.tax_computation.tax_income,
            tax_expenditure: self.tax_computation.tax_expenditure,
            capital_allowances: self.capital_allowance,
        }
    }
}
