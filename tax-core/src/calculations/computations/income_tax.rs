//! Individual income tax and PAYE.
//!
//! Both reduce gross figures to a taxable income, tax it progressively on a
//! bracket schedule and add the secondary levies.
//!
//! | Computation | Taxable income | Primary tax |
//! |-------------|----------------|-------------|
//! | Individual  | income − exempt income − deductions | progressive |
//! | PAYE        | earnings + benefits − exemptions − contributions − deductions | progressive − credits |
//!
//! Taxable income and primary tax are never negative.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{breakdown, finish};
use crate::calculations::common::{non_negative, saturating_sum};
use crate::calculations::{BracketTable, ProgressiveTaxCalculator};
use crate::models::{LiabilityResult, LooseAmount};
use crate::tables::{TablesError, TaxTables};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndividualIncomeInput {
    pub income: LooseAmount,
    pub exempt_income: LooseAmount,
    pub deductions: LooseAmount,
}

/// Monthly PAYE figures for one employee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PayeInput {
    pub current_salary: LooseAmount,
    pub current_bonus: LooseAmount,
    pub irregular_commission: LooseAmount,
    pub other_irregular_earnings: LooseAmount,
    pub housing_benefit: LooseAmount,
    pub vehicle_benefit: LooseAmount,
    pub education_benefit: LooseAmount,
    pub exemptions: LooseAmount,
    pub non_taxable_earnings: LooseAmount,
    pub pension_contributions: LooseAmount,
    pub nssa_contributions: LooseAmount,
    pub total_deductions: LooseAmount,
    pub medical_contributions: LooseAmount,
    pub medical_expenses: LooseAmount,
    /// Tax credits, subtracted from the progressive tax.
    pub credits: LooseAmount,
}

impl PayeInput {
    /// Earnings plus taxable benefits.
    pub fn total_income(&self) -> Decimal {
        saturating_sum(
            [
                self.current_salary,
                self.current_bonus,
                self.irregular_commission,
                self.other_irregular_earnings,
                self.housing_benefit,
                self.vehicle_benefit,
                self.education_benefit,
            ]
            .map(LooseAmount::value),
        )
    }

    /// Everything subtracted from total income.
    pub fn total_reductions(&self) -> Decimal {
        saturating_sum(
            [
                self.exemptions,
                self.non_taxable_earnings,
                self.pension_contributions,
                self.nssa_contributions,
                self.total_deductions,
                self.medical_contributions,
                self.medical_expenses,
            ]
            .map(LooseAmount::value),
        )
    }
}

/// Progressive income taxes on one bracket schedule.
pub struct IncomeTaxCalculator<'a> {
    tables: &'a TaxTables,
    schedule: &'a BracketTable,
}

impl<'a> IncomeTaxCalculator<'a> {
    /// Uses the configured default schedule.
    ///
    /// # Errors
    ///
    /// Returns [`TablesError::MissingSchedule`] if the snapshot lacks it.
    pub fn new(tables: &'a TaxTables) -> Result<Self, TablesError> {
        Ok(Self {
            tables,
            schedule: tables.default_schedule()?,
        })
    }

    /// Uses the schedule called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TablesError::MissingSchedule`] if the snapshot lacks it.
    pub fn with_schedule(
        tables: &'a TaxTables,
        name: &str,
    ) -> Result<Self, TablesError> {
        Ok(Self {
            tables,
            schedule: tables.schedule(name)?,
        })
    }

    pub fn individual(
        &self,
        input: &IndividualIncomeInput,
    ) -> LiabilityResult {
        let income = input.income.value();
        let exempt_income = input.exempt_income.value();
        let deductions = input.deductions.value();
        let taxable_income = non_negative(income.saturating_sub(exempt_income).saturating_sub(deductions));

        let progressive_tax = ProgressiveTaxCalculator::new(self.schedule).compute(taxable_income);

        finish(
            self.tables.levies(),
            taxable_income,
            progressive_tax,
            breakdown([
                ("gross_income", income),
                ("exempt_income", exempt_income),
                ("deductions", deductions),
                ("taxable_income", taxable_income),
                ("progressive_tax", progressive_tax),
            ]),
        )
    }

    pub fn paye(
        &self,
        input: &PayeInput,
    ) -> LiabilityResult {
        let total_income = input.total_income();
        let total_reductions = input.total_reductions();
        let taxable_income = non_negative(total_income.saturating_sub(total_reductions));

        let progressive_tax = ProgressiveTaxCalculator::new(self.schedule).compute(taxable_income);
        let credits = input.credits.value();
        let primary_tax = non_negative(progressive_tax.saturating_sub(credits));

        finish(
            self.tables.levies(),
            taxable_income,
            primary_tax,
            breakdown([
                ("total_income", total_income),
                ("total_reductions", total_reductions),
                ("taxable_income", taxable_income),
                ("progressive_tax", progressive_tax),
                ("credits", credits),
            ]),
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::tables::test_support::seeded_tables;

    // =========================================================================
    // individual income tax tests
    // =========================================================================

    #[test]
    fn individual_income_in_third_band() {
        let tables = seeded_tables();
        let calc = IncomeTaxCalculator::new(&tables).unwrap();

        let result = calc.individual(&IndividualIncomeInput {
            income: dec!(1000).into(),
            exempt_income: dec!(100).into(),
            deductions: dec!(100).into(),
        });

        // 200 × 0.20 + 500 × 0.25
        assert_eq!(result.base_amount, dec!(800));
        assert_eq!(result.primary_tax, dec!(165));
        assert_eq!(result.secondary_levies[0].amount, dec!(4.95));
        assert_eq!(result.total_tax, dec!(169.95));
        assert_eq!(result.breakdown["gross_income"], dec!(1000));
    }

    #[test]
    fn individual_income_below_threshold_owes_nothing() {
        let tables = seeded_tables();
        let calc = IncomeTaxCalculator::new(&tables).unwrap();

        let result = calc.individual(&IndividualIncomeInput {
            income: dec!(90).into(),
            ..IndividualIncomeInput::default()
        });

        assert_eq!(result.total_tax, dec!(0));
    }

    #[test]
    fn deductions_above_income_clamp_to_zero() {
        let tables = seeded_tables();
        let calc = IncomeTaxCalculator::new(&tables).unwrap();

        let result = calc.individual(&IndividualIncomeInput {
            income: dec!(500).into(),
            exempt_income: dec!(0).into(),
            deductions: dec!(900).into(),
        });

        assert_eq!(result.base_amount, dec!(0));
        assert_eq!(result.total_tax, dec!(0));
    }

    #[test]
    fn unknown_schedule_is_an_error() {
        let tables = seeded_tables();

        assert!(matches!(
            IncomeTaxCalculator::with_schedule(&tables, "ANNUAL"),
            Err(TablesError::MissingSchedule(name)) if name == "ANNUAL"
        ));
    }

    #[test]
    fn individual_input_accepts_loose_json() {
        let input: IndividualIncomeInput =
            serde_json::from_str(r#"{"income": "2500", "exemptIncome": null, "deductions": "n/a"}"#).unwrap();

        assert_eq!(input.income.value(), dec!(2500));
        assert_eq!(input.exempt_income.value(), dec!(0));
        assert_eq!(input.deductions.value(), dec!(0));
    }

    // =========================================================================
    // PAYE tests
    // =========================================================================

    fn sample_paye() -> PayeInput {
        PayeInput {
            current_salary: dec!(2000).into(),
            current_bonus: dec!(300).into(),
            housing_benefit: dec!(150).into(),
            vehicle_benefit: dec!(50).into(),
            pension_contributions: dec!(100).into(),
            nssa_contributions: dec!(50).into(),
            medical_expenses: dec!(100).into(),
            ..PayeInput::default()
        }
    }

    #[test]
    fn paye_totals_income_and_reductions() {
        let input = sample_paye();

        assert_eq!(input.total_income(), dec!(2500));
        assert_eq!(input.total_reductions(), dec!(250));
    }

    #[test]
    fn paye_taxes_progressively_then_levies() {
        let tables = seeded_tables();
        let calc = IncomeTaxCalculator::new(&tables).unwrap();

        let result = calc.paye(&sample_paye());

        // 2250 × 0.35 − 185
        assert_eq!(result.base_amount, dec!(2250));
        assert_eq!(result.primary_tax, dec!(602.5));
        assert_eq!(result.total_tax, dec!(620.575));
        assert_eq!(result.rounded().total_tax, dec!(620.58));
    }

    #[test]
    fn paye_credits_reduce_primary_before_levies() {
        let tables = seeded_tables();
        let calc = IncomeTaxCalculator::new(&tables).unwrap();

        let result = calc.paye(&PayeInput {
            credits: dec!(102.5).into(),
            ..sample_paye()
        });

        assert_eq!(result.primary_tax, dec!(500));
        assert_eq!(result.secondary_levies[0].amount, dec!(15));
        assert_eq!(result.total_tax, dec!(515));
        assert_eq!(result.breakdown["progressive_tax"], dec!(602.5));
    }

    #[test]
    fn paye_credits_never_make_tax_negative() {
        let tables = seeded_tables();
        let calc = IncomeTaxCalculator::new(&tables).unwrap();

        let result = calc.paye(&PayeInput {
            credits: dec!(10000).into(),
            ..sample_paye()
        });

        assert_eq!(result.primary_tax, dec!(0));
        assert_eq!(result.total_tax, dec!(0));
    }

    #[test]
    fn paye_with_out_of_range_figures_saturates() {
        let tables = seeded_tables();
        let calc = IncomeTaxCalculator::new(&tables).unwrap();
        let input: PayeInput = serde_json::from_str(
            r#"{"currentSalary": 1e29, "currentBonus": "79228162514264337593543950335", "exemptions": "-1e29"}"#,
        )
        .unwrap();

        let result = calc.paye(&input);

        assert_eq!(input.total_income(), Decimal::MAX);
        assert_eq!(input.total_reductions(), Decimal::MIN);
        assert_eq!(result.base_amount, Decimal::MAX);
        assert!(result.primary_tax > Decimal::ZERO);
        assert!(result.total_tax >= result.primary_tax);
    }
}
