//! Flat categorical tax: `amount × rate(category)`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{non_negative, round_half_up};
use crate::calculations::rate_resolver::{RateResolver, ResolvedRate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatTaxResult {
    pub category: String,
    /// Amount the rate was applied to, after clamping.
    pub base_amount: Decimal,
    pub rate: ResolvedRate,
    pub tax: Decimal,
}

impl FlatTaxResult {
    /// Copy with the amounts rounded half-up to cents.
    pub fn rounded(&self) -> Self {
        Self {
            category: self.category.clone(),
            base_amount: round_half_up(self.base_amount),
            rate: self.rate,
            tax: round_half_up(self.tax),
        }
    }
}

/// Applies resolved category rates to amounts.
pub struct FlatCategoryCalculator<'a> {
    resolver: &'a RateResolver,
    allow_refunds: bool,
}

impl<'a> FlatCategoryCalculator<'a> {
    /// A calculator that clamps negative amounts to zero.
    pub fn new(resolver: &'a RateResolver) -> Self {
        Self {
            resolver,
            allow_refunds: false,
        }
    }

    /// Lets negative amounts through, producing a negative (refund) tax.
    pub fn with_refunds(
        mut self,
        allow_refunds: bool,
    ) -> Self {
        self.allow_refunds = allow_refunds;
        self
    }

    pub fn compute(
        &self,
        amount: Decimal,
        category: &str,
    ) -> Decimal {
        self.compute_detailed(amount, category).tax
    }

    pub fn compute_detailed(
        &self,
        amount: Decimal,
        category: &str,
    ) -> FlatTaxResult {
        let base_amount = if self.allow_refunds {
            amount
        } else {
            non_negative(amount)
        };
        let rate = self.resolver.resolve(category);

        FlatTaxResult {
            category: category.to_string(),
            base_amount,
            rate,
            tax: base_amount * rate.rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::rate_resolver::RateSource;
    use crate::config::RateFallbacks;
    use crate::models::RateEntry;

    fn resolver() -> RateResolver {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let entries = vec![
            RateEntry {
                category: "VAT".to_string(),
                rate: dec!(0.15),
                effective_date: date,
            },
            RateEntry {
                category: "Withholding_Fees".to_string(),
                rate: dec!(0.20),
                effective_date: date,
            },
        ];
        RateResolver::new(&entries, date, RateFallbacks::default()).unwrap()
    }

    #[test]
    fn multiplies_amount_by_category_rate() {
        let resolver = resolver();
        let calc = FlatCategoryCalculator::new(&resolver);

        assert_eq!(calc.compute(dec!(1000), "VAT"), dec!(150));
        assert_eq!(calc.compute(dec!(2500), "Withholding_Fees"), dec!(500));
    }

    #[test]
    fn negative_amount_is_clamped() {
        let resolver = resolver();
        let calc = FlatCategoryCalculator::new(&resolver);

        assert_eq!(calc.compute(dec!(-50), "VAT"), dec!(0));
    }

    #[test]
    fn refunds_pass_negative_amounts_through() {
        let resolver = resolver();
        let calc = FlatCategoryCalculator::new(&resolver).with_refunds(true);

        assert_eq!(calc.compute(dec!(-50), "VAT"), dec!(-7.5));
    }

    #[test]
    fn unknown_category_uses_default_rate() {
        let resolver = resolver();
        let result = FlatCategoryCalculator::new(&resolver).compute_detailed(dec!(1000), "Stamp_Duty");

        assert_eq!(result.tax, dec!(0));
        assert_eq!(result.rate.source, RateSource::Default);
        assert!(result.rate.is_unknown());
    }

    #[test]
    fn detailed_reports_base_and_rate() {
        let resolver = resolver();
        let result = FlatCategoryCalculator::new(&resolver).compute_detailed(dec!(200), "VAT");

        assert_eq!(
            result,
            FlatTaxResult {
                category: "VAT".to_string(),
                base_amount: dec!(200),
                rate: ResolvedRate {
                    rate: dec!(0.15),
                    source: RateSource::Table,
                },
                tax: dec!(30),
            }
        );
    }
}
