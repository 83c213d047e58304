//! VAT, withholding and sector taxes.
//!
//! All of these are flat category taxes without secondary levies. Negative
//! amounts follow the snapshot's `flat.allow_refunds` policy.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::{FlatCategoryCalculator, FlatTaxResult};
use crate::models::{LooseAmount, TaxCategory};
use crate::tables::TaxTables;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownKind {
    kind: &'static str,
    value: String,
}

/// Payments subject to withholding tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithholdingKind {
    Royalties,
    Fees,
    Interest,
    Tenders,
}

impl WithholdingKind {
    pub fn category(self) -> TaxCategory {
        match self {
            Self::Royalties => TaxCategory::WithholdingRoyalties,
            Self::Fees => TaxCategory::WithholdingFees,
            Self::Interest => TaxCategory::WithholdingInterest,
            Self::Tenders => TaxCategory::WithholdingTenders,
        }
    }
}

impl FromStr for WithholdingKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "royalties" => Ok(Self::Royalties),
            "fees" => Ok(Self::Fees),
            "interest" => Ok(Self::Interest),
            "tenders" => Ok(Self::Tenders),
            _ => Err(UnknownKind {
                kind: "withholding kind",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for WithholdingKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.category().as_str())
    }
}

/// Sectors with their own flat tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    Agriculture,
    Insurance,
    Financial,
    Healthcare,
}

impl Sector {
    pub fn category(self) -> TaxCategory {
        match self {
            Self::Agriculture => TaxCategory::Agriculture,
            Self::Insurance => TaxCategory::Insurance,
            Self::Financial => TaxCategory::Financial,
            Self::Healthcare => TaxCategory::Healthcare,
        }
    }
}

impl FromStr for Sector {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "agriculture" => Ok(Self::Agriculture),
            "insurance" => Ok(Self::Insurance),
            "financial" => Ok(Self::Financial),
            "healthcare" => Ok(Self::Healthcare),
            _ => Err(UnknownKind {
                kind: "sector",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.category().as_str())
    }
}

/// Services bought from a non-resident supplier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportedServicesInput {
    /// Declared consideration.
    pub value: LooseAmount,
    /// Open market value of the service, when known.
    pub market_value: Option<LooseAmount>,
    /// The declared value already is the market value.
    pub is_market_value: bool,
}

impl ImportedServicesInput {
    /// The amount VAT is charged on: the declared value when it is the
    /// market value, otherwise the larger of the declared and market values.
    pub fn taxable_value(&self) -> Decimal {
        let value = self.value.value();
        if self.is_market_value {
            return value;
        }
        self.market_value
            .map_or(value, |market| value.max(market.value()))
    }
}

pub struct IndirectTaxCalculator<'a> {
    flat: FlatCategoryCalculator<'a>,
}

impl<'a> IndirectTaxCalculator<'a> {
    pub fn new(tables: &'a TaxTables) -> Self {
        Self {
            flat: FlatCategoryCalculator::new(tables.rates()).with_refunds(tables.config().flat.allow_refunds),
        }
    }

    /// VAT on a taxable supply.
    pub fn vat_on_supplies(
        &self,
        amount: Decimal,
    ) -> FlatTaxResult {
        self.flat.compute_detailed(amount, TaxCategory::Vat.as_str())
    }

    pub fn vat_on_imported_services(
        &self,
        input: &ImportedServicesInput,
    ) -> FlatTaxResult {
        self.flat
            .compute_detailed(input.taxable_value(), TaxCategory::Vat.as_str())
    }

    pub fn withholding(
        &self,
        kind: WithholdingKind,
        value: Decimal,
    ) -> FlatTaxResult {
        self.flat.compute_detailed(value, kind.category().as_str())
    }

    pub fn sector(
        &self,
        sector: Sector,
        value: Decimal,
    ) -> FlatTaxResult {
        self.flat.compute_detailed(value, sector.category().as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::RateSource;
    use crate::config::EngineConfig;
    use crate::tables::test_support::{paye_brackets, seeded_rates};

    fn tables(allow_refunds: bool) -> TaxTables {
        let mut config = EngineConfig::default();
        config.flat.allow_refunds = allow_refunds;
        TaxTables::from_parts(
            &seeded_rates(),
            BTreeMap::from([("PAYE".to_string(), paye_brackets())]),
            config,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
        .unwrap()
    }

    // =========================================================================
    // VAT tests
    // =========================================================================

    #[test]
    fn vat_on_supplies_uses_vat_rate() {
        let tables = tables(false);
        let result = IndirectTaxCalculator::new(&tables).vat_on_supplies(dec!(1000));

        assert_eq!(result.tax, dec!(150));
        assert_eq!(result.rate.source, RateSource::Table);
    }

    #[test]
    fn negative_supply_is_clamped_unless_refunds_allowed() {
        assert_eq!(
            IndirectTaxCalculator::new(&tables(false))
                .vat_on_supplies(dec!(-50))
                .tax,
            dec!(0)
        );
        assert_eq!(
            IndirectTaxCalculator::new(&tables(true))
                .vat_on_supplies(dec!(-50))
                .tax,
            dec!(-7.5)
        );
    }

    #[test]
    fn imported_services_use_higher_market_value() {
        let tables = tables(false);
        let calc = IndirectTaxCalculator::new(&tables);

        let input = ImportedServicesInput {
            value: dec!(800).into(),
            market_value: Some(dec!(1000).into()),
            is_market_value: false,
        };

        assert_eq!(input.taxable_value(), dec!(1000));
        assert_eq!(calc.vat_on_imported_services(&input).tax, dec!(150));
    }

    #[test]
    fn imported_services_declared_at_market_value() {
        let input = ImportedServicesInput {
            value: dec!(800).into(),
            market_value: Some(dec!(1000).into()),
            is_market_value: true,
        };

        assert_eq!(input.taxable_value(), dec!(800));
    }

    #[test]
    fn imported_services_without_market_value() {
        let input: ImportedServicesInput = serde_json::from_str(r#"{"value": "640"}"#).unwrap();

        assert_eq!(input.taxable_value(), dec!(640));
    }

    // =========================================================================
    // withholding and sector tests
    // =========================================================================

    #[test]
    fn withholding_rates_by_kind() {
        let tables = tables(false);
        let calc = IndirectTaxCalculator::new(&tables);

        assert_eq!(calc.withholding(WithholdingKind::Royalties, dec!(1000)).tax, dec!(150));
        assert_eq!(calc.withholding(WithholdingKind::Fees, dec!(1000)).tax, dec!(200));
        assert_eq!(calc.withholding(WithholdingKind::Interest, dec!(1000)).tax, dec!(100));
        assert_eq!(calc.withholding(WithholdingKind::Tenders, dec!(1000)).tax, dec!(300));
    }

    #[test]
    fn sector_rates_by_sector() {
        let tables = tables(false);
        let calc = IndirectTaxCalculator::new(&tables);

        assert_eq!(calc.sector(Sector::Agriculture, dec!(1000)).tax, dec!(100));
        assert_eq!(calc.sector(Sector::Insurance, dec!(1000)).tax, dec!(50));
        assert_eq!(calc.sector(Sector::Financial, dec!(1000)).tax, dec!(30));
        assert_eq!(calc.sector(Sector::Healthcare, dec!(1000)).tax, dec!(200));
    }

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("Royalties".parse::<WithholdingKind>(), Ok(WithholdingKind::Royalties));
        assert_eq!("HEALTHCARE".parse::<Sector>(), Ok(Sector::Healthcare));
        assert!("mining".parse::<Sector>().is_err());
        assert_eq!(WithholdingKind::Fees.to_string(), "Withholding_Fees");
    }
}
