//! The engine's public operations bound to one [`TaxTables`] snapshot.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use tax_core::config::EngineConfig;
//! use tax_core::{Bracket, Levy, RateEntry, TaxEngine, TaxTables};
//!
//! let as_of = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
//! let rates = vec![RateEntry {
//!     category: "VAT".to_string(),
//!     rate: dec!(0.15),
//!     effective_date: as_of,
//! }];
//! let paye = vec![
//!     Bracket::bounded(dec!(0), dec!(100), dec!(0)),
//!     Bracket::unbounded(dec!(100), dec!(0.2)),
//! ];
//! let tables = TaxTables::from_parts(
//!     &rates,
//!     BTreeMap::from([("PAYE".to_string(), paye)]),
//!     EngineConfig::default(),
//!     as_of,
//! )
//! .unwrap();
//! let engine = TaxEngine::new(&tables);
//!
//! assert_eq!(engine.compute_flat_tax(dec!(200), "VAT"), dec!(30));
//! assert_eq!(engine.compute_schedule_tax(dec!(600), "PAYE").unwrap(), dec!(100));
//! assert_eq!(
//!     engine.apply_levies(dec!(100), &[Levy::aids_levy()]).unwrap().total_tax,
//!     dec!(103)
//! );
//! ```

use rust_decimal::Decimal;

use crate::calculations::computations::{
    AdjustedIncome, AllowanceCalculator, AllowanceError, CapitalAllowanceInput, CapitalAllowanceResult,
    CorporateIncomeInput, CorporateTaxCalculator, ImportedServicesInput, IncomeAdjustmentInput,
    IncomeTaxCalculator, IndirectTaxCalculator, IndividualIncomeInput, PayeInput, Sector, VatDefermentInput,
    VatDefermentResult, WithholdingKind,
};
use crate::calculations::{
    BracketTable, CompositeAggregator, CompositeInput, CompositeOutcome, FlatCategoryCalculator,
    FlatTaxResult, LevyError, LevyOutcome, ProgressiveTaxCalculator, ProgressiveTaxResult, ResolvedRate,
    apply_levies,
};
use crate::models::{Levy, LiabilityResult};
use crate::tables::{TablesError, TaxTables};

/// Stateless view over a snapshot. Cheap to create; every method is pure.
#[derive(Debug, Clone, Copy)]
pub struct TaxEngine<'a> {
    tables: &'a TaxTables,
}

impl<'a> TaxEngine<'a> {
    pub fn new(tables: &'a TaxTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &'a TaxTables {
        self.tables
    }

    // --- Core operations ---

    pub fn resolve_rate(
        &self,
        category: &str,
    ) -> ResolvedRate {
        self.tables.rates().resolve(category)
    }

    pub fn compute_progressive_tax(
        &self,
        base: Decimal,
        table: &BracketTable,
    ) -> Decimal {
        ProgressiveTaxCalculator::new(table).compute(base)
    }

    /// Honors the snapshot's refund policy.
    pub fn compute_flat_tax(
        &self,
        amount: Decimal,
        category: &str,
    ) -> Decimal {
        self.flat().compute(amount, category)
    }

    /// Applies an explicit list of levies. Use [`TaxEngine::apply_snapshot_levies`]
    /// for the configured stack.
    pub fn apply_levies(
        &self,
        primary_tax: Decimal,
        levies: &[Levy],
    ) -> Result<LevyOutcome, LevyError> {
        apply_levies(primary_tax, levies)
    }

    pub fn aggregate_composite(
        &self,
        input: &CompositeInput,
    ) -> CompositeOutcome {
        CompositeAggregator::aggregate(input)
    }

    // --- Snapshot conveniences ---

    /// Progressive tax on the named schedule.
    pub fn compute_schedule_tax(
        &self,
        base: Decimal,
        schedule: &str,
    ) -> Result<Decimal, TablesError> {
        Ok(self.compute_progressive_tax(base, self.tables.schedule(schedule)?))
    }

    pub fn compute_schedule_tax_detailed(
        &self,
        base: Decimal,
        schedule: &str,
    ) -> Result<ProgressiveTaxResult, TablesError> {
        Ok(ProgressiveTaxCalculator::new(self.tables.schedule(schedule)?).compute_detailed(base))
    }

    pub fn compute_flat_tax_detailed(
        &self,
        amount: Decimal,
        category: &str,
    ) -> FlatTaxResult {
        self.flat().compute_detailed(amount, category)
    }

    pub fn apply_snapshot_levies(
        &self,
        primary_tax: Decimal,
    ) -> LevyOutcome {
        self.tables.levies().apply(primary_tax)
    }

    // --- Liability computations ---

    pub fn individual_income_tax(
        &self,
        input: &IndividualIncomeInput,
    ) -> Result<LiabilityResult, TablesError> {
        Ok(IncomeTaxCalculator::new(self.tables)?.individual(input))
    }

    pub fn paye(
        &self,
        input: &PayeInput,
    ) -> Result<LiabilityResult, TablesError> {
        Ok(IncomeTaxCalculator::new(self.tables)?.paye(input))
    }

    pub fn corporate_income_tax(
        &self,
        input: &CorporateIncomeInput,
    ) -> LiabilityResult {
        CorporateTaxCalculator::new(self.tables).simple(input)
    }

    pub fn comprehensive_corporate_tax(
        &self,
        input: &CompositeInput,
    ) -> LiabilityResult {
        CorporateTaxCalculator::new(self.tables).comprehensive(input)
    }

    pub fn vat_on_supplies(
        &self,
        amount: Decimal,
    ) -> FlatTaxResult {
        IndirectTaxCalculator::new(self.tables).vat_on_supplies(amount)
    }

    pub fn vat_on_imported_services(
        &self,
        input: &ImportedServicesInput,
    ) -> FlatTaxResult {
        IndirectTaxCalculator::new(self.tables).vat_on_imported_services(input)
    }

    pub fn withholding_tax(
        &self,
        kind: WithholdingKind,
        value: Decimal,
    ) -> FlatTaxResult {
        IndirectTaxCalculator::new(self.tables).withholding(kind, value)
    }

    pub fn sector_tax(
        &self,
        sector: Sector,
        value: Decimal,
    ) -> FlatTaxResult {
        IndirectTaxCalculator::new(self.tables).sector(sector, value)
    }

    pub fn capital_allowances(
        &self,
        input: &CapitalAllowanceInput,
    ) -> Result<CapitalAllowanceResult, AllowanceError> {
        self.allowances().capital_allowances(input)
    }

    /// Reliefs and credits share one computation.
    pub fn adjust_income(
        &self,
        input: &IncomeAdjustmentInput,
    ) -> AdjustedIncome {
        self.allowances().adjust_income(input)
    }

    pub fn vat_deferment(
        &self,
        input: &VatDefermentInput,
    ) -> Result<VatDefermentResult, AllowanceError> {
        self.allowances().vat_deferment(input)
    }

    fn flat(&self) -> FlatCategoryCalculator<'a> {
        FlatCategoryCalculator::new(self.tables.rates()).with_refunds(self.tables.config().flat.allow_refunds)
    }

    fn allowances(&self) -> AllowanceCalculator<'a> {
        AllowanceCalculator::new(&self.tables.config().allowances)
    }
}
