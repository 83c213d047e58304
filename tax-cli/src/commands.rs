//! Subcommands of the `tax-engine` binary.
//!
//! Scalar computations take their figures as arguments. Computations over a
//! set of named figures read a JSON object from `--input` or standard input;
//! missing or non-numeric figures count as zero. Every command answers with
//! a JSON value whose monetary amounts are rounded to cents.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tax_core::calculations::ProgressiveTaxCalculator;
use tax_core::calculations::common::round_half_up;
use tax_core::calculations::computations::{
    CapitalAllowanceInput, CorporateIncomeInput, ImportedServicesInput, IncomeAdjustmentInput,
    IndividualIncomeInput, PayeInput, Sector, VatDefermentInput, WithholdingKind,
};
use tax_core::{CompositeRequest, TaxEngine};

#[derive(Debug, Args)]
pub struct InputArgs {
    /// JSON file with the figures. Reads standard input when omitted or `-`.
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

impl InputArgs {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            input: Some(path.into()),
        }
    }

    pub fn read<T: DeserializeOwned>(&self) -> Result<T> {
        let raw = match self.input.as_deref() {
            Some(path) if path != Path::new("-") => fs::read_to_string(path)
                .with_context(|| format!("Failed to read input: {}", path.display()))?,
            _ => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read standard input")?;
                buf
            }
        };
        parse_input(&raw)
    }
}

/// Parses a JSON input document. Blank input reads as `{}`.
pub fn parse_input<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let trimmed = raw.trim();
    let document = if trimmed.is_empty() { "{}" } else { trimmed };
    serde_json::from_str(document).context("Input is not a valid JSON object for this command")
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the rate in effect for a category and where it came from.
    Rate { category: String },

    /// Flat tax on an amount at a category's rate.
    Flat {
        category: String,
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
    },

    /// Progressive tax on a base under a bracket schedule, band by band.
    Progressive {
        #[arg(allow_negative_numbers = true)]
        base: Decimal,

        /// Schedule name; the configured default schedule when omitted.
        #[arg(short, long)]
        schedule: Option<String>,
    },

    /// Configured secondary levies on a primary tax.
    Levies {
        #[arg(allow_negative_numbers = true)]
        primary_tax: Decimal,
    },

    /// Individual income tax: income, exemptIncome, deductions.
    Individual(InputArgs),

    /// Monthly PAYE on salary, benefits and reductions.
    Paye(InputArgs),

    /// Corporate income tax: profits, deductions, nonDeductible, recoupments.
    Corporate(InputArgs),

    /// Corporate income tax on a full profit-and-loss submission.
    Comprehensive(InputArgs),

    /// Taxable base of a profit-and-loss submission, with every aggregate.
    Composite(InputArgs),

    /// VAT on a supply value.
    Vat {
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
    },

    /// VAT on imported services: value, marketValue, isMarketValue.
    ImportedVat(InputArgs),

    /// Withholding tax on royalties, fees, interest or tenders.
    Withholding {
        kind: WithholdingKind,
        #[arg(allow_negative_numbers = true)]
        value: Decimal,
    },

    /// Sector tax for agriculture, insurance, financial or healthcare.
    Sector {
        sector: Sector,
        #[arg(allow_negative_numbers = true)]
        value: Decimal,
    },

    /// Capital allowances on qualifyingAssets at allowanceRate.
    Allowances(InputArgs),

    /// Taxable income after reliefs: taxableIncome, reliefs.
    Relief(InputArgs),

    /// Taxable income after credits: taxableIncome, credits.
    Credits(InputArgs),

    /// VAT deferment eligibility: equipmentValue, threshold.
    Deferment(InputArgs),

    /// List the loaded bracket schedules and check their stored constants.
    Schedules,
}

impl Command {
    pub fn execute(
        &self,
        engine: &TaxEngine<'_>,
    ) -> Result<Value> {
        let value = match self {
            Command::Rate { category } => {
                let resolved = engine.resolve_rate(category);
                json!({
                    "category": category,
                    "rate": resolved.rate,
                    "source": resolved.source,
                })
            }
            Command::Flat { category, amount } => {
                serde_json::to_value(engine.compute_flat_tax_detailed(*amount, category).rounded())?
            }
            Command::Progressive { base, schedule } => {
                let name = schedule
                    .clone()
                    .unwrap_or_else(|| engine.tables().config().brackets.default_schedule.clone());
                let result = engine.compute_schedule_tax_detailed(*base, &name)?;
                json!({
                    "schedule": name,
                    "effective_rate": result.effective_rate().round_dp(6),
                    "result": result.rounded(),
                })
            }
            Command::Levies { primary_tax } => {
                serde_json::to_value(engine.apply_snapshot_levies(*primary_tax).rounded())?
            }
            Command::Individual(input) => {
                let input: IndividualIncomeInput = input.read()?;
                serde_json::to_value(engine.individual_income_tax(&input)?.rounded())?
            }
            Command::Paye(input) => {
                let input: PayeInput = input.read()?;
                serde_json::to_value(engine.paye(&input)?.rounded())?
            }
            Command::Corporate(input) => {
                let input: CorporateIncomeInput = input.read()?;
                serde_json::to_value(engine.corporate_income_tax(&input).rounded())?
            }
            Command::Comprehensive(input) => {
                let request: CompositeRequest = input.read()?;
                let result = engine.comprehensive_corporate_tax(&request.into_input());
                serde_json::to_value(result.rounded())?
            }
            Command::Composite(input) => {
                let request: CompositeRequest = input.read()?;
                let outcome = engine.aggregate_composite(&request.into_input());
                json!({
                    "taxable_base": round_half_up(outcome.taxable_base),
                    "breakdown": outcome.breakdown.rounded(),
                })
            }
            Command::Vat { amount } => serde_json::to_value(engine.vat_on_supplies(*amount).rounded())?,
            Command::ImportedVat(input) => {
                let input: ImportedServicesInput = input.read()?;
                serde_json::to_value(engine.vat_on_imported_services(&input).rounded())?
            }
            Command::Withholding { kind, value } => {
                serde_json::to_value(engine.withholding_tax(*kind, *value).rounded())?
            }
            Command::Sector { sector, value } => {
                serde_json::to_value(engine.sector_tax(*sector, *value).rounded())?
            }
            Command::Allowances(input) => {
                let input: CapitalAllowanceInput = input.read()?;
                serde_json::to_value(engine.capital_allowances(&input)?)?
            }
            Command::Relief(input) | Command::Credits(input) => {
                let input: IncomeAdjustmentInput = input.read()?;
                serde_json::to_value(engine.adjust_income(&input))?
            }
            Command::Deferment(input) => {
                let input: VatDefermentInput = input.read()?;
                serde_json::to_value(engine.vat_deferment(&input)?)?
            }
            Command::Schedules => schedules(engine)?,
        };
        Ok(value)
    }
}

fn schedules(engine: &TaxEngine<'_>) -> Result<Value> {
    let tables = engine.tables();
    let mut report = Vec::new();

    for name in tables.schedule_names() {
        let table = tables.schedule(name)?;
        let discrepancies =
            ProgressiveTaxCalculator::new(table).subtraction_constant_discrepancies();
        report.push(json!({
            "name": name,
            "bands": table.len(),
            "threshold": table.threshold(),
            "progressive": table.is_progressive(),
            "constant_discrepancies": discrepancies,
        }));
    }

    Ok(Value::Array(report))
}
