//! End-to-end command tests against the seeded in-memory SQLite tables.

use std::fs;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use tax_cli::app;
use tax_cli::commands::{Command, InputArgs};
use tax_cli::config::CliConfig;
use tax_core::calculations::computations::Sector;
use tax_core::{TaxEngine, TaxTables};
use tempfile::TempDir;

async fn seeded_tables() -> TaxTables {
    let as_of = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    app::load_tables(&CliConfig::default(), as_of)
        .await
        .expect("Failed to load seeded tables")
}

/// Writes `json` to `name.json` inside `dir`. The file goes away with `dir`.
fn input_file(
    dir: &TempDir,
    name: &str,
    json: &str,
) -> InputArgs {
    let path = dir.path().join(format!("{name}.json"));
    fs::write(&path, json).expect("Failed to write input file");
    InputArgs::from_path(path)
}

fn amount(value: &Value) -> Decimal {
    value
        .as_str()
        .expect("amounts serialize as strings")
        .parse()
        .expect("amount is a decimal")
}

async fn run(command: Command) -> Value {
    let tables = seeded_tables().await;
    command
        .execute(&TaxEngine::new(&tables))
        .expect("command failed")
}

#[tokio::test]
async fn test_paye_with_aids_levy() {
    let tmp = TempDir::new().unwrap();
    let input = input_file(&tmp, "paye", r#"{"currentSalary": 800}"#);

    let value = run(Command::Paye(input)).await;

    assert_eq!(amount(&value["base_amount"]), dec!(800));
    assert_eq!(amount(&value["primary_tax"]), dec!(165));
    assert_eq!(value["secondary_levies"][0]["name"], "AIDS Levy");
    assert_eq!(amount(&value["secondary_levies"][0]["amount"]), dec!(4.95));
    assert_eq!(amount(&value["total_tax"]), dec!(169.95));
}

#[tokio::test]
async fn test_paye_credits_reduce_primary_tax() {
    let tmp = TempDir::new().unwrap();
    let input = input_file(
        &tmp,
        "paye-credits",
        r#"{"currentSalary": "2600", "pensionContributions": 100, "credits": 40}"#,
    );

    let value = run(Command::Paye(input)).await;

    assert_eq!(amount(&value["base_amount"]), dec!(2500));
    assert_eq!(amount(&value["breakdown"]["progressive_tax"]), dec!(690));
    assert_eq!(amount(&value["primary_tax"]), dec!(650));
    assert_eq!(amount(&value["total_tax"]), dec!(669.50));
}

#[tokio::test]
async fn test_corporate_income_tax() {
    let tmp = TempDir::new().unwrap();
    let input = input_file(&tmp, "corporate", r#"{"profits": 10000, "deductions": 1250}"#);

    let value = run(Command::Corporate(input)).await;

    assert_eq!(amount(&value["base_amount"]), dec!(8750));
    assert_eq!(amount(&value["primary_tax"]), dec!(2100));
    assert_eq!(amount(&value["total_tax"]), dec!(2163));
}

#[tokio::test]
async fn test_composite_and_comprehensive_agree_on_base() {
    let tmp = TempDir::new().unwrap();
    let json = r#"{
        "profitLoss": {"sales": 1000, "costOfGoodsSold": 400},
        "taxComputation": {
            "nonTaxableIncome": {"dividends": 50},
            "nonDeductibleExpenses": {"fines": 20}
        },
        "capitalAllowance": {"vehicles": 30}
    }"#;

    let composite = run(Command::Composite(input_file(&tmp, "composite", json))).await;
    let comprehensive = run(Command::Comprehensive(input_file(&tmp, "comprehensive", json))).await;

    assert_eq!(amount(&composite["taxable_base"]), dec!(540));
    assert_eq!(amount(&composite["breakdown"]["gross_profit"]), dec!(600));
    assert_eq!(amount(&comprehensive["base_amount"]), dec!(540));
    assert_eq!(amount(&comprehensive["primary_tax"]), dec!(129.60));
    assert_eq!(amount(&comprehensive["total_tax"]), dec!(133.49));
}

#[tokio::test]
async fn test_oversized_figures_saturate() {
    let tmp = TempDir::new().unwrap();
    let json = r#"{"profitLoss": {"operatingExpenses": {
        "a": "79228162514264337593543950335",
        "b": "79228162514264337593543950335"
    }}}"#;

    let composite = run(Command::Composite(input_file(&tmp, "oversized", json))).await;
    let levies = run(Command::Levies {
        primary_tax: Decimal::MAX,
    })
    .await;

    assert_eq!(amount(&composite["breakdown"]["operating_expenses"]), Decimal::MAX);
    assert_eq!(amount(&composite["taxable_base"]), dec!(0));
    assert_eq!(amount(&levies["total_tax"]), Decimal::MAX);
}

#[tokio::test]
async fn test_sector_tax_has_no_levies() {
    let value = run(Command::Sector {
        sector: Sector::Healthcare,
        value: dec!(1000),
    })
    .await;

    assert_eq!(value["category"], "Healthcare");
    assert_eq!(amount(&value["tax"]), dec!(200));
}

#[tokio::test]
async fn test_unknown_rate_category_falls_back() {
    let value = run(Command::Rate {
        category: "Carbon".to_string(),
    })
    .await;

    assert_eq!(amount(&value["rate"]), dec!(0));
    assert_eq!(value["source"], serde_json::json!(tax_core::calculations::RateSource::Default));
}

#[tokio::test]
async fn test_vat_deferment_threshold() {
    let tmp = TempDir::new().unwrap();
    let eligible = run(Command::Deferment(input_file(
        &tmp,
        "deferment-yes",
        r#"{"equipmentValue": 10000}"#,
    )))
    .await;
    let ineligible = run(Command::Deferment(input_file(
        &tmp,
        "deferment-no",
        r#"{"equipmentValue": 9999.99}"#,
    )))
    .await;

    assert_eq!(eligible["eligible"], true);
    assert_eq!(eligible["deferment_days"], 30);
    assert_eq!(ineligible["eligible"], false);
}

#[tokio::test]
async fn test_seeded_paye_constants_verify() {
    let value = run(Command::Schedules).await;
    let report = value.as_array().expect("schedule list");

    assert_eq!(report.len(), 1);
    assert_eq!(report[0]["name"], "PAYE");
    assert_eq!(report[0]["bands"], 6);
    assert_eq!(
        report[0]["constant_discrepancies"]
            .as_array()
            .expect("discrepancy list")
            .len(),
        0
    );
}

#[tokio::test]
async fn test_missing_input_file_is_an_error() {
    let tables = seeded_tables().await;
    let command = Command::Individual(InputArgs::from_path("/nonexistent/input.json"));

    let err = command.execute(&TaxEngine::new(&tables)).unwrap_err();

    assert_eq!(err.to_string(), "Failed to read input: /nonexistent/input.json");
}
