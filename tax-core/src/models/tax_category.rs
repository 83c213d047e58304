use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rate categories known to the seeded rate table.
///
/// The resolver itself is keyed by plain strings, so categories outside this
/// list can still be stored and looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxCategory {
    Vat,
    WithholdingRoyalties,
    WithholdingFees,
    WithholdingInterest,
    WithholdingTenders,
    CorporateIncome,
    IndividualIncome,
    Agriculture,
    Insurance,
    Financial,
    Healthcare,
}

impl TaxCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vat => "VAT",
            Self::WithholdingRoyalties => "Withholding_Royalties",
            Self::WithholdingFees => "Withholding_Fees",
            Self::WithholdingInterest => "Withholding_Interest",
            Self::WithholdingTenders => "Withholding_Tenders",
            Self::CorporateIncome => "Corporate_Income",
            Self::IndividualIncome => "Individual_Income",
            Self::Agriculture => "Agriculture",
            Self::Insurance => "Insurance",
            Self::Financial => "Financial",
            Self::Healthcare => "Healthcare",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "VAT" => Some(Self::Vat),
            "Withholding_Royalties" => Some(Self::WithholdingRoyalties),
            "Withholding_Fees" => Some(Self::WithholdingFees),
            "Withholding_Interest" => Some(Self::WithholdingInterest),
            "Withholding_Tenders" => Some(Self::WithholdingTenders),
            "Corporate_Income" => Some(Self::CorporateIncome),
            "Individual_Income" => Some(Self::IndividualIncome),
            "Agriculture" => Some(Self::Agriculture),
            "Insurance" => Some(Self::Insurance),
            "Financial" => Some(Self::Financial),
            "Healthcare" => Some(Self::Healthcare),
            _ => None,
        }
    }

    pub fn all() -> &'static [TaxCategory] {
        &[
            Self::Vat,
            Self::WithholdingRoyalties,
            Self::WithholdingFees,
            Self::WithholdingInterest,
            Self::WithholdingTenders,
            Self::CorporateIncome,
            Self::IndividualIncome,
            Self::Agriculture,
            Self::Insurance,
            Self::Financial,
            Self::Healthcare,
        ]
    }
}

/// One row of the administrative rate table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateEntry {
    pub category: String,
    pub rate: Decimal,
    pub effective_date: NaiveDate,
}
