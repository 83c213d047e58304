use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A secondary percentage surcharge computed on a primary tax amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Levy {
    pub name: String,
    pub rate: Decimal,
}

impl Levy {
    pub fn new(
        name: impl Into<String>,
        rate: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            rate,
        }
    }

    /// The 3% AIDS levy charged on income tax.
    pub fn aids_levy() -> Self {
        Self::new("AIDS Levy", Decimal::new(3, 2))
    }
}

/// A levy as applied to a specific primary tax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevyAmount {
    pub name: String,
    pub rate: Decimal,
    pub amount: Decimal,
}
