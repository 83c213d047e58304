//! Flat rate lookup by tax category.
//!
//! A [`RateResolver`] is built once from the administrative rate table and
//! an as-of date, then answers lookups without side effects. Categories that
//! have no active entry are not an error: they resolve to an explicitly
//! configured per-category fallback, or else to the default rate (zero unless
//! configured otherwise). [`ResolvedRate::source`] tells the caller which of
//! the three applied.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::{RateResolver, RateSource};
//! use tax_core::config::RateFallbacks;
//! use tax_core::RateEntry;
//!
//! let entries = vec![RateEntry {
//!     category: "VAT".to_string(),
//!     rate: dec!(0.15),
//!     effective_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
//! }];
//! let as_of = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
//! let resolver = RateResolver::new(&entries, as_of, RateFallbacks::default()).unwrap();
//!
//! assert_eq!(resolver.rate("VAT"), dec!(0.15));
//! assert_eq!(resolver.resolve("Stamp_Duty").source, RateSource::Default);
//! ```

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::is_fraction;
use crate::config::RateFallbacks;
use crate::models::RateEntry;

/// Problems with the rate table itself. These are configuration errors and
/// prevent the resolver from being built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateTableError {
    /// A stored rate lies outside `[0, 1]`.
    #[error("rate for category '{category}' must be between 0 and 1, got {rate}")]
    InvalidRate { category: String, rate: Decimal },

    /// Two rows for one category take effect on the same date.
    #[error("category '{category}' has more than one rate effective on {effective_date}")]
    DuplicateEntry {
        category: String,
        effective_date: NaiveDate,
    },

    /// A configured fallback rate lies outside `[0, 1]`.
    #[error("fallback rate for '{category}' must be between 0 and 1, got {rate}")]
    InvalidFallback { category: String, rate: Decimal },
}

/// Where a resolved rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateSource {
    /// An active row of the rate table.
    Table,
    /// A fallback configured for this specific category.
    ConfiguredFallback,
    /// The default rate for categories nobody configured.
    Default,
}

/// A rate together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRate {
    pub rate: Decimal,
    pub source: RateSource,
}

impl ResolvedRate {
    /// True when the category had no active entry in the rate table.
    pub fn is_unknown(&self) -> bool {
        self.source != RateSource::Table
    }
}

/// Read-only category → rate lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateResolver {
    active: HashMap<String, RateEntry>,
    fallbacks: RateFallbacks,
}

impl RateResolver {
    /// Builds a resolver from stored rows.
    ///
    /// For each category the row with the latest `effective_date` on or
    /// before `as_of` is active. Rows dated after `as_of` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RateTableError`] if any row or configured fallback has a
    /// rate outside `[0, 1]`, or if a category has two rows with the same
    /// effective date.
    pub fn new(
        entries: &[RateEntry],
        as_of: NaiveDate,
        fallbacks: RateFallbacks,
    ) -> Result<Self, RateTableError> {
        validate_fallbacks(&fallbacks)?;

        let mut active: HashMap<String, RateEntry> = HashMap::new();
        for entry in entries {
            if !is_fraction(entry.rate) {
                return Err(RateTableError::InvalidRate {
                    category: entry.category.clone(),
                    rate: entry.rate,
                });
            }
            if entry.effective_date > as_of {
                continue;
            }
            match active.get(&entry.category) {
                Some(current) if current.effective_date == entry.effective_date => {
                    return Err(RateTableError::DuplicateEntry {
                        category: entry.category.clone(),
                        effective_date: entry.effective_date,
                    });
                }
                Some(current) if current.effective_date > entry.effective_date => {}
                _ => {
                    active.insert(entry.category.clone(), entry.clone());
                }
            }
        }

        Ok(Self { active, fallbacks })
    }

    /// A resolver with no table rows; every lookup uses the fallbacks.
    pub fn empty(fallbacks: RateFallbacks) -> Result<Self, RateTableError> {
        validate_fallbacks(&fallbacks)?;
        Ok(Self {
            active: HashMap::new(),
            fallbacks,
        })
    }

    /// Resolves the rate for `category`, reporting where it came from.
    pub fn resolve(
        &self,
        category: &str,
    ) -> ResolvedRate {
        if let Some(entry) = self.active.get(category) {
            return ResolvedRate {
                rate: entry.rate,
                source: RateSource::Table,
            };
        }
        match self.fallbacks.categories.get(category) {
            Some(rate) => ResolvedRate {
                rate: *rate,
                source: RateSource::ConfiguredFallback,
            },
            None => ResolvedRate {
                rate: self.fallbacks.default_rate,
                source: RateSource::Default,
            },
        }
    }

    /// Shorthand for `resolve(category).rate`.
    pub fn rate(
        &self,
        category: &str,
    ) -> Decimal {
        self.resolve(category).rate
    }

    /// The active row for `category`, if any.
    pub fn active_entry(
        &self,
        category: &str,
    ) -> Option<&RateEntry> {
        self.active.get(category)
    }

    /// Categories with an active row, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.active.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn validate_fallbacks(fallbacks: &RateFallbacks) -> Result<(), RateTableError> {
    if !is_fraction(fallbacks.default_rate) {
        return Err(RateTableError::InvalidFallback {
            category: "default".to_string(),
            rate: fallbacks.default_rate,
        });
    }
    for (category, rate) in &fallbacks.categories {
        if !is_fraction(*rate) {
            return Err(RateTableError::InvalidFallback {
                category: category.clone(),
                rate: *rate,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn date(
        y: i32,
        m: u32,
        d: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(
        category: &str,
        rate: Decimal,
        effective_date: NaiveDate,
    ) -> RateEntry {
        RateEntry {
            category: category.to_string(),
            rate,
            effective_date,
        }
    }

    fn seeded_entries() -> Vec<RateEntry> {
        vec![
            entry("VAT", dec!(0.15), date(2023, 1, 1)),
            entry("Withholding_Fees", dec!(0.20), date(2023, 1, 1)),
            entry("Corporate_Income", dec!(0.24), date(2023, 1, 1)),
        ]
    }

    fn corporate_fallback() -> RateFallbacks {
        RateFallbacks {
            default_rate: Decimal::ZERO,
            categories: BTreeMap::from([("Corporate_Income".to_string(), dec!(0.25))]),
        }
    }

    // =========================================================================
    // resolve tests
    // =========================================================================

    #[test]
    fn resolve_returns_table_rate() {
        let resolver =
            RateResolver::new(&seeded_entries(), date(2025, 1, 1), RateFallbacks::default())
                .unwrap();

        let resolved = resolver.resolve("VAT");

        assert_eq!(resolved.rate, dec!(0.15));
        assert_eq!(resolved.source, RateSource::Table);
        assert!(!resolved.is_unknown());
    }

    #[test]
    fn resolve_unknown_category_defaults_to_zero() {
        let resolver =
            RateResolver::new(&seeded_entries(), date(2025, 1, 1), RateFallbacks::default())
                .unwrap();

        let resolved = resolver.resolve("Carbon");

        assert_eq!(resolved.rate, dec!(0));
        assert_eq!(resolved.source, RateSource::Default);
        assert!(resolved.is_unknown());
    }

    #[test]
    fn resolve_uses_configured_fallback_only_when_missing_from_table() {
        let with_row =
            RateResolver::new(&seeded_entries(), date(2025, 1, 1), corporate_fallback()).unwrap();
        let without_row = RateResolver::empty(corporate_fallback()).unwrap();

        assert_eq!(with_row.rate("Corporate_Income"), dec!(0.24));

        let resolved = without_row.resolve("Corporate_Income");
        assert_eq!(resolved.rate, dec!(0.25));
        assert_eq!(resolved.source, RateSource::ConfiguredFallback);
        assert!(resolved.is_unknown());
    }

    #[test]
    fn resolve_is_case_sensitive() {
        let resolver =
            RateResolver::new(&seeded_entries(), date(2025, 1, 1), RateFallbacks::default())
                .unwrap();

        assert_eq!(resolver.resolve("vat").source, RateSource::Default);
    }

    // =========================================================================
    // effective date tests
    // =========================================================================

    #[test]
    fn latest_effective_row_wins() {
        let entries = vec![
            entry("VAT", dec!(0.145), date(2020, 1, 1)),
            entry("VAT", dec!(0.15), date(2023, 1, 1)),
            entry("VAT", dec!(0.16), date(2019, 1, 1)),
        ];

        let resolver =
            RateResolver::new(&entries, date(2024, 1, 1), RateFallbacks::default()).unwrap();

        assert_eq!(resolver.rate("VAT"), dec!(0.15));
        assert_eq!(
            resolver.active_entry("VAT").map(|e| e.effective_date),
            Some(date(2023, 1, 1))
        );
    }

    #[test]
    fn future_rows_are_ignored() {
        let entries = vec![
            entry("VAT", dec!(0.15), date(2023, 1, 1)),
            entry("VAT", dec!(0.155), date(2026, 1, 1)),
            entry("Healthcare", dec!(0.20), date(2026, 1, 1)),
        ];

        let resolver =
            RateResolver::new(&entries, date(2025, 6, 1), RateFallbacks::default()).unwrap();

        assert_eq!(resolver.rate("VAT"), dec!(0.15));
        assert!(resolver.resolve("Healthcare").is_unknown());
    }

    #[test]
    fn row_effective_on_as_of_date_is_active() {
        let entries = vec![entry("Insurance", dec!(0.05), date(2025, 6, 1))];

        let resolver =
            RateResolver::new(&entries, date(2025, 6, 1), RateFallbacks::default()).unwrap();

        assert_eq!(resolver.rate("Insurance"), dec!(0.05));
    }

    // =========================================================================
    // validation tests
    // =========================================================================

    #[test]
    fn duplicate_effective_date_is_rejected() {
        let entries = vec![
            entry("VAT", dec!(0.15), date(2023, 1, 1)),
            entry("VAT", dec!(0.16), date(2023, 1, 1)),
        ];

        let result = RateResolver::new(&entries, date(2024, 1, 1), RateFallbacks::default());

        assert_eq!(
            result,
            Err(RateTableError::DuplicateEntry {
                category: "VAT".to_string(),
                effective_date: date(2023, 1, 1),
            })
        );
    }

    #[test]
    fn rate_above_one_is_rejected() {
        let entries = vec![entry("VAT", dec!(15), date(2023, 1, 1))];

        let result = RateResolver::new(&entries, date(2024, 1, 1), RateFallbacks::default());

        assert_eq!(
            result,
            Err(RateTableError::InvalidRate {
                category: "VAT".to_string(),
                rate: dec!(15),
            })
        );
    }

    #[test]
    fn invalid_fallback_is_rejected() {
        let fallbacks = RateFallbacks {
            default_rate: dec!(-0.1),
            categories: BTreeMap::new(),
        };

        assert!(matches!(
            RateResolver::empty(fallbacks),
            Err(RateTableError::InvalidFallback { .. })
        ));
    }

    #[test]
    fn categories_lists_active_rows_sorted() {
        let resolver =
            RateResolver::new(&seeded_entries(), date(2025, 1, 1), RateFallbacks::default())
                .unwrap();

        assert_eq!(
            resolver.categories(),
            vec!["Corporate_Income", "VAT", "Withholding_Fees"]
        );
    }
}
