//! Helpers shared by the calculators.
//!
//! Amounts that add up to more than a [`Decimal`] can hold saturate at
//! [`Decimal::MAX`] (or [`Decimal::MIN`]) instead of overflowing, so every
//! computation over user-supplied figures returns a value.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places used when presenting monetary amounts.
pub const PRESENTATION_DP: u32 = 2;

/// Rounds a value to two decimal places, midpoints away from zero.
///
/// Only applied when presenting results. Calculators keep full precision
/// so rounding error does not compound across steps.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRESENTATION_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps negative values to zero.
///
/// Taxable bases and liabilities are never negative.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::non_negative;
///
/// assert_eq!(non_negative(dec!(-5)), dec!(0));
/// assert_eq!(non_negative(dec!(5)), dec!(5));
/// ```
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Sums `values`, saturating at the bounds of [`Decimal`].
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::saturating_sum;
///
/// assert_eq!(saturating_sum([dec!(1.5), dec!(2)]), dec!(3.5));
/// assert_eq!(saturating_sum([Decimal::MAX, Decimal::MAX]), Decimal::MAX);
/// ```
pub fn saturating_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |total, value| total.saturating_add(value))
}

/// Returns true when `rate` is a fraction in `[0, 1]`.
pub fn is_fraction(rate: Decimal) -> bool {
    rate >= Decimal::ZERO && rate <= Decimal::ONE
}
