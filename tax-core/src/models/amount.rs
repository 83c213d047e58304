//! Lenient monetary inputs.
//!
//! Figures arrive from interactive forms as numbers, numeric strings, empty
//! strings, `null`, or not at all. Partial submissions are expected, so every
//! value that cannot be read as a number is taken as zero instead of failing
//! the whole request. Numbers too large for a [`Decimal`] saturate at
//! [`Decimal::MAX`] or [`Decimal::MIN`].

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::calculations::common::saturating_sum;

/// Reads a user-entered figure, returning zero when it is not numeric.
///
/// Accepts plain decimals (`"1250.50"`), surrounding whitespace and
/// scientific notation (`"1.5e3"`). A finite number beyond the range of
/// [`Decimal`] saturates at the bound of its sign; one too small to
/// represent reads as zero.
pub fn coerce_amount(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    trimmed
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or_else(|_| out_of_range(trimmed))
}

fn out_of_range(trimmed: &str) -> Decimal {
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 1.0 => Decimal::MAX,
        Ok(v) if v.is_finite() && v <= -1.0 => Decimal::MIN,
        _ => Decimal::ZERO,
    }
}

/// A decimal that deserializes from anything, defaulting to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LooseAmount(pub Decimal);

impl LooseAmount {
    pub fn value(self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for LooseAmount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<LooseAmount> for Decimal {
    fn from(value: LooseAmount) -> Self {
        value.0
    }
}

struct LooseAmountVisitor;

impl<'de> Visitor<'de> for LooseAmountVisitor {
    type Value = LooseAmount;

    fn expecting(
        &self,
        formatter: &mut fmt::Formatter,
    ) -> fmt::Result {
        formatter.write_str("a monetary amount")
    }

    fn visit_bool<E: de::Error>(
        self,
        _v: bool,
    ) -> Result<Self::Value, E> {
        Ok(LooseAmount::default())
    }

    fn visit_i64<E: de::Error>(
        self,
        v: i64,
    ) -> Result<Self::Value, E> {
        Ok(LooseAmount(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(
        self,
        v: u64,
    ) -> Result<Self::Value, E> {
        Ok(LooseAmount(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(
        self,
        v: f64,
    ) -> Result<Self::Value, E> {
        // Display gives the shortest round-tripping form, so 0.1 stays 0.1.
        Ok(LooseAmount(coerce_amount(&v.to_string())))
    }

    fn visit_str<E: de::Error>(
        self,
        v: &str,
    ) -> Result<Self::Value, E> {
        Ok(LooseAmount(coerce_amount(v)))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(LooseAmount::default())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(LooseAmount::default())
    }

    fn visit_some<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(
        self,
        mut seq: A,
    ) -> Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(LooseAmount::default())
    }

    fn visit_map<A: MapAccess<'de>>(
        self,
        mut map: A,
    ) -> Result<Self::Value, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(LooseAmount::default())
    }
}

impl<'de> Deserialize<'de> for LooseAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LooseAmountVisitor)
    }
}

/// Line items of one income or expense category, keyed by label.
///
/// Deserializes from an object of label/amount pairs, from a list (labels
/// become the item positions), or from a single scalar (label `value`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Bucket(BTreeMap<String, Decimal>);

impl Bucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to the item called `label`.
    pub fn add(
        &mut self,
        label: impl Into<String>,
        amount: Decimal,
    ) {
        let item = self.0.entry(label.into()).or_insert(Decimal::ZERO);
        *item = item.saturating_add(amount);
    }

    pub fn with(
        mut self,
        label: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        self.add(label, amount);
        self
    }

    pub fn get(
        &self,
        label: &str,
    ) -> Decimal {
        self.0.get(label).copied().unwrap_or(Decimal::ZERO)
    }

    /// Sum of every item, saturating at the bounds of [`Decimal`].
    pub fn total(&self) -> Decimal {
        saturating_sum(self.0.values().copied())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.0.iter().map(|(label, amount)| (label.as_str(), *amount))
    }

    /// Folds every item of `other` into this bucket.
    pub fn merge(
        &mut self,
        other: &Bucket,
    ) {
        for (label, amount) in other.iter() {
            self.add(label, amount);
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Decimal)> for Bucket {
    fn from_iter<I: IntoIterator<Item = (K, Decimal)>>(iter: I) -> Self {
        let mut bucket = Bucket::new();
        for (label, amount) in iter {
            bucket.add(label, amount);
        }
        bucket
    }
}

const SCALAR_LABEL: &str = "value";

struct BucketVisitor;

impl BucketVisitor {
    fn scalar(amount: LooseAmount) -> Bucket {
        Bucket::new().with(SCALAR_LABEL, amount.value())
    }
}

impl<'de> Visitor<'de> for BucketVisitor {
    type Value = Bucket;

    fn expecting(
        &self,
        formatter: &mut fmt::Formatter,
    ) -> fmt::Result {
        formatter.write_str("a map of line items to amounts")
    }

    fn visit_bool<E: de::Error>(
        self,
        _v: bool,
    ) -> Result<Self::Value, E> {
        Ok(Bucket::new())
    }

    fn visit_i64<E: de::Error>(
        self,
        v: i64,
    ) -> Result<Self::Value, E> {
        LooseAmountVisitor.visit_i64(v).map(Self::scalar)
    }

    fn visit_u64<E: de::Error>(
        self,
        v: u64,
    ) -> Result<Self::Value, E> {
        LooseAmountVisitor.visit_u64(v).map(Self::scalar)
    }

    fn visit_f64<E: de::Error>(
        self,
        v: f64,
    ) -> Result<Self::Value, E> {
        LooseAmountVisitor.visit_f64(v).map(Self::scalar)
    }

    fn visit_str<E: de::Error>(
        self,
        v: &str,
    ) -> Result<Self::Value, E> {
        LooseAmountVisitor.visit_str(v).map(Self::scalar)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Bucket::new())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Bucket::new())
    }

    fn visit_some<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(
        self,
        mut seq: A,
    ) -> Result<Self::Value, A::Error> {
        let mut bucket = Bucket::new();
        let mut index = 0usize;
        while let Some(amount) = seq.next_element::<LooseAmount>()? {
            bucket.add(index.to_string(), amount.value());
            index += 1;
        }
        Ok(bucket)
    }

    fn visit_map<A: MapAccess<'de>>(
        self,
        mut map: A,
    ) -> Result<Self::Value, A::Error> {
        let mut bucket = Bucket::new();
        while let Some((label, amount)) = map.next_entry::<String, LooseAmount>()? {
            bucket.add(label, amount.value());
        }
        Ok(bucket)
    }
}

impl<'de> Deserialize<'de> for Bucket {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BucketVisitor)
    }
}
