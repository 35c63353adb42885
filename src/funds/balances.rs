use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BucketKey, RatioConfig};

/// Money currently held in each bucket.
///
/// Always holds an entry for every [`BucketKey`]; balances may be negative
/// (an overdrawn envelope). Encoded as a JSON object of plain numbers, and
/// decoding rejects missing or unknown buckets and documents whose total
/// does not fit in a [`Decimal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<BucketKey, Decimal>",
    into = "BTreeMap<BucketKey, Decimal>"
)]
pub struct BucketBalances(BTreeMap<BucketKey, Decimal>);

impl Default for BucketBalances {
    fn default() -> Self {
        Self(BucketKey::ALL.into_iter().map(|k| (k, Decimal::ZERO)).collect())
    }
}

impl BucketBalances {
    pub fn get(&self, key: BucketKey) -> Decimal {
        self.0.get(&key).copied().unwrap_or(Decimal::ZERO)
    }

    /// Derived total; never stored. Saturates at the `Decimal` bounds, which
    /// only a document built through `FromIterator` can reach.
    pub fn total(&self) -> Decimal {
        self.0
            .values()
            .fold(Decimal::ZERO, |acc, v| acc.saturating_add(*v))
    }

    /// The total, or `None` if summing the buckets overflows.
    pub fn checked_total(&self) -> Option<Decimal> {
        checked_sum(self.0.values())
    }

    pub fn iter(&self) -> impl Iterator<Item = (BucketKey, Decimal)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Per-bucket share of `amount` under `ratios`: `amount * ratio / 100`.
    /// `None` when a share does not fit in a `Decimal`.
    pub fn shares(amount: Decimal, ratios: &RatioConfig) -> Option<Self> {
        ratios
            .iter()
            .map(|(k, p)| {
                let share = amount.checked_mul(Decimal::from(p))?.checked_div(Decimal::ONE_HUNDRED)?;
                Some((k, share))
            })
            .collect::<Option<BTreeMap<_, _>>>()
            .map(Self)
    }

    /// Returns a copy with `amount` split across the buckets per `ratios`,
    /// or `None` if a bucket or the total would overflow.
    pub fn with_distribution(&self, amount: Decimal, ratios: &RatioConfig) -> Option<Self> {
        let shares = Self::shares(amount, ratios)?;
        let mut next = self.clone();
        for (key, share) in shares.iter() {
            let slot = next.0.entry(key).or_insert(Decimal::ZERO);
            *slot = slot.checked_add(share)?;
        }
        next.checked_total()?;
        Some(next)
    }

    /// Returns a copy with `delta` added to one bucket. No floor at zero.
    /// `None` if the bucket or the total would overflow.
    pub fn with_adjustment(&self, key: BucketKey, delta: Decimal) -> Option<Self> {
        let mut next = self.clone();
        let slot = next.0.entry(key).or_insert(Decimal::ZERO);
        *slot = slot.checked_add(delta)?;
        next.checked_total()?;
        Some(next)
    }
}

fn checked_sum<'a>(values: impl Iterator<Item = &'a Decimal>) -> Option<Decimal> {
    values.fold(Some(Decimal::ZERO), |acc, v| acc?.checked_add(*v))
}

fn validate(map: BTreeMap<BucketKey, Decimal>) -> Result<BucketBalances, String> {
    let missing: Vec<&str> = BucketKey::ALL
        .iter()
        .filter(|k| !map.contains_key(k))
        .map(|k| k.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(format!("missing balance for {}", missing.join(", ")));
    }
    if checked_sum(map.values()).is_none() {
        return Err("balances total is out of range".to_string());
    }
    Ok(BucketBalances(map))
}

impl TryFrom<BTreeMap<BucketKey, Decimal>> for BucketBalances {
    type Error = String;

    fn try_from(map: BTreeMap<BucketKey, Decimal>) -> Result<Self, Self::Error> {
        validate(map)
    }
}

impl From<BucketBalances> for BTreeMap<BucketKey, Decimal> {
    fn from(balances: BucketBalances) -> Self {
        balances.0
    }
}

impl FromIterator<(BucketKey, Decimal)> for BucketBalances {
    /// Buckets absent from the iterator start at zero.
    fn from_iter<I: IntoIterator<Item = (BucketKey, Decimal)>>(iter: I) -> Self {
        let mut balances = Self::default();
        for (key, value) in iter {
            balances.0.insert(key, value);
        }
        balances
    }
}

/// One balance as kept in the local store: a decimal string, so no digit is
/// lost through `f64`. Plain numbers written by earlier builds still load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum StoredAmount {
    Exact(#[serde(with = "rust_decimal::serde::str")] Decimal),
    Plain(Decimal),
}

impl StoredAmount {
    fn value(self) -> Decimal {
        match self {
            StoredAmount::Exact(v) | StoredAmount::Plain(v) => v,
        }
    }
}

/// Storage encoding of [`BucketBalances`]. The sync wire keeps plain numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<BucketKey, StoredAmount>",
    into = "BTreeMap<BucketKey, StoredAmount>"
)]
pub(crate) struct StoredBalances(pub(crate) BucketBalances);

impl TryFrom<BTreeMap<BucketKey, StoredAmount>> for StoredBalances {
    type Error = String;

    fn try_from(map: BTreeMap<BucketKey, StoredAmount>) -> Result<Self, Self::Error> {
        validate(map.into_iter().map(|(k, v)| (k, v.value())).collect()).map(Self)
    }
}

impl From<StoredBalances> for BTreeMap<BucketKey, StoredAmount> {
    fn from(stored: StoredBalances) -> Self {
        let StoredBalances(BucketBalances(map)) = stored;
        map.into_iter()
            .map(|(k, v)| (k, StoredAmount::Exact(v)))
            .collect()
    }
}

/// Reads a user-typed amount. Blank or non-numeric text yields `None`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn default_is_all_zero() {
        let b = BucketBalances::default();
        assert_eq!(b.iter().count(), 6);
        assert_eq!(b.total(), Decimal::ZERO);
    }

    #[test]
    fn distribution_follows_ratios() {
        let b = BucketBalances::default()
            .with_distribution(d("1000000"), &RatioConfig::default())
            .unwrap();
        assert_eq!(b.get(BucketKey::Necessity), d("550000"));
        assert_eq!(b.get(BucketKey::Give), d("50000"));
        assert_eq!(b.total(), d("1000000"));
    }

    #[test]
    fn fractional_amount_splits_exactly() {
        let b = BucketBalances::default()
            .with_distribution(d("0.1"), &RatioConfig::default())
            .unwrap();
        assert_eq!(b.get(BucketKey::Necessity), d("0.055"));
        assert_eq!(b.total(), d("0.1"));
    }

    #[test]
    fn adjustment_has_no_floor() {
        let b = BucketBalances::default()
            .with_adjustment(BucketKey::Saving, d("-5"))
            .unwrap();
        assert_eq!(b.get(BucketKey::Saving), d("-5"));
    }

    #[test]
    fn decode_rejects_partial_and_unknown() {
        let partial = r#"{"necessity":1,"education":2}"#;
        let err = serde_json::from_str::<BucketBalances>(partial).unwrap_err();
        assert!(err.to_string().contains("missing balance for enjoyment"));

        let unknown = r#"{"necessity":0,"education":0,"enjoyment":0,"investment":0,"saving":0,"give":0,"rent":1}"#;
        assert!(serde_json::from_str::<BucketBalances>(unknown).is_err());
    }

    #[test]
    fn encodes_as_numbers() {
        let b = BucketBalances::default()
            .with_adjustment(BucketKey::Give, d("50000"))
            .unwrap();
        let v = serde_json::to_value(&b).unwrap();
        assert_eq!(v["give"].as_f64(), Some(50000.0));
        assert_eq!(v["saving"].as_f64(), Some(0.0));
    }

    #[test]
    fn overflow_yields_none_instead_of_panicking() {
        let ratios = RatioConfig::default();
        assert!(BucketBalances::shares(Decimal::from_scientific("1e28").unwrap(), &ratios).is_none());
        assert!(BucketBalances::default().with_distribution(Decimal::MAX, &ratios).is_none());

        let full = BucketBalances::default()
            .with_adjustment(BucketKey::Saving, Decimal::MAX)
            .unwrap();
        assert!(full.with_adjustment(BucketKey::Saving, Decimal::ONE).is_none());
        // each bucket fits on its own but the total would not
        assert!(full.with_adjustment(BucketKey::Give, Decimal::ONE).is_none());
        assert_eq!(full.checked_total(), Some(Decimal::MAX));
    }

    #[test]
    fn decode_rejects_overflowing_total() {
        let json = r#"{"necessity":5e28,"education":5e28,"enjoyment":0,"investment":0,"saving":0,"give":0}"#;
        let err = serde_json::from_str::<BucketBalances>(json).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn total_saturates_for_unchecked_documents() {
        let b: BucketBalances = [(BucketKey::Necessity, Decimal::MAX), (BucketKey::Give, Decimal::MAX)]
            .into_iter()
            .collect();
        assert_eq!(b.checked_total(), None);
        assert_eq!(b.total(), Decimal::MAX);
    }

    #[test]
    fn stored_form_keeps_every_digit() {
        let b = BucketBalances::default()
            .with_adjustment(BucketKey::Saving, d("12345678901234567.89"))
            .unwrap();
        let v = serde_json::to_value(StoredBalances(b.clone())).unwrap();
        assert_eq!(v["saving"], serde_json::json!("12345678901234567.89"));

        let back: StoredBalances = serde_json::from_value(v).unwrap();
        assert_eq!(back.0, b);
    }

    #[test]
    fn stored_form_accepts_plain_numbers() {
        let json = r#"{"necessity":550000,"education":100000,"enjoyment":100000,"investment":100000,"saving":"100000.5","give":50000}"#;
        let stored: StoredBalances = serde_json::from_str(json).unwrap();
        assert_eq!(stored.0.get(BucketKey::Necessity), d("550000"));
        assert_eq!(stored.0.get(BucketKey::Saving), d("100000.5"));
    }

    #[test]
    fn parse_amount_cases() {
        assert_eq!(parse_amount(" 1500000 "), Some(d("1500000")));
        assert_eq!(parse_amount("-20000.5"), Some(d("-20000.5")));
        assert_eq!(parse_amount("1e6"), Some(d("1000000")));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("abc"), None);
    }
}
