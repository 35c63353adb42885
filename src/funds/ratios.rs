use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::BucketKey;
use crate::error::{FundError, FundResult};

/// Share of every deposit routed to each bucket, in whole percent.
///
/// Always holds an entry for every [`BucketKey`]. The sum is expected to be
/// 100 once committed but may differ while being edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<BucketKey, u8>", into = "BTreeMap<BucketKey, u8>")]
pub struct RatioConfig(BTreeMap<BucketKey, u8>);

impl Default for RatioConfig {
    fn default() -> Self {
        Self(BTreeMap::from([
            (BucketKey::Necessity, 55),
            (BucketKey::Education, 10),
            (BucketKey::Enjoyment, 10),
            (BucketKey::Investment, 10),
            (BucketKey::Saving, 10),
            (BucketKey::Give, 5),
        ]))
    }
}

impl RatioConfig {
    pub fn get(&self, key: BucketKey) -> u8 {
        self.0.get(&key).copied().unwrap_or(0)
    }

    /// Sets one bucket's percent, rejecting values outside `0..=100`.
    pub fn set(&mut self, key: BucketKey, percent: i64) -> FundResult<()> {
        let value = u8::try_from(percent)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or(FundError::InvalidRange {
                bucket: key,
                percent,
            })?;
        self.0.insert(key, value);
        Ok(())
    }

    pub fn total(&self) -> u32 {
        self.0.values().map(|p| u32::from(*p)).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.total() == 100
    }

    pub fn iter(&self) -> impl Iterator<Item = (BucketKey, u8)> + '_ {
        self.0.iter().map(|(k, p)| (*k, *p))
    }
}

impl TryFrom<BTreeMap<BucketKey, u8>> for RatioConfig {
    type Error = String;

    fn try_from(map: BTreeMap<BucketKey, u8>) -> Result<Self, Self::Error> {
        if let Some(missing) = BucketKey::ALL.iter().find(|k| !map.contains_key(k)) {
            return Err(format!("missing ratio for {missing}"));
        }
        if let Some((key, p)) = map.iter().find(|(_, p)| **p > 100) {
            return Err(format!("ratio {p}% for {key} is outside 0..=100"));
        }
        Ok(Self(map))
    }
}

impl From<RatioConfig> for BTreeMap<BucketKey, u8> {
    fn from(config: RatioConfig) -> Self {
        config.0
    }
}
