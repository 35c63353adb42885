use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FundError;

/// One jar in the fixed six-way partition of money.
///
/// Declaration order is display order; `Ord` follows it so maps keyed by
/// `BucketKey` iterate the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketKey {
    Necessity,
    Education,
    Enjoyment,
    Investment,
    Saving,
    Give,
}

impl BucketKey {
    pub const ALL: [BucketKey; 6] = [
        BucketKey::Necessity,
        BucketKey::Education,
        BucketKey::Enjoyment,
        BucketKey::Investment,
        BucketKey::Saving,
        BucketKey::Give,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Necessity => "necessity",
            Self::Education => "education",
            Self::Enjoyment => "enjoyment",
            Self::Investment => "investment",
            Self::Saving => "saving",
            Self::Give => "give",
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BucketKey {
    type Err = FundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        BucketKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| FundError::InvalidBucket(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        assert_eq!("saving".parse::<BucketKey>().unwrap(), BucketKey::Saving);
        assert_eq!(" Give ".parse::<BucketKey>().unwrap(), BucketKey::Give);
    }

    #[test]
    fn rejects_unknown_name() {
        let err = "rent".parse::<BucketKey>().unwrap_err();
        assert!(matches!(err, FundError::InvalidBucket(ref n) if n == "rent"));
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&BucketKey::Investment).unwrap();
        assert_eq!(json, "\"investment\"");
    }
}
