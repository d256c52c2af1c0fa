use std::collections::BTreeMap;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Normalized fortress identity.
///
/// The server emits ids both as JSON numbers and as numeric strings (map keys,
/// `paths` entries). Every id crossing into the client goes through this type
/// so comparisons never mix representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FortressId(pub u32);

impl fmt::Display for FortressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FortressIdError {
    #[error("fortress id cannot be empty")]
    Empty,
    #[error("invalid fortress id '{raw}': {source}")]
    NotNumeric {
        raw: String,
        #[source]
        source: ParseIntError,
    },
    #[error("fortress id {value} is out of range")]
    OutOfRange { value: u64 },
}

impl FromStr for FortressId {
    type Err = FortressIdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FortressIdError::Empty);
        }
        trimmed
            .parse::<u32>()
            .map(FortressId)
            .map_err(|source| FortressIdError::NotNumeric {
                raw: trimmed.to_string(),
                source,
            })
    }
}

impl TryFrom<u64> for FortressId {
    type Error = FortressIdError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .map(FortressId)
            .map_err(|_| FortressIdError::OutOfRange { value })
    }
}

impl<'de> Deserialize<'de> for FortressId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawFortressId {
            Number(u64),
            Text(String),
        }

        match RawFortressId::deserialize(deserializer)? {
            RawFortressId::Number(value) => FortressId::try_from(value).map_err(de::Error::custom),
            RawFortressId::Text(raw) => raw.parse().map_err(de::Error::custom),
        }
    }
}

pub type FortressMap = BTreeMap<FortressId, Fortress>;

const DEFAULT_TIER: u32 = 1;

fn default_tier() -> u32 {
    DEFAULT_TIER
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fortress {
    pub id: FortressId,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub units: f64,
    #[serde(default = "default_tier")]
    pub tier: u32,
    #[serde(default)]
    pub paths: Vec<FortressId>,
    #[serde(default)]
    pub special_active: bool,
    #[serde(default)]
    pub is_capital: bool,
    #[serde(default, rename = "type")]
    pub structure: Option<String>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub land_type: Option<String>,
}

impl Fortress {
    pub fn neutral(id: FortressId) -> Self {
        Self {
            id,
            owner: None,
            units: 0.0,
            tier: DEFAULT_TIER,
            paths: Vec::new(),
            special_active: false,
            is_capital: false,
            structure: None,
            race: None,
            land_type: None,
        }
    }

    pub fn is_owned_by(&self, player: &str) -> bool {
        self.owner.as_deref() == Some(player)
    }

    pub fn is_neutral(&self) -> bool {
        self.owner.is_none()
    }

    pub fn has_path_to(&self, target: FortressId) -> bool {
        self.paths.contains(&target)
    }

    /// True while another outgoing path fits under the tier cap.
    pub fn has_free_path_slot(&self) -> bool {
        self.paths.len() < self.tier as usize
    }

    pub fn owner_label(&self) -> &str {
        self.owner.as_deref().unwrap_or("Neutral")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fortress_id_accepts_numbers_and_numeric_strings() {
        let from_number: FortressId = serde_json::from_value(json!(42)).expect("number id");
        let from_text: FortressId = serde_json::from_value(json!("42")).expect("string id");
        assert_eq!(from_number, FortressId(42));
        assert_eq!(from_number, from_text);
    }

    #[test]
    fn fortress_id_rejects_garbage() {
        let error = serde_json::from_value::<FortressId>(json!("north")).expect_err("bad id");
        assert!(error.to_string().contains("invalid fortress id 'north'"));
        assert_eq!("  ".parse::<FortressId>(), Err(FortressIdError::Empty));
        assert!(matches!(
            FortressId::try_from(u64::MAX),
            Err(FortressIdError::OutOfRange { .. })
        ));
    }

    #[test]
    fn fortress_decodes_mixed_path_ids_and_defaults() {
        let fortress: Fortress = serde_json::from_value(json!({
            "id": 5,
            "owner": "Alice",
            "units": 12.5,
            "paths": ["9", 7],
            "type": "Keep"
        }))
        .expect("fortress");

        assert_eq!(fortress.tier, 1);
        assert_eq!(fortress.paths, vec![FortressId(9), FortressId(7)]);
        assert_eq!(fortress.structure.as_deref(), Some("Keep"));
        assert!(fortress.is_owned_by("Alice"));
        assert!(!fortress.is_owned_by("Bob"));
        assert!(!fortress.has_free_path_slot());
    }

    #[test]
    fn neutral_fortress_has_one_free_slot() {
        let fortress = Fortress::neutral(FortressId(3));
        assert!(fortress.is_neutral());
        assert_eq!(fortress.owner_label(), "Neutral");
        assert!(fortress.has_free_path_slot());
        assert!(!fortress.has_path_to(FortressId(4)));
    }
}
