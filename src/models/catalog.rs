//! The catalog and its durable snapshot shape.

use serde::{Deserialize, Serialize};

use super::{Egg, LevelThreshold, Mob};

/// Mobs, eggs and level thresholds, in insertion order.
///
/// Order matters for display and for selecting an egg by index; the
/// calculations themselves do not depend on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub eggs: Vec<Egg>,

    #[serde(default)]
    pub mobs: Vec<Mob>,

    #[serde(default)]
    pub levels: Vec<LevelThreshold>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.eggs.is_empty() && self.mobs.is_empty() && self.levels.is_empty()
    }
}

/// A versioned catalog as written to durable storage.
///
/// Serialized flat: `{"eggs": [...], "mobs": [...], "levels": [...], "version": 3}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub catalog: Catalog,

    /// Incremented on every successful save
    #[serde(default)]
    pub version: u64,
}

impl Snapshot {
    pub fn new(catalog: Catalog, version: u64) -> Self {
        Self { catalog, version }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_catalog() -> Catalog {
        Catalog {
            eggs: vec![Egg::new("Common", "500", 1)],
            mobs: vec![Mob::new("Rat", 120.0, 2.0, 15.0, 1)],
            levels: vec![LevelThreshold::new(2, "1.2k")],
        }
    }

    #[test]
    fn test_snapshot_json_is_flat() {
        let snapshot = Snapshot::new(sample_catalog(), 7);
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["version"], 7);
        assert_eq!(json["mobs"][0]["name"], "Rat");
        assert_eq!(json["eggs"][0]["price"], "500");
        assert_eq!(json["levels"][0]["xpRequired"], "1.2k");
    }

    #[test]
    fn test_snapshot_round_trip() {
        let snapshot = Snapshot::new(sample_catalog(), 3);
        let text = serde_json::to_string_pretty(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn test_snapshot_missing_keys_default() {
        let parsed: Snapshot = serde_json::from_str(r#"{"mobs": []}"#).unwrap();
        assert!(parsed.catalog.is_empty());
        assert_eq!(parsed.version, 0);
    }
}
