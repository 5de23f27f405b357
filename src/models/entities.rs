//! Catalog entities: mobs, eggs and level thresholds.

use serde::{Deserialize, Serialize};

use crate::format::parse_magnitude;

/// An enemy that can be farmed for experience and trophies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mob {
    /// Display name, unique within a catalog (case-insensitive)
    pub name: String,

    /// Total life to deplete
    pub life: f64,

    /// Trophies dropped per kill
    pub trophies: f64,

    /// Experience granted per kill
    pub xp: f64,

    /// Area where the mob is found
    pub area: u32,
}

impl Mob {
    pub fn new(name: impl Into<String>, life: f64, trophies: f64, xp: f64, area: u32) -> Self {
        Self {
            name: name.into(),
            life,
            trophies,
            xp,
            area,
        }
    }

    /// Case-insensitive name comparison used for uniqueness checks.
    pub fn same_name(&self, other: &str) -> bool {
        self.name.trim().to_lowercase() == other.trim().to_lowercase()
    }
}

/// A reward item bought with trophies.
///
/// The price keeps the text it was entered with ("1.5M") and is parsed
/// when a calculation needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Egg {
    pub name: String,
    pub price: String,
    pub area: u32,
}

impl Egg {
    pub fn new(name: impl Into<String>, price: impl Into<String>, area: u32) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            area,
        }
    }

    /// Parsed price in trophies.
    pub fn price_value(&self) -> f64 {
        parse_magnitude(&self.price)
    }
}

/// XP required to complete a given level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelThreshold {
    pub level: u32,
    pub xp_required: String,
}

impl LevelThreshold {
    pub fn new(level: u32, xp_required: impl Into<String>) -> Self {
        Self {
            level,
            xp_required: xp_required.into(),
        }
    }

    /// Parsed XP requirement.
    pub fn xp_value(&self) -> f64 {
        parse_magnitude(&self.xp_required)
    }
}
