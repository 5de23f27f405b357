//! Character snapshot used for a single recompute.

use serde::{Deserialize, Serialize};

use crate::format::{parse_int_prefix, parse_magnitude};

/// The player's current stats. Rebuilt from form input on every recompute,
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Damage dealt per second
    pub damage: f64,

    /// Current level (at least 1)
    pub level: u32,

    /// Experience already collected towards the current level
    pub collected_xp: f64,
}

impl Character {
    pub fn new(damage: f64, level: u32, collected_xp: f64) -> Self {
        Self {
            damage: damage.max(0.0),
            level: level.max(1),
            collected_xp: collected_xp.max(0.0),
        }
    }

    /// Build a character from raw form fields.
    ///
    /// Damage and XP accept magnitude strings ("6M"); the level takes the
    /// leading integer and defaults to 1.
    pub fn from_input(damage: &str, level: &str, collected_xp: &str) -> Self {
        let level = parse_int_prefix(level)
            .map(|l| l.clamp(1, i64::from(u32::MAX)) as u32)
            .unwrap_or(1);
        Self::new(parse_magnitude(damage), level, parse_magnitude(collected_xp))
    }
}
