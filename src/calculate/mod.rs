//! Progression calculation engine.
//!
//! Pure functions for derived grinding metrics:
//! - Time to kill a mob and time to reach the next level
//! - Kill counts, trophy totals and egg costs
//! - XP requirements from level thresholds
//!
//! Target selection and the full per-mob analysis live in [`recommend`].

pub mod recommend;

use chrono::{DateTime, Duration, Utc};

use crate::models::LevelThreshold;

pub use recommend::{analyze, select_best_target, Analysis, Recommendation, TargetReport};

/// XP requirement used when a level has no configured threshold.
pub const FALLBACK_XP_PER_LEVEL: f64 = 1000.0;

/// Calculate time to kill (seconds) from damage per second and mob life.
///
/// Returns `0.0` when the character deals no damage. That value is a sentinel
/// for "cannot kill", not a real duration. There is no one-hit clamp: a mob
/// with less life than one second of damage takes a fraction of a second.
pub fn time_to_kill(damage: f64, life: f64) -> f64 {
    if damage <= 0.0 {
        0.0
    } else {
        life / damage
    }
}

/// Calculate the number of kills needed to collect `xp_needed`.
///
/// Rounded up: this is how many fights it takes. Infinite when the mob
/// grants no experience.
pub fn kills_needed(xp_needed: f64, mob_xp: f64) -> f64 {
    if mob_xp <= 0.0 {
        f64::INFINITY
    } else {
        (xp_needed / mob_xp).ceil()
    }
}

/// Calculate time to level (seconds) by farming a single mob.
///
/// Uses the continuous kill estimate rather than [`kills_needed`], so the time
/// is smooth while the kill count is a ceiling. Infinite when the mob grants
/// no experience.
pub fn time_to_level(xp_needed: f64, mob_xp: f64, tta: f64) -> f64 {
    if mob_xp <= 0.0 {
        f64::INFINITY
    } else {
        (xp_needed / mob_xp) * tta
    }
}

/// Total trophies collected over a number of kills.
pub fn trophies_result(kills: f64, trophies: f64) -> f64 {
    kills * trophies
}

/// XP required for `level`: the configured threshold if there is an exact
/// match, otherwise `level * 1000`.
pub fn xp_requirement(level: u32, thresholds: &[LevelThreshold]) -> f64 {
    thresholds
        .iter()
        .find(|t| t.level == level)
        .map(LevelThreshold::xp_value)
        .unwrap_or_else(|| f64::from(level) * FALLBACK_XP_PER_LEVEL)
}

/// XP still missing for the current level, never negative.
pub fn xp_needed(xp_requirement: f64, collected_xp: f64) -> f64 {
    (xp_requirement - collected_xp).max(0.0)
}

/// Kills of a mob needed to afford an egg.
///
/// `None` when the mob drops no trophies (displayed as "N/A").
pub fn egg_kills_needed(egg_price: f64, trophies: f64) -> Option<f64> {
    if trophies <= 0.0 {
        None
    } else {
        Some((egg_price / trophies).ceil())
    }
}

/// Wall-clock time at which a grind of `seconds` started at `now` finishes.
///
/// `None` for an endless grind or a duration chrono cannot represent.
pub fn completion_time(now: DateTime<Utc>, seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let millis = (seconds * 1000.0).round();
    if millis > i64::MAX as f64 {
        return None;
    }
    let offset = Duration::try_milliseconds(millis as i64)?;
    now.checked_add_signed(offset)
}
