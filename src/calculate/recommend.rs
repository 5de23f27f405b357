//! Best-target selection and per-mob analysis.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::{
    completion_time, egg_kills_needed, kills_needed, time_to_kill, time_to_level,
    trophies_result, xp_needed, xp_requirement,
};
use crate::format::format_magnitude;
use crate::models::{Catalog, Character, Egg, Mob};

/// Cost of the selected egg expressed in kills of one mob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "kills", rename_all = "snake_case")]
pub enum EggCost {
    Kills(f64),
    /// The mob drops no trophies
    NotApplicable,
}

impl fmt::Display for EggCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EggCost::Kills(kills) => write!(f, "{}", format_magnitude(*kills)),
            EggCost::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// Derived numbers for one mob.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetReport {
    pub name: String,
    pub life: f64,
    pub trophies: f64,
    pub xp: f64,
    pub area: u32,

    /// Seconds per kill (0 when the character deals no damage)
    pub time_to_kill: f64,

    /// Seconds to finish the level; `None` if this mob grants no XP
    pub time_to_level: Option<f64>,

    /// Kills to finish the level; `None` if this mob grants no XP
    pub kills_needed: Option<f64>,

    /// Kills to afford the selected egg; `None` when no egg is selected
    pub egg_cost: Option<EggCost>,
}

/// The recommended grinding target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub name: String,
    pub time_to_level: f64,
    pub kills_needed: f64,
    pub trophies: f64,
    pub completes_at: Option<DateTime<Utc>>,
}

/// Full result of a recompute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub character: Character,
    pub xp_required: f64,
    pub xp_needed: f64,
    pub targets: Vec<TargetReport>,
    pub best: Option<Recommendation>,
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn best_target<'a>(
    mobs: &'a [Mob],
    character: &Character,
    xp_needed: f64,
) -> Option<(&'a Mob, f64)> {
    let mut best: Option<(&Mob, f64)> = None;

    for mob in mobs {
        let tta = time_to_kill(character.damage, mob.life);
        let tsn = time_to_level(xp_needed, mob.xp, tta);
        // Strict comparison: the earlier mob keeps a tie
        if tsn < best.map_or(f64::INFINITY, |(_, t)| t) {
            best = Some((mob, tsn));
        }
    }

    best
}

/// Select the mob with the shortest time to level.
///
/// Ties go to the mob that appears first. Returns `None` for an empty list or
/// when no mob grants experience.
pub fn select_best_target<'a>(
    mobs: &'a [Mob],
    character: &Character,
    xp_needed: f64,
) -> Option<&'a Mob> {
    best_target(mobs, character, xp_needed).map(|(mob, _)| mob)
}

/// Run every calculation for a character against the catalog.
pub fn analyze(
    catalog: &Catalog,
    character: &Character,
    egg: Option<&Egg>,
    now: DateTime<Utc>,
) -> Analysis {
    let xp_required = xp_requirement(character.level, &catalog.levels);
    let xp_needed = xp_needed(xp_required, character.collected_xp);
    let egg_price = egg.map(Egg::price_value);

    let targets = catalog
        .mobs
        .iter()
        .map(|mob| {
            let tta = time_to_kill(character.damage, mob.life);
            TargetReport {
                name: mob.name.clone(),
                life: mob.life,
                trophies: mob.trophies,
                xp: mob.xp,
                area: mob.area,
                time_to_kill: tta,
                time_to_level: finite(time_to_level(xp_needed, mob.xp, tta)),
                kills_needed: finite(kills_needed(xp_needed, mob.xp)),
                egg_cost: egg_price.map(|price| match egg_kills_needed(price, mob.trophies) {
                    Some(kills) => EggCost::Kills(kills),
                    None => EggCost::NotApplicable,
                }),
            }
        })
        .collect();

    let best = best_target(&catalog.mobs, character, xp_needed).map(|(mob, tsn)| {
        let kills = kills_needed(xp_needed, mob.xp);
        Recommendation {
            name: mob.name.clone(),
            time_to_level: tsn,
            kills_needed: kills,
            trophies: trophies_result(kills, mob.trophies),
            completes_at: completion_time(now, tsn),
        }
    });

    debug!(
        "Analyzed {} mobs for level {} (xp needed {}), best: {:?}",
        catalog.mobs.len(),
        character.level,
        xp_needed,
        best.as_ref().map(|b| b.name.as_str())
    );

    Analysis {
        character: *character,
        xp_required,
        xp_needed,
        targets,
        best,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LevelThreshold;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_select_best_target_picks_fastest() {
        let mobs = vec![
            Mob::new("Slow", 1000.0, 1.0, 10.0, 1),
            Mob::new("Fast", 100.0, 1.0, 10.0, 1),
        ];
        let character = Character::new(50.0, 1, 0.0);

        let best = select_best_target(&mobs, &character, 1000.0).unwrap();
        assert_eq!(best.name, "Fast");
    }

    #[test]
    fn test_select_best_target_tie_keeps_catalog_order() {
        // Same life/xp ratio, so identical time to level
        let mobs = vec![
            Mob::new("First", 100.0, 1.0, 10.0, 1),
            Mob::new("Second", 200.0, 5.0, 20.0, 2),
        ];
        let character = Character::new(10.0, 1, 0.0);

        let best = select_best_target(&mobs, &character, 500.0).unwrap();
        assert_eq!(best.name, "First");
    }

    #[test]
    fn test_select_best_target_empty() {
        let character = Character::new(10.0, 1, 0.0);
        assert!(select_best_target(&[], &character, 500.0).is_none());
    }

    #[test]
    fn test_select_best_target_no_xp_mobs() {
        let mobs = vec![
            Mob::new("Dummy", 100.0, 5.0, 0.0, 1),
            Mob::new("Crate", 10.0, 1.0, 0.0, 1),
        ];
        let character = Character::new(10.0, 1, 0.0);
        assert!(select_best_target(&mobs, &character, 500.0).is_none());
    }

    #[test]
    fn test_select_best_target_skips_xp_less_mob() {
        let mobs = vec![
            Mob::new("Dummy", 1.0, 5.0, 0.0, 1),
            Mob::new("Wolf", 500.0, 1.0, 25.0, 2),
        ];
        let character = Character::new(10.0, 1, 0.0);
        assert_eq!(
            select_best_target(&mobs, &character, 500.0).unwrap().name,
            "Wolf"
        );
    }

    #[test]
    fn test_analyze_full_report() {
        let catalog = Catalog {
            eggs: vec![Egg::new("Rare", "1k", 1)],
            mobs: vec![
                Mob::new("Rat", 100.0, 30.0, 300.0, 1),
                Mob::new("Ghost", 50.0, 0.0, 0.0, 2),
            ],
            levels: vec![LevelThreshold::new(2, "1.5k")],
        };
        let character = Character::new(50.0, 2, 500.0);

        let analysis = analyze(&catalog, &character, catalog.eggs.first(), now());

        assert_eq!(analysis.xp_required, 1500.0);
        assert_eq!(analysis.xp_needed, 1000.0);
        assert_eq!(analysis.targets.len(), 2);

        let rat = &analysis.targets[0];
        assert_eq!(rat.time_to_kill, 2.0);
        assert_eq!(rat.time_to_level, Some((1000.0 / 300.0) * 2.0));
        assert_eq!(rat.kills_needed, Some(4.0));
        assert_eq!(rat.egg_cost, Some(EggCost::Kills(34.0)));

        let ghost = &analysis.targets[1];
        assert_eq!(ghost.time_to_level, None);
        assert_eq!(ghost.kills_needed, None);
        assert_eq!(ghost.egg_cost, Some(EggCost::NotApplicable));

        let best = analysis.best.unwrap();
        assert_eq!(best.name, "Rat");
        assert_eq!(best.kills_needed, 4.0);
        assert_eq!(best.trophies, 120.0);
        assert_eq!(
            best.completes_at.unwrap().to_rfc3339(),
            "2024-06-01T12:00:06.667+00:00"
        );
    }

    #[test]
    fn test_analyze_without_egg_or_mobs() {
        let catalog = Catalog::default();
        let character = Character::new(10.0, 3, 0.0);

        let analysis = analyze(&catalog, &character, None, now());

        assert_eq!(analysis.xp_required, 3000.0);
        assert!(analysis.targets.is_empty());
        assert!(analysis.best.is_none());
    }

    #[test]
    fn test_egg_cost_display() {
        assert_eq!(EggCost::Kills(1500.0).to_string(), "1,500");
        assert_eq!(EggCost::NotApplicable.to_string(), "N/A");
    }
}
