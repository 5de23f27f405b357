//! Validated catalog mutations.
//!
//! `CatalogStore` owns the in-memory catalog and is the only way to add
//! entries to it. Every add validates first and leaves the catalog untouched
//! on error. Mutation takes `&mut self`; share a store behind a mutex when
//! several tasks need to write.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::format::{parse_int_prefix, parse_magnitude};
use crate::models::{Catalog, Egg, LevelThreshold, Mob};

/// Which collection an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Mob,
    Egg,
    Level,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Mob => write!(f, "mob"),
            EntryKind::Egg => write!(f, "egg"),
            EntryKind::Level => write!(f, "level"),
        }
    }
}

/// Reasons an entry is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Duplicate {kind}: {key}")]
    DuplicateEntry { kind: EntryKind, key: String },

    #[error("{0} name must not be empty")]
    EmptyName(EntryKind),

    #[error("Invalid level number: {0} (must be 1 or higher)")]
    InvalidLevel(String),

    #[error("{field} must not be negative (got {value})")]
    NegativeValue { field: &'static str, value: f64 },
}

/// Raw form fields for a new mob.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewMob {
    pub name: String,
    pub life: String,
    pub trophies: String,
    pub xp: String,
    #[serde(default)]
    pub area: String,
}

/// Raw form fields for a new egg.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEgg {
    pub name: String,
    pub price: String,
    #[serde(default)]
    pub area: String,
}

/// Raw form fields for a new level threshold.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLevel {
    pub level: String,
    pub xp_required: String,
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value < 0.0 {
        Err(ValidationError::NegativeValue { field, value })
    } else {
        Ok(value)
    }
}

fn parse_area(raw: &str) -> Result<u32, ValidationError> {
    let area = parse_int_prefix(raw).unwrap_or(0);
    if area < 0 {
        return Err(ValidationError::NegativeValue {
            field: "area",
            value: area as f64,
        });
    }
    Ok(u32::try_from(area).unwrap_or(u32::MAX))
}

fn require_name(kind: EntryKind, name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        Err(ValidationError::EmptyName(kind))
    } else {
        Ok(name.to_string())
    }
}

/// The authoritative in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    catalog: Catalog,
}

/// Wrap a catalog as loaded from storage, without re-validating it.
impl From<Catalog> for CatalogStore {
    fn from(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-validate a whole catalog (e.g. one submitted by a client).
    ///
    /// Entries are checked in order, so the first duplicate of a mob name or
    /// level number is the one reported.
    pub fn from_catalog(catalog: Catalog) -> Result<Self, ValidationError> {
        let mut store = Self::new();
        for mob in catalog.mobs {
            store.insert_mob(mob)?;
        }
        for egg in catalog.eggs {
            store.insert_egg(egg)?;
        }
        for level in catalog.levels {
            store.insert_level(level)?;
        }
        Ok(store)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn into_catalog(self) -> Catalog {
        self.catalog
    }

    /// Add a mob from form input. Life, trophies and XP are parsed here.
    pub fn add_mob(&mut self, input: NewMob) -> Result<&Mob, ValidationError> {
        let mob = Mob::new(
            require_name(EntryKind::Mob, &input.name)?,
            parse_magnitude(&input.life),
            parse_magnitude(&input.trophies),
            parse_magnitude(&input.xp),
            parse_area(&input.area)?,
        );
        self.insert_mob(mob)
    }

    /// Add an egg from form input. The price text is kept as entered.
    pub fn add_egg(&mut self, input: NewEgg) -> Result<&Egg, ValidationError> {
        let egg = Egg::new(
            require_name(EntryKind::Egg, &input.name)?,
            input.price.trim(),
            parse_area(&input.area)?,
        );
        self.insert_egg(egg)
    }

    /// Add a level threshold from form input. The XP text is kept as entered.
    pub fn add_level(&mut self, input: NewLevel) -> Result<&LevelThreshold, ValidationError> {
        let level = parse_int_prefix(&input.level)
            .filter(|l| *l >= 1)
            .and_then(|l| u32::try_from(l).ok())
            .ok_or_else(|| ValidationError::InvalidLevel(input.level.trim().to_string()))?;
        self.insert_level(LevelThreshold::new(level, input.xp_required.trim()))
    }

    fn insert_mob(&mut self, mob: Mob) -> Result<&Mob, ValidationError> {
        require_name(EntryKind::Mob, &mob.name)?;
        non_negative("life", mob.life)?;
        non_negative("trophies", mob.trophies)?;
        non_negative("xp", mob.xp)?;

        if self.catalog.mobs.iter().any(|m| m.same_name(&mob.name)) {
            return Err(ValidationError::DuplicateEntry {
                kind: EntryKind::Mob,
                key: mob.name,
            });
        }

        info!("Added mob '{}' (area {})", mob.name, mob.area);
        self.catalog.mobs.push(mob);
        Ok(&self.catalog.mobs[self.catalog.mobs.len() - 1])
    }

    fn insert_egg(&mut self, egg: Egg) -> Result<&Egg, ValidationError> {
        require_name(EntryKind::Egg, &egg.name)?;
        non_negative("price", egg.price_value())?;

        info!("Added egg '{}' (price {})", egg.name, egg.price);
        self.catalog.eggs.push(egg);
        Ok(&self.catalog.eggs[self.catalog.eggs.len() - 1])
    }

    fn insert_level(&mut self, level: LevelThreshold) -> Result<&LevelThreshold, ValidationError> {
        if level.level < 1 {
            return Err(ValidationError::InvalidLevel(level.level.to_string()));
        }
        non_negative("xpRequired", level.xp_value())?;

        if self.catalog.levels.iter().any(|l| l.level == level.level) {
            return Err(ValidationError::DuplicateEntry {
                kind: EntryKind::Level,
                key: level.level.to_string(),
            });
        }

        info!("Added level {} (xp {})", level.level, level.xp_required);
        self.catalog.levels.push(level);
        Ok(&self.catalog.levels[self.catalog.levels.len() - 1])
    }
}
