//! # Grind Planner
//!
//! Progression planner for grinding games: how long each mob takes to kill,
//! how long leveling takes per mob, and which mob to farm.
//!
//! ## Architecture
//!
//! - **format**: Magnitude strings ("6M") and duration formatting
//! - **calculate**: Time-to-kill / time-to-level math and target selection
//! - **models**: Character, mobs, eggs, level thresholds, catalog snapshots
//! - **catalog**: Validated catalog mutations
//! - **storage**: Durable snapshot backends (JSON file, memory)
//! - **sync**: Versioned load/save with retry and conflict detection
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod catalog;
pub mod config;
pub mod format;
pub mod models;
pub mod storage;
pub mod sync;

pub use models::*;
