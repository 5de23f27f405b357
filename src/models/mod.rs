//! Core data models for the planner.

mod catalog;
mod character;
mod entities;

pub use catalog::*;
pub use character::*;
pub use entities::*;
