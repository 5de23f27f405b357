//! Parsing and display helpers for human-entered values.
//!
//! - **number**: magnitude strings ("6M", "3.5k") and thousands grouping
//! - **time**: durations and wall-clock times in the "1h 2min 3s" style

pub mod number;
pub mod time;

pub use number::{format_magnitude, parse_int_prefix, parse_magnitude};
pub use time::{format_clock, format_duration};
