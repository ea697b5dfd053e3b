//! trendscope-cli — Presentation layer for the trend dashboard.
//! Owns the load caches and turns canonical and scored tables into rows
//! printed as aligned text, JSON, or CSV.

pub mod dashboard;
pub mod render;

pub use dashboard::{shape_for, CountQuery, Dashboard, DifficultyQuery, DifficultyRows};
