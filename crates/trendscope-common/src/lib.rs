//! trendscope-common — Shared errors and configuration used across all trendscope crates.

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{DashboardConfig, DataConfig, DisplayConfig, Domain, OutputFormat, ScoringConfig, View};
pub use error::{Result, TrendError};
