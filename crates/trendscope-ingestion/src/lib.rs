//! trendscope-ingestion — Count table loading and normalisation.
//! - Raw CSV tables with whatever headers the source file uses
//! - Ordered column rules mapping those headers onto the canonical schema
//! - Permissive timestamp parsing
//! - Cumulative series per (technical element, group) partition
//! - Load cache keyed by (path, expected shape)

pub mod cache;
pub mod models;
pub mod normalise;
pub mod series;
pub mod table;

pub use cache::TableCache;
pub use models::{CanonicalRecord, CanonicalTable, ExpectedShape};
pub use normalise::{normalize, normalize_with, NormalizeOptions};
pub use series::{derive, DerivedRecord, DerivedTable, Measure, Overlay, Series};
pub use table::RawTable;
