//! trendscope-ranker — Technical difficulty scoring.
//! Normalises TRL / Technical Feasibility / Social Feasibility ratings and
//! blends them into a Composite Score per technical element × industry or
//! company, then serves filtered views over the scored table.

pub mod normalise;
pub mod scorer;
pub mod views;
pub mod weights;

pub use scorer::{
    load_difficulty, score, score_dimensions, Dimension, Metric, ScoredDifficultyRecord,
    ScoredDifficultyTable,
};
pub use views::{BarRow, RadarRow, ScoreRow, Selection};
pub use weights::WeightVector;
