use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrendError {
    /// A column the pipeline needs could not be found under any known alias.
    #[error("no column for {concept} (columns found: {})", found.join(", "))]
    Schema { concept: String, found: Vec<String> },

    #[error("difficulty table has no rating columns for dimension '{dimension}' (missing: {})", missing.join(", "))]
    MissingDimensionColumns { dimension: String, missing: Vec<String> },

    #[error("no technical elements selected; select at least one technical element")]
    EmptySelection,

    #[error("unknown technical element: {0}")]
    UnknownTechnicalElement(String),

    #[error("invalid value {value:?} in column '{column}' at row {row}")]
    InvalidValue { column: String, row: usize, value: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TrendError {
    pub fn schema(concept: impl Into<String>, found: &[String]) -> Self {
        TrendError::Schema {
            concept: concept.into(),
            found: found.to_vec(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrendError>;
