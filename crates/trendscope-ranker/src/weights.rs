//! Weight vector for the Composite Score.

use serde::{Deserialize, Serialize};
use trendscope_common::ScoringConfig;

/// Weights of the three normalised components.
///
/// The nominal weights (0.35 / 0.50 / 0.20) add up to 1.05; the scorer
/// always works with the renormalised vector so that composites stay in
/// [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    /// Technology Readiness Level
    pub trl: f64,
    /// Technical Feasibility
    pub technical: f64,
    /// Social Feasibility, inverted
    pub social: f64,
}

impl Default for WeightVector {
    fn default() -> Self {
        Self {
            trl:       0.35,
            technical: 0.50,
            social:    0.20,
        }
    }
}

impl From<&ScoringConfig> for WeightVector {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            trl: config.trl_weight,
            technical: config.technical_weight,
            social: config.social_weight,
        }
    }
}

impl WeightVector {
    pub fn sum(&self) -> f64 {
        self.trl + self.technical + self.social
    }

    /// Validate that all weights sum to ~1.0
    pub fn validate(&self) -> bool {
        (self.sum() - 1.0).abs() < 1e-6
    }

    /// Renormalise weights so they sum to 1.0
    pub fn normalise(&mut self) {
        let sum = self.sum();
        if sum > 0.0 {
            self.trl       /= sum;
            self.technical /= sum;
            self.social    /= sum;
        }
    }

    pub fn normalised(mut self) -> Self {
        self.normalise();
        self
    }

    /// Convert to array for iteration.
    pub fn as_array(&self) -> [f64; 3] {
        [self.trl, self.technical, self.social]
    }
}
