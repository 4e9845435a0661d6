use serde::{Deserialize, Serialize};

use crate::config::{ensure_unit_interval, ConfigError};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Relative importance of the four sub-scores. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub skill: f64,
    pub experience: f64,
    pub domain: f64,
    pub quality: f64,
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.skill + self.experience + self.domain + self.quality
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skill: 0.5,
            experience: 0.2,
            domain: 0.15,
            quality: 0.15,
        }
    }
}

/// Rubric configuration for the FitScore engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub nice_to_have_bonus: f64,
    pub overqualified_floor: f64,
    pub overqualified_span_years: f64,
    pub quality_stability_share: f64,
    pub flag_penalty: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            nice_to_have_bonus: 0.1,
            overqualified_floor: 0.6,
            overqualified_span_years: 5.0,
            quality_stability_share: 0.5,
            flag_penalty: 0.25,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("weights.skill", self.weights.skill),
            ("weights.experience", self.weights.experience),
            ("weights.domain", self.weights.domain),
            ("weights.quality", self.weights.quality),
        ];
        for (field, value) in weights {
            ensure_unit_interval(field, value)?;
        }

        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightsDoNotSumToOne {
                section: "scoring",
                sum,
            });
        }

        ensure_unit_interval("nice_to_have_bonus", self.nice_to_have_bonus)?;
        ensure_unit_interval("overqualified_floor", self.overqualified_floor)?;
        ensure_unit_interval("quality_stability_share", self.quality_stability_share)?;
        ensure_unit_interval("flag_penalty", self.flag_penalty)?;

        if !(self.overqualified_span_years.is_finite() && self.overqualified_span_years > 0.0) {
            return Err(ConfigError::invalid(
                "overqualified_span_years",
                "must be a positive number of years",
            ));
        }

        Ok(())
    }
}
