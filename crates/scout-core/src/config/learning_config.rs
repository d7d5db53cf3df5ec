use serde::{Deserialize, Serialize};

use super::defaults;

/// Meta-learner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Historical samples a domain needs before empirical depth overrides rules.
    pub min_depth_samples: usize,
    /// Samples each depth needs to be considered.
    pub min_samples_per_depth: usize,
    /// Success rate the best depth must exceed.
    pub min_depth_success_rate: f64,
    /// Infer outcomes from session state when no explicit feedback arrives.
    pub implicit_inference_enabled: bool,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            min_depth_samples: defaults::DEFAULT_MIN_DEPTH_SAMPLES,
            min_samples_per_depth: defaults::DEFAULT_MIN_SAMPLES_PER_DEPTH,
            min_depth_success_rate: defaults::DEFAULT_MIN_DEPTH_SUCCESS_RATE,
            implicit_inference_enabled: true,
        }
    }
}
