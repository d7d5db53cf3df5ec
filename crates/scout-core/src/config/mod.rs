pub mod defaults;
mod dedup_config;
mod injection_config;
mod learning_config;
mod observability_config;
mod session_config;
mod settings;
mod storage_config;
mod task_config;
mod trigger_config;

pub use dedup_config::DedupConfig;
pub use injection_config::{InjectionConfig, RelevanceFallback};
pub use learning_config::LearningConfig;
pub use observability_config::ObservabilityConfig;
pub use session_config::SessionConfig;
pub use settings::SettingsPatch;
pub use storage_config::StorageConfig;
pub use task_config::TaskConfig;
pub use trigger_config::TriggerConfig;

use serde::{Deserialize, Serialize};

use crate::errors::{ScoutError, ScoutResult};

/// Top-level configuration, one section per subsystem.
/// Every section is `#[serde(default)]`, so a partial TOML file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub trigger: TriggerConfig,
    pub dedup: DedupConfig,
    pub tasks: TaskConfig,
    pub injection: InjectionConfig,
    pub learning: LearningConfig,
    pub observability: ObservabilityConfig,
}

impl ScoutConfig {
    /// Parse a TOML document. Missing keys fall back to defaults.
    pub fn from_toml(toml_str: &str) -> ScoutResult<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ScoutError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to TOML (used by the settings endpoint).
    pub fn to_toml(&self) -> ScoutResult<String> {
        toml::to_string_pretty(self).map_err(|e| ScoutError::ConfigError(e.to_string()))
    }

    /// Reject values no subsystem can work with.
    pub fn validate(&self) -> ScoutResult<()> {
        let unit = |name: &str, v: f64| -> ScoutResult<()> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ScoutError::ConfigError(format!(
                    "{name} must be within [0, 1], got {v}"
                )))
            }
        };
        unit("dedup.history_similarity", self.dedup.history_similarity)?;
        unit("dedup.session_similarity", self.dedup.session_similarity)?;
        unit("dedup.inflight_similarity", self.dedup.inflight_similarity)?;
        unit("dedup.semantic_threshold", self.dedup.semantic_threshold)?;
        unit("injection.min_candidate_score", self.injection.min_candidate_score)?;
        unit("injection.relevance_threshold", self.injection.relevance_threshold)?;
        unit(
            "learning.min_depth_success_rate",
            self.learning.min_depth_success_rate,
        )?;
        if self.tasks.max_concurrent == 0 {
            return Err(ScoutError::ConfigError(
                "tasks.max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.session.window_size == 0 {
            return Err(ScoutError::ConfigError(
                "session.window_size must be at least 1".to_string(),
            ));
        }
        if self.session.stuck_threshold == 0 {
            return Err(ScoutError::ConfigError(
                "session.stuck_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
