//! Engine configuration
//!
//! Loaded from a JSON file. Every field has a default, so `{}` is a valid
//! configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{UpdateError, UpdateResult};
use crate::observability::{log_event_with_fields, Event, Severity};
use crate::path::DEFAULT_MAX_PATH_DEPTH;
use crate::rules::ValidationPolicy;

/// Upper bound accepted for `max_path_depth`
const MAX_PATH_DEPTH_LIMIT: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Which operands skip rule validation
    #[serde(default)]
    pub validation_policy: ValidationPolicy,

    /// Hand `$default`/`$trim` normalized operands to the operator
    #[serde(default = "default_apply_normalized_operands")]
    pub apply_normalized_operands: bool,

    /// Maximum number of segments in a field path
    #[serde(default = "default_max_path_depth")]
    pub max_path_depth: usize,

    /// Seed for `$random`; unseeded engines use the thread RNG
    #[serde(default)]
    pub random_seed: Option<u64>,

    #[serde(default)]
    pub log_level: Severity,
}

fn default_apply_normalized_operands() -> bool {
    true
}

fn default_max_path_depth() -> usize {
    DEFAULT_MAX_PATH_DEPTH
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validation_policy: ValidationPolicy::default(),
            apply_normalized_operands: default_apply_normalized_operands(),
            max_path_depth: default_max_path_depth(),
            random_seed: None,
            log_level: Severity::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> UpdateResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            UpdateError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config = Self::from_json_str(&content)?;

        let shown = path.display().to_string();
        let depth = config.max_path_depth.to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", shown.as_str()), ("max_path_depth", depth.as_str())],
        );

        Ok(config)
    }

    /// Parses and validates configuration text
    pub fn from_json_str(content: &str) -> UpdateResult<Self> {
        let config: EngineConfig = serde_json::from_str(content)
            .map_err(|e| UpdateError::Config(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> UpdateResult<()> {
        if self.max_path_depth == 0 {
            return Err(UpdateError::Config("max_path_depth must be > 0".to_string()));
        }
        if self.max_path_depth > MAX_PATH_DEPTH_LIMIT {
            return Err(UpdateError::Config(format!(
                "max_path_depth must be <= {}, got {}",
                MAX_PATH_DEPTH_LIMIT, self.max_path_depth
            )));
        }
        Ok(())
    }
}
