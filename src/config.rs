//! Engine configuration, read from a JSON file with every field defaulted.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::MAX_LAG_MINUTES;

/// What baseline creation does when the schedule has negative float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeFloatPolicy {
    #[default]
    Reject,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub negative_float_policy: NegativeFloatPolicy,
    /// Extra attempts after a failed snapshot read.
    pub read_retries: u32,
    pub max_lag_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            negative_float_policy: NegativeFloatPolicy::Reject,
            read_retries: 1,
            max_lag_minutes: MAX_LAG_MINUTES,
        }
    }
}

impl EngineConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| EngineError::validation(format!("Cannot read config {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| EngineError::validation(format!("Invalid config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_LAG_MINUTES).contains(&self.max_lag_minutes) {
            return Err(EngineError::validation(format!(
                "max_lag_minutes must be within 0..={MAX_LAG_MINUTES}"
            )));
        }
        Ok(())
    }
}
