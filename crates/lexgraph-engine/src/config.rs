//! Configuration for the processing engine

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime limits for one processing job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Whole-job timeout (seconds); a job past this is forced to FAILED
    pub job_timeout_secs: u64,
}

impl EngineConfig {
    /// Get the job timeout as a Duration
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.job_timeout_secs == 0 {
            return Err("job_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for EngineConfig {
    /// Default configuration: five-minute job budget
    fn default() -> Self {
        Self {
            job_timeout_secs: 300,
        }
    }
}
