//! Configuration types for the healthwatch client

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_project_name")]
    pub project_name: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_period_limit")]
    pub period_limit: u32,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project_name: default_project_name(),
            request_timeout_ms: default_request_timeout_ms(),
            period_limit: default_period_limit(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Reject values the client cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        if self.base_url.is_empty() {
            return Err(crate::HealthwatchError::Config(
                "base_url must not be empty".to_string(),
            ));
        }
        if self.project_name.is_empty() {
            return Err(crate::HealthwatchError::Config(
                "project_name must not be empty".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(crate::HealthwatchError::Config(
                "request_timeout_ms must be positive".to_string(),
            ));
        }
        if self.period_limit == 0 {
            return Err(crate::HealthwatchError::Config(
                "period_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Toast display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_display_duration_ms")]
    pub display_duration_ms: u64,
    #[serde(default)]
    pub max_live: Option<usize>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            display_duration_ms: default_display_duration_ms(),
            max_live: None,
        }
    }
}

impl NotificationConfig {
    pub fn display_duration(&self) -> Duration {
        Duration::from_millis(self.display_duration_ms)
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_project_name() -> String {
    "default".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_period_limit() -> u32 {
    90
}

fn default_display_duration_ms() -> u64 {
    2000
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::HealthwatchError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
