//! # Configuration
//!
//! [`ForgeConfig`] is assembled in layers: built-in defaults, then an
//! optional TOML file, then environment variables, then validation.
//!
//! ## Environment Variables
//!
//! - `FORGEFLOW_REGISTRY_PATH` - Registry JSON file (default: `forgeflow_registry.json`)
//! - `FORGEFLOW_ARTIFACTS_DIR` - Directory for generated artifacts (default: `generated`)
//! - `FORGEFLOW_MAX_REPLAN_CYCLES` - Synthesize/replan rounds per request (default: 3)
//! - `FORGEFLOW_STEP_ERROR_POLICY` - `continue` or `abort` (default: `continue`)
//! - `FORGEFLOW_ORACLE_URL` - Completion endpoint; unset disables the oracle
//! - `FORGEFLOW_ORACLE_MODEL` - Model name sent to the endpoint (default: `default`)
//! - `FORGEFLOW_ORACLE_TIMEOUT_SECS` - Per-call oracle timeout (default: 30)
//! - `FORGEFLOW_DEADLINE_SECS` - Overall deadline for one orchestration request

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use forgeflow_core::ForgeError;

use crate::executor::StepErrorPolicy;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable '{key}': {message}")]
    InvalidEnvVar { key: String, message: String },

    #[error("Failed to load config file {path}: {message}")]
    File { path: PathBuf, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for ForgeError {
    fn from(err: ConfigError) -> Self {
        ForgeError::Config(err.to_string())
    }
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ForgeConfig {
    pub registry_path: PathBuf,
    pub artifacts_dir: PathBuf,
    pub max_replan_cycles: u32,
    pub step_error_policy: StepErrorPolicy,
    pub oracle_url: Option<String>,
    pub oracle_model: String,
    pub oracle_timeout_secs: u64,
    pub deadline_secs: Option<u64>,
}

impl ForgeConfig {
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

impl Default for ForgeConfig {
    fn default() -> Self {
        ForgeConfigBuilder::default().into_config()
    }
}

/// Optional overrides read from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForgeConfigFile {
    pub registry_path: Option<PathBuf>,
    pub artifacts_dir: Option<PathBuf>,
    pub max_replan_cycles: Option<u32>,
    pub step_error_policy: Option<StepErrorPolicy>,
    pub oracle_url: Option<String>,
    pub oracle_model: Option<String>,
    pub oracle_timeout_secs: Option<u64>,
    pub deadline_secs: Option<u64>,
}

/// Builder for [`ForgeConfig`] with file and environment support
#[derive(Debug, Clone)]
pub struct ForgeConfigBuilder {
    registry_path: PathBuf,
    artifacts_dir: PathBuf,
    max_replan_cycles: u32,
    step_error_policy: StepErrorPolicy,
    oracle_url: Option<String>,
    oracle_model: String,
    oracle_timeout_secs: u64,
    deadline_secs: Option<u64>,
}

impl Default for ForgeConfigBuilder {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from("forgeflow_registry.json"),
            artifacts_dir: PathBuf::from("generated"),
            max_replan_cycles: 3,
            step_error_policy: StepErrorPolicy::ContinueOnError,
            oracle_url: None,
            oracle_model: "default".to_string(),
            oracle_timeout_secs: 30,
            deadline_secs: None,
        }
    }
}

impl ForgeConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any environment variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Apply a TOML config file on top of the current values.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or contains unknown keys.
    pub fn apply_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let file: ForgeConfigFile = toml::from_str(&text).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = ?path, "Loaded config file");
        Ok(self.apply_overrides(file))
    }

    /// Apply a set of overrides; `None` fields keep the current value.
    #[must_use]
    pub fn apply_overrides(mut self, file: ForgeConfigFile) -> Self {
        if let Some(v) = file.registry_path {
            self.registry_path = v;
        }
        if let Some(v) = file.artifacts_dir {
            self.artifacts_dir = v;
        }
        if let Some(v) = file.max_replan_cycles {
            self.max_replan_cycles = v;
        }
        if let Some(v) = file.step_error_policy {
            self.step_error_policy = v;
        }
        if let Some(v) = file.oracle_url {
            self.oracle_url = Some(v);
        }
        if let Some(v) = file.oracle_model {
            self.oracle_model = v;
        }
        if let Some(v) = file.oracle_timeout_secs {
            self.oracle_timeout_secs = v;
        }
        if let Some(v) = file.deadline_secs {
            self.deadline_secs = Some(v);
        }
        self
    }

    /// Apply `FORGEFLOW_*` environment variables on top of the current values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any environment variable has an invalid value.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Some(path) = get_env_string("FORGEFLOW_REGISTRY_PATH") {
            self.registry_path = PathBuf::from(path);
        }
        if let Some(dir) = get_env_string("FORGEFLOW_ARTIFACTS_DIR") {
            self.artifacts_dir = PathBuf::from(dir);
        }
        if let Some(cycles) = get_env_u32("FORGEFLOW_MAX_REPLAN_CYCLES")? {
            self.max_replan_cycles = cycles;
        }
        if let Some(policy) = get_env_string("FORGEFLOW_STEP_ERROR_POLICY") {
            self.step_error_policy =
                policy
                    .parse()
                    .map_err(|message: String| ConfigError::InvalidEnvVar {
                        key: "FORGEFLOW_STEP_ERROR_POLICY".to_string(),
                        message,
                    })?;
        }
        if let Some(url) = get_env_string("FORGEFLOW_ORACLE_URL") {
            self.oracle_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(model) = get_env_string("FORGEFLOW_ORACLE_MODEL") {
            self.oracle_model = model;
        }
        if let Some(secs) = get_env_u64("FORGEFLOW_ORACLE_TIMEOUT_SECS")? {
            self.oracle_timeout_secs = secs;
        }
        if let Some(secs) = get_env_u64("FORGEFLOW_DEADLINE_SECS")? {
            self.deadline_secs = Some(secs);
        }
        Ok(self)
    }

    #[must_use]
    pub fn registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_path = path.into();
        self
    }

    #[must_use]
    pub fn artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    #[must_use]
    pub fn max_replan_cycles(mut self, cycles: u32) -> Self {
        self.max_replan_cycles = cycles;
        self
    }

    #[must_use]
    pub fn step_error_policy(mut self, policy: StepErrorPolicy) -> Self {
        self.step_error_policy = policy;
        self
    }

    #[must_use]
    pub fn oracle_url(mut self, url: impl Into<String>) -> Self {
        self.oracle_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn oracle_timeout_secs(mut self, secs: u64) -> Self {
        self.oracle_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn deadline_secs(mut self, secs: u64) -> Self {
        self.deadline_secs = Some(secs);
        self
    }

    /// Validate configuration and build [`ForgeConfig`]
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the configuration is invalid.
    pub fn build(self) -> Result<ForgeConfig, ConfigError> {
        self.validate()?;
        Ok(self.into_config())
    }

    fn into_config(self) -> ForgeConfig {
        ForgeConfig {
            registry_path: self.registry_path,
            artifacts_dir: self.artifacts_dir,
            max_replan_cycles: self.max_replan_cycles,
            step_error_policy: self.step_error_policy,
            oracle_url: self.oracle_url,
            oracle_model: self.oracle_model,
            oracle_timeout_secs: self.oracle_timeout_secs,
            deadline_secs: self.deadline_secs,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.registry_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "registry_path cannot be empty".to_string(),
            ));
        }
        if self.artifacts_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "artifacts_dir cannot be empty".to_string(),
            ));
        }
        if self.max_replan_cycles > 10 {
            return Err(ConfigError::ValidationError(
                "max_replan_cycles must be <= 10".to_string(),
            ));
        }
        if self.oracle_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "oracle_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.oracle_timeout_secs > 600 {
            return Err(ConfigError::ValidationError(
                "oracle_timeout_secs must be <= 600 (10 minutes)".to_string(),
            ));
        }
        if self.deadline_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "deadline_secs must be greater than 0".to_string(),
            ));
        }
        if let Some(url) = &self.oracle_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(ConfigError::ValidationError(format!(
                "oracle_url must be an http(s) URL, got '{url}'"
            )));
        }
        Ok(())
    }
}

// Environment variable helper functions

fn get_env_string(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn get_env_u64(key: &str) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid u64 value '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}

fn get_env_u32(key: &str) -> Result<Option<u32>, ConfigError> {
    match env::var(key) {
        Ok(val) => val
            .parse::<u32>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid u32 value '{val}': {e}"),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_builder() {
        let config = ForgeConfigBuilder::new().build().unwrap();
        assert_eq!(config.max_replan_cycles, 3);
        assert_eq!(config.step_error_policy, StepErrorPolicy::ContinueOnError);
        assert_eq!(config.oracle_timeout(), Duration::from_secs(30));
        assert!(config.oracle_url.is_none());
        assert!(config.deadline().is_none());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(ForgeConfigBuilder::new().oracle_timeout_secs(0).build().is_err());
        assert!(ForgeConfigBuilder::new().max_replan_cycles(11).build().is_err());
        assert!(ForgeConfigBuilder::new().deadline_secs(0).build().is_err());
        assert!(
            ForgeConfigBuilder::new()
                .oracle_url("ftp://example.com")
                .build()
                .is_err()
        );
        assert!(ForgeConfigBuilder::new().registry_path("").build().is_err());
    }

    #[test]
    fn test_file_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forgeflow.toml");
        fs::write(
            &path,
            "max_replan_cycles = 1\nstep_error_policy = \"abort_on_error\"\noracle_url = \"http://localhost:8080/v1/complete\"\n",
        )
        .unwrap();

        let config = ForgeConfigBuilder::new()
            .apply_file(&path)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.max_replan_cycles, 1);
        assert_eq!(config.step_error_policy, StepErrorPolicy::AbortOnError);
        assert_eq!(
            config.oracle_url.as_deref(),
            Some("http://localhost:8080/v1/complete")
        );
        assert_eq!(config.oracle_model, "default");
    }

    #[test]
    fn test_file_rejects_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forgeflow.toml");
        fs::write(&path, "max_replan = 2\n").unwrap();
        assert!(matches!(
            ForgeConfigBuilder::new().apply_file(&path),
            Err(ConfigError::File { .. })
        ));
    }
}
