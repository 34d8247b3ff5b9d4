//! TOML-based configuration system for ConflictPilot.
//!
//! Every section is optional and falls back to defaults, so an empty file is
//! a valid configuration. Sensitive values (the inference API key) are stored
//! as `_env` fields that reference environment variable names and are
//! resolved at runtime via [`AppConfig::resolve_env_vars`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version-control executable settings.
    #[serde(default)]
    pub git: GitConfig,

    /// Inference service settings.
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Rebase workflow settings.
    #[serde(default)]
    pub rebase: RebaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

/// How the version-control tool is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Executable name or path (default `git`).
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Remote that target branches are fetched from (default `origin`).
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Seconds before a single subprocess call is abandoned (default 30).
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

fn default_executable() -> String {
    "git".into()
}
fn default_remote() -> String {
    "origin".into()
}
fn default_command_timeout() -> u64 {
    30
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            remote: default_remote(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

impl GitConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

/// Inference service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// URL the mode-execution requests are POSTed to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Environment variable holding an optional bearer token.
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Operating mode requested from the service.
    #[serde(default = "default_mode_id")]
    pub mode_id: String,

    /// Seconds before a single inference call is abandoned (default 60).
    #[serde(default = "default_inference_timeout")]
    pub timeout_secs: u64,

    /// Resolved API key (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8765/v1/modes/execute".into()
}
fn default_mode_id() -> String {
    "merge_conflict_resolver".into()
}
fn default_inference_timeout() -> u64 {
    60
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key_env: None,
            mode_id: default_mode_id(),
            timeout_secs: default_inference_timeout(),
            api_key: None,
        }
    }
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Rebase
// ---------------------------------------------------------------------------

/// Rebase workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebaseConfig {
    /// Iteration budget for automatic mode (default 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_retries() -> u32 {
    crate::workflow::auto::DEFAULT_MAX_RETRIES
}

impl Default for RebaseConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

/// Commented default configuration written by `conflictpilot init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# ConflictPilot Configuration

[git]
executable = "git"
remote = "origin"
command_timeout_secs = 30

[inference]
endpoint = "http://127.0.0.1:8765/v1/modes/execute"
# api_key_env = "CONFLICTPILOT_API_KEY"
mode_id = "merge_conflict_resolver"
timeout_secs = 60

[rebase]
max_retries = 3

[log]
level = "info"
"#;

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Resolve all `*_env` fields from environment variables.
    ///
    /// A missing variable logs a warning but does not fail; the service may
    /// not require authentication.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref env_name) = self.inference.api_key_env {
            self.inference.api_key = resolve_optional_env(env_name, "inference.api_key_env");
        }
        Ok(())
    }

    /// Validate that all values are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.git.executable.trim().is_empty() {
            return Err(invalid("git.executable", "executable must not be empty"));
        }
        if self.git.remote.trim().is_empty() {
            return Err(invalid("git.remote", "remote must not be empty"));
        }
        if self.git.command_timeout_secs == 0 {
            return Err(invalid("git.command_timeout_secs", "timeout must be > 0"));
        }
        if !(self.inference.endpoint.starts_with("http://")
            || self.inference.endpoint.starts_with("https://"))
        {
            return Err(invalid(
                "inference.endpoint",
                "endpoint must be an http(s) URL",
            ));
        }
        if self.inference.mode_id.trim().is_empty() {
            return Err(invalid("inference.mode_id", "mode id must not be empty"));
        }
        if self.inference.timeout_secs == 0 {
            return Err(invalid("inference.timeout_secs", "timeout must be > 0"));
        }
        if self.rebase.max_retries == 0 {
            return Err(invalid("rebase.max_retries", "max_retries must be > 0"));
        }
        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }
}

fn invalid(field: &str, detail: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        detail: detail.into(),
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
