//! Process-wide runtime configuration.
//!
//! Configuration is resolved once at startup (built-in defaults, then an
//! optional JSON file, then `APIWEAVE_*` environment variables) and passed to
//! the pipeline by reference. Steps never consult the environment directly.
use crate::state::RunOptions;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_HTTP_TIMEOUT_SECS: &str = "APIWEAVE_HTTP_TIMEOUT_SECS";
pub const ENV_LM_COMMAND: &str = "APIWEAVE_LM_COMMAND";
pub const ENV_LM_MODEL: &str = "APIWEAVE_LM_MODEL";
pub const ENV_LM_MAX_TOKENS: &str = "APIWEAVE_LM_MAX_TOKENS";
pub const ENV_EMBEDDING_MODEL: &str = "APIWEAVE_EMBEDDING_MODEL";
pub const ENV_EMBEDDING_DIMENSIONS: &str = "APIWEAVE_EMBEDDING_DIMENSIONS";

const CONFIG_FILE_NAME: &str = "config.json";

/// Immutable configuration shared by every run in the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Upper bound for the single outbound spec fetch.
    pub http_timeout_secs: u64,
    /// External LM command (split with shell-words); `None` keeps the keyword
    /// task understander.
    pub lm_command: Option<String>,
    pub lm_model: String,
    pub lm_max_tokens: u32,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: 30,
            lm_command: None,
            lm_model: "default".to_string(),
            lm_max_tokens: 1500,
            embedding_model: "placeholder-sha256".to_string(),
            embedding_dimensions: 1536,
        }
    }
}

/// LM parameters in effect for one run, after run overrides are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LmSettings {
    pub command: Option<String>,
    pub model: String,
    pub max_tokens: u32,
}

impl RuntimeConfig {
    /// Resolve configuration from the real process environment.
    ///
    /// An explicit `config_path` must exist; the default location under the
    /// user config directory is optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let env: BTreeMap<String, String> = std::env::vars()
            .filter(|(key, _)| key.starts_with("APIWEAVE_"))
            .collect();
        match config_path {
            Some(path) => Self::from_sources(Some(path), &env),
            None => {
                let default_path = default_config_path().filter(|path| path.is_file());
                Self::from_sources(default_path.as_deref(), &env)
            }
        }
    }

    /// Layer an optional config file and an environment map over the defaults.
    pub fn from_sources(file: Option<&Path>, env: &BTreeMap<String, String>) -> Result<Self> {
        let mut config = match file {
            Some(path) => read_config_file(path)?,
            None => Self::default(),
        };
        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, env: &BTreeMap<String, String>) -> Result<()> {
        if let Some(value) = env.get(ENV_HTTP_TIMEOUT_SECS) {
            self.http_timeout_secs = parse_env(ENV_HTTP_TIMEOUT_SECS, value)?;
        }
        if let Some(value) = env.get(ENV_LM_COMMAND) {
            let trimmed = value.trim();
            self.lm_command = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        if let Some(value) = env.get(ENV_LM_MODEL) {
            self.lm_model = value.trim().to_string();
        }
        if let Some(value) = env.get(ENV_LM_MAX_TOKENS) {
            self.lm_max_tokens = parse_env(ENV_LM_MAX_TOKENS, value)?;
        }
        if let Some(value) = env.get(ENV_EMBEDDING_MODEL) {
            self.embedding_model = value.trim().to_string();
        }
        if let Some(value) = env.get(ENV_EMBEDDING_DIMENSIONS) {
            self.embedding_dimensions = parse_env(ENV_EMBEDDING_DIMENSIONS, value)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.http_timeout_secs == 0 {
            return Err(anyhow!("http_timeout_secs must be greater than zero"));
        }
        if self.lm_model.is_empty() {
            return Err(anyhow!("lm_model must be non-empty"));
        }
        if self.embedding_dimensions == 0 {
            return Err(anyhow!("embedding_dimensions must be greater than zero"));
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Effective LM settings for one run; overrides never leak into `self`.
    pub fn lm_settings(&self, options: &RunOptions) -> LmSettings {
        LmSettings {
            command: self.lm_command.clone(),
            model: options
                .override_llm_model
                .clone()
                .unwrap_or_else(|| self.lm_model.clone()),
            max_tokens: options.override_max_tokens.unwrap_or(self.lm_max_tokens),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("apiweave").join(CONFIG_FILE_NAME))
}

fn read_config_file(path: &Path) -> Result<RuntimeConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse config {}", path.display()))
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {key}={value:?}: {err}"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
