//! Configuration loading for the CLI.
//!
//! Workflow settings come from a JSON file:
//! 1. `--config <file>`
//! 2. `$GROUNDCHECK_CONFIG`
//! 3. Built-in defaults
//!
//! Pass/fail criteria are read from a separate JSON file (`--criteria`).
//! Fields missing from either file keep their default values.

use anyhow::{Context, Result};
use groundcheck_core::config::ValidationConfig;
use groundcheck_core::criteria::PassFailCriteria;
use std::path::{Path, PathBuf};

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "GROUNDCHECK_CONFIG";

/// Picks the config file: explicit flag first, then the environment.
pub fn resolve_config_path(flag: Option<&Path>, env_value: Option<String>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| env_value.filter(|v| !v.is_empty()).map(PathBuf::from))
}

/// Loads and validates the workflow configuration.
pub fn load_config(flag: Option<&Path>) -> Result<ValidationConfig> {
    let config = match resolve_config_path(flag, std::env::var(CONFIG_ENV).ok()) {
        Some(path) => read_json::<ValidationConfig>(&path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ValidationConfig::default(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Loads and validates pass/fail criteria.
pub fn load_criteria(path: &Path) -> Result<PassFailCriteria> {
    let criteria: PassFailCriteria = read_json(path)
        .with_context(|| format!("Failed to load criteria: {}", path.display()))?;
    criteria
        .validate()
        .with_context(|| format!("Invalid criteria in {}", path.display()))?;
    Ok(criteria)
}

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Malformed JSON in {}", path.display()))
}
