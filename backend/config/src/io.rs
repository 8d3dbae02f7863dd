//! Config file reading.

use crate::env::resolve_env_vars;
use crate::schema::QmarkConfig;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist.
pub async fn load_config(path: &Path) -> Result<QmarkConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(QmarkConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw)
        .with_context(|| format!("Failed to load config at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse TOML text, substituting `${VAR}` references from the environment.
pub fn parse_config(raw: &str) -> Result<QmarkConfig> {
    let table: toml::Value = toml::from_str(raw).context("Failed to parse config TOML")?;

    let value: Value =
        serde_json::to_value(table).context("Failed to convert config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;

    serde_json::from_value(value).context("Failed to deserialize config")
}
