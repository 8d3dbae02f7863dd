//! `qmark-config` — runtime configuration for the qmark analysis server.
//!
//! Provides:
//! - Typed config schema (server, debug sink, vision model, logging)
//! - TOML loading, missing file falls back to defaults
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with errors and warnings
//! - Config redaction for safe logging/display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{load_config, parse_config};
pub use redact::redact;
pub use schema::{DebugConfig, LogConfig, LogFormat, ModelConfig, ModelProvider, QmarkConfig, ServerConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::Result;
use std::path::Path;

/// Load, substitute env vars, and apply defaults.
///
/// Validation is left to the caller so it can run after logging is up.
pub async fn load_and_prepare(path: &Path) -> Result<QmarkConfig> {
    let config = load_config(path).await?;
    Ok(apply_all_defaults(config))
}
