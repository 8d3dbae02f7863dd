//! Config validation with user-friendly error messages.

use crate::schema::{ModelProvider, QmarkConfig};
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &QmarkConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_debug(config, &mut report);
    validate_model(config, &mut report);
    report
}

fn validate_server(config: &QmarkConfig, report: &mut ValidationReport) {
    let server = &config.server;
    if server.port == 0 {
        report.error("server.port", "Port must be non-zero");
    }
    if server.bind_address.trim().is_empty() {
        report.error("server.bind_address", "Bind address cannot be empty");
    }
    if server.max_body_bytes == 0 {
        report.error("server.max_body_bytes", "Body limit must be non-zero");
    }
    if server.allowed_origins.iter().any(|o| o.trim() == "*") {
        report.warn(
            "server.allowed_origins",
            "\"*\" is ignored; leave the list empty for permissive CORS",
        );
    }
}

fn validate_debug(config: &QmarkConfig, report: &mut ValidationReport) {
    if config.debug.dir.trim().is_empty() {
        report.error("debug.dir", "Debug image directory cannot be empty");
    }
}

fn validate_model(config: &QmarkConfig, report: &mut ValidationReport) {
    let model = &config.model;
    if model.timeout_secs == 0 {
        report.error("model.timeout_secs", "Timeout must be at least one second");
    }
    if model.provider.is_remote() && model.api_key.is_none() {
        report.error(
            "model.api_key",
            format!("Provider '{}' requires an API key", model.provider.as_str()),
        );
    }
    if let Some(url) = &model.base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            report.error("model.base_url", "Base URL must start with http:// or https://");
        }
    }
    match model.provider {
        ModelProvider::Mock if model.mock_reply.is_none() => {
            report.warn("model.mock_reply", "Mock provider without a reply answers with a fixed verdict");
        }
        ModelProvider::Mock => {
            report.warn("model.provider", "Mock provider configured; no real analysis is performed");
        }
        _ => {}
    }
}
