//! Config defaults: applies sensible default values to parsed config.

use crate::schema::{ModelProvider, QmarkConfig};

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 8080;

/// Base64 inflates by 4/3, so this admits roughly 7.5 MiB images.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_DEBUG_DIR: &str = "/mnt/debug_images";

pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: QmarkConfig) -> QmarkConfig {
    let config = apply_model_defaults(config);
    apply_log_defaults(config)
}

/// Fill model id and base URL from the provider, drop blank API keys.
fn apply_model_defaults(mut config: QmarkConfig) -> QmarkConfig {
    let model = &mut config.model;

    if model.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
        model.api_key = None;
    }

    let (default_model, default_base) = match model.provider {
        ModelProvider::Gemini => (DEFAULT_GEMINI_MODEL, DEFAULT_GEMINI_BASE_URL),
        ModelProvider::OpenAi => (DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_BASE_URL),
        ModelProvider::Mock => ("mock", ""),
    };

    if model.model.as_deref().map_or(true, |m| m.trim().is_empty()) {
        model.model = Some(default_model.to_string());
    }

    match model.base_url.as_mut() {
        Some(url) => {
            while url.ends_with('/') {
                url.pop();
            }
        }
        None if !default_base.is_empty() => model.base_url = Some(default_base.to_string()),
        None => {}
    }

    config
}

fn apply_log_defaults(mut config: QmarkConfig) -> QmarkConfig {
    if config.log.level.trim().is_empty() {
        config.log.level = DEFAULT_LOG_LEVEL.to_string();
    }
    if config.log.dir.as_deref().is_some_and(|d| d.trim().is_empty()) {
        config.log.dir = None;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_gemini_model_and_base_url() {
        let config = apply_all_defaults(QmarkConfig::default());
        assert_eq!(config.model.model.as_deref(), Some(DEFAULT_GEMINI_MODEL));
        assert_eq!(config.model.base_url.as_deref(), Some(DEFAULT_GEMINI_BASE_URL));
    }

    #[test]
    fn keeps_explicit_model_and_trims_base_url() {
        let mut config = QmarkConfig::default();
        config.model.provider = ModelProvider::OpenAi;
        config.model.model = Some("gpt-4o-mini".into());
        config.model.base_url = Some("http://localhost:4000/v1/".into());

        let config = apply_all_defaults(config);
        assert_eq!(config.model.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.model.base_url.as_deref(), Some("http://localhost:4000/v1"));
    }

    #[test]
    fn blank_api_key_becomes_none() {
        let mut config = QmarkConfig::default();
        config.model.api_key = Some("   ".into());
        assert!(apply_all_defaults(config).model.api_key.is_none());
    }
}
