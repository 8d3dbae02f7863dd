//! qmark configuration schema, deserialized from TOML.

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QmarkConfig {
    pub server: ServerConfig,
    pub debug: DebugConfig,
    pub model: ModelConfig,
    pub log: LogConfig,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// CORS origins; empty means permissive.
    pub allowed_origins: Vec<String>,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: defaults::DEFAULT_BIND_ADDRESS.to_string(),
            port: defaults::DEFAULT_PORT,
            allowed_origins: Vec::new(),
            max_body_bytes: defaults::DEFAULT_MAX_BODY_BYTES,
        }
    }
}

// ---------------------------------------------------------------------------
// Debug image sink
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Directory receiving `<trace_id>.png` copies of every request.
    pub dir: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            dir: defaults::DEFAULT_DEBUG_DIR.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Vision model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    #[default]
    Gemini,
    #[serde(alias = "open_ai")]
    OpenAi,
    Mock,
}

impl ModelProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }

    /// Whether calls leave the process and need credentials.
    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::Mock)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: ModelProvider,
    pub api_key: Option<String>,
    /// Model id; filled from the provider default when absent.
    pub model: Option<String>,
    /// API root; filled from the provider default when absent.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    /// Canned reply for the mock provider.
    pub mock_reply: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            api_key: None,
            model: None,
            base_url: None,
            timeout_secs: defaults::DEFAULT_MODEL_TIMEOUT_SECS,
            mock_reply: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub level: String,
    pub format: LogFormat,
    /// When set, NDJSON logs also roll daily into this directory.
    pub dir: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: defaults::DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::default(),
            dir: None,
        }
    }
}
