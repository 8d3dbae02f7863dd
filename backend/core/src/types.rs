use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of every server-generated trace id.
pub const TRACE_ID_PREFIX: &str = "define_";

/// An inbound analysis request, after the HTTP layer has pulled it apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Base64 image, optionally prefixed with a data-URI header.
    pub image: String,
    /// Caller-supplied correlation token (`X-Trace-ID`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// The verdict returned to the caller. Always fully populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// How closely the drawing resembles a question mark, 0..=100.
    pub similarity: u8,
    /// English feedback.
    pub feedback: String,
    /// Korean feedback.
    #[serde(rename = "feedback_ko")]
    pub feedback_localized: String,
}

impl AnalysisResult {
    pub fn new(
        similarity: u8,
        feedback: impl Into<String>,
        feedback_localized: impl Into<String>,
    ) -> Self {
        Self {
            similarity,
            feedback: feedback.into(),
            feedback_localized: feedback_localized.into(),
        }
    }

    /// Sentinel result carrying an error message in both languages.
    pub fn from_message(message: &str) -> Self {
        Self {
            similarity: 0,
            feedback: format!("Error: {message}"),
            feedback_localized: format!("오류: {message}"),
        }
    }
}

/// Resolved result plus the trace id it was filed under.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub trace_id: TraceId,
    pub result: AnalysisResult,
}

/// Correlation id naming the debug artifact and tying log lines together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    /// Use the caller's id verbatim when present, otherwise mint a fresh one.
    pub fn resolve(supplied: Option<&str>) -> Self {
        match supplied {
            Some(id) if !id.is_empty() => Self(id.to_string()),
            _ => Self::generate(),
        }
    }

    pub fn generate() -> Self {
        Self(format!("{TRACE_ID_PREFIX}{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TraceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
