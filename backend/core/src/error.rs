use thiserror::Error;

/// Everything that can go wrong while analyzing one image.
///
/// None of these reach the HTTP caller as a status code; the service folds
/// them into [`AnalysisResult::from_message`](crate::AnalysisResult::from_message).
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid base64 image: {0}")]
    Decode(String),

    #[error("debug image storage failed: {0}")]
    Storage(String),

    #[error("model invocation failed ({provider}): {message}")]
    ModelInvocation { provider: String, message: String },

    #[error("unexpected model response: {0}")]
    ResponseShape(String),
}

impl AnalysisError {
    pub fn model(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelInvocation {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Storage(_) => "storage",
            Self::ModelInvocation { .. } => "model_invocation",
            Self::ResponseShape(_) => "response_shape",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_display_names_provider() {
        let err = AnalysisError::model("gemini", "connection refused");
        assert_eq!(
            err.to_string(),
            "model invocation failed (gemini): connection refused"
        );
        assert_eq!(err.kind(), "model_invocation");
    }
}
