use async_trait::async_trait;
use serde_json::Value;

use crate::error::AnalysisError;

/// One multimodal prompt: instruction text plus a single image.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub prompt: String,
    pub image: Vec<u8>,
    pub mime_type: String,
}

impl VisionRequest {
    pub fn png(prompt: impl Into<String>, image: Vec<u8>) -> Self {
        Self {
            prompt: prompt.into(),
            image,
            mime_type: "image/png".to_string(),
        }
    }
}

/// What a vision model sent back.
#[derive(Debug, Clone, PartialEq)]
pub enum VisionReply {
    /// Already-parsed JSON.
    Structured(Value),
    /// Raw model text, expected to contain a JSON object.
    Text(String),
}

/// Capability to submit an image and prompt to a multimodal model.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Provider name (e.g., "gemini", "openai", "mock").
    fn name(&self) -> &str;

    /// Send the request and wait for the model's reply.
    async fn submit(&self, request: &VisionRequest) -> Result<VisionReply, AnalysisError>;
}
