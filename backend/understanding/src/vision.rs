//! Vision model clients: send one image plus an instruction to a hosted
//! multimodal LLM and hand back its text.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use qmark_config::{ModelConfig, ModelProvider};
use qmark_core::{AnalysisError, VisionModel, VisionReply, VisionRequest};
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info};

use crate::mock::MockVision;

/// Upstream error bodies are cut to this many chars.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Build the configured vision model. Expects defaults to have been applied.
pub fn build_model(config: &ModelConfig) -> Result<Arc<dyn VisionModel>> {
    let model: Arc<dyn VisionModel> = match config.provider {
        ModelProvider::Mock => match &config.mock_reply {
            Some(reply) => Arc::new(MockVision::new().with_text(reply.clone())),
            None => Arc::new(MockVision::new()),
        },
        ModelProvider::Gemini => {
            let (client, api_key) = remote_parts(config)?;
            let mut gemini = GeminiVision::new(client, api_key);
            if let Some(model) = &config.model {
                gemini = gemini.with_model(model);
            }
            if let Some(url) = &config.base_url {
                gemini = gemini.with_base_url(url);
            }
            Arc::new(gemini)
        }
        ModelProvider::OpenAi => {
            let (client, api_key) = remote_parts(config)?;
            let mut openai = OpenAiVision::new(client, api_key);
            if let Some(model) = &config.model {
                openai = openai.with_model(model);
            }
            if let Some(url) = &config.base_url {
                openai = openai.with_base_url(url);
            }
            Arc::new(openai)
        }
    };
    Ok(model)
}

/// HTTP client with the configured timeout, plus the required API key.
fn remote_parts(config: &ModelConfig) -> Result<(Client, String)> {
    let api_key = config
        .api_key
        .clone()
        .with_context(|| format!("model.api_key is required for {}", config.provider.as_str()))?;
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to build HTTP client for vision model")?;
    Ok((client, api_key))
}

// ---------------------------------------------------------------------------
// Gemini
// ---------------------------------------------------------------------------

/// Google Gemini `generateContent` client.
pub struct GeminiVision {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiVision {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn request_body(request: &VisionRequest) -> serde_json::Value {
        serde_json::json!({
            "contents": [{ "parts": [
                { "text": request.prompt },
                { "inlineData": {
                    "mimeType": request.mime_type,
                    "data": STANDARD.encode(&request.image),
                } }
            ]}],
            "generationConfig": { "responseMimeType": "application/json" }
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

impl GeminiResponse {
    fn into_text(self) -> Result<String, AnalysisError> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AnalysisError::ResponseShape("Gemini returned no candidates".into()))?;
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(AnalysisError::ResponseShape(format!(
                "Gemini returned no text (finishReason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(text)
    }
}

#[async_trait]
impl VisionModel for GeminiVision {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn submit(&self, request: &VisionRequest) -> Result<VisionReply, AnalysisError> {
        let start = Instant::now();
        info!(model = %self.model, bytes = request.image.len(), "[Vision] Analyzing image via Gemini");

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(|e| transport_error(self.name(), e))?;

        let response = ensure_success(self.name(), response).await?;
        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| transport_error(self.name(), e))?;

        debug!(latency_ms = start.elapsed().as_millis() as u64, "Gemini responded");
        body.into_text().map(VisionReply::Text)
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible chat completions
// ---------------------------------------------------------------------------

/// OpenAI (or compatible) chat-completions client with image input.
pub struct OpenAiVision {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiVision {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn request_body(&self, request: &VisionRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": request.prompt },
                    { "type": "image_url",
                      "image_url": { "url": format!(
                          "data:{};base64,{}",
                          request.mime_type,
                          STANDARD.encode(&request.image)
                      ) } }
                ]
            }],
            "response_format": { "type": "json_object" },
            "max_tokens": 512
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl VisionModel for OpenAiVision {
    fn name(&self) -> &str {
        "openai"
    }

    async fn submit(&self, request: &VisionRequest) -> Result<VisionReply, AnalysisError> {
        let start = Instant::now();
        info!(model = %self.model, bytes = request.image.len(), "[Vision] Analyzing image via OpenAI");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| transport_error(self.name(), e))?;

        let response = ensure_success(self.name(), response).await?;
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| transport_error(self.name(), e))?;

        debug!(latency_ms = start.elapsed().as_millis() as u64, "OpenAI responded");
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .map(VisionReply::Text)
            .ok_or_else(|| AnalysisError::ResponseShape("OpenAI returned no message content".into()))
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Map a reqwest failure to a model error whose message never carries the URL.
fn transport_error(provider: &str, err: reqwest::Error) -> AnalysisError {
    let err = err.without_url();
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        match std::error::Error::source(&err) {
            Some(source) => format!("{err}: {source}"),
            None => err.to_string(),
        }
    };
    AnalysisError::model(provider, message)
}

async fn ensure_success(provider: &str, response: Response) -> Result<Response, AnalysisError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let excerpt: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    Err(AnalysisError::model(provider, format!("HTTP {status}: {excerpt}")))
}
