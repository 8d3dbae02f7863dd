use std::sync::Mutex;

use async_trait::async_trait;
use qmark_core::{AnalysisError, VisionModel, VisionReply, VisionRequest};

/// A mock vision model that returns canned replies and records what it was sent.
pub struct MockVision {
    name: String,
    outcome: MockOutcome,
    requests: Mutex<Vec<VisionRequest>>,
}

enum MockOutcome {
    Reply(VisionReply),
    Fail(String),
}

impl MockVision {
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            outcome: MockOutcome::Reply(VisionReply::Structured(serde_json::json!({
                "similarity": 50,
                "feedback": "Mock analysis: no model configured.",
                "feedback_ko": "모의 분석: 모델이 설정되지 않았어요.",
            }))),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(mut self, reply: VisionReply) -> Self {
        self.outcome = MockOutcome::Reply(reply);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_reply(VisionReply::Text(text.into()))
    }

    /// Every submit fails with a transport-style error carrying `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.outcome = MockOutcome::Fail(message.into());
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<VisionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Default for MockVision {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisionModel for MockVision {
    fn name(&self) -> &str {
        &self.name
    }

    async fn submit(&self, request: &VisionRequest) -> Result<VisionReply, AnalysisError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        match &self.outcome {
            MockOutcome::Reply(reply) => Ok(reply.clone()),
            MockOutcome::Fail(message) => Err(AnalysisError::model(&self.name, message.clone())),
        }
    }
}
