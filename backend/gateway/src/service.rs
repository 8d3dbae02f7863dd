//! Image analysis orchestration.
//!
//! Decode, persist a debug copy, ask the vision model, shape the verdict.
//! Every failure along the way becomes a sentinel [`AnalysisResult`]; callers
//! never see an error.

use std::sync::Arc;

use qmark_core::{
    AnalysisError, AnalysisOutcome, AnalysisRequest, AnalysisResult, TraceId, VisionModel,
    VisionRequest,
};
use qmark_logging::redact_sensitive_data;
use qmark_media::{decode_image, sniff_image_mime, DebugSink};
use qmark_understanding::parse_analysis_reply;
use tracing::{error, info, warn};

/// Instruction sent with every image.
pub const ANALYSIS_PROMPT: &str = "Analyze the similarity of the handwritten drawing in the image \
to a question mark symbol '?'. You must respond in JSON format with the following keys: \
'similarity' (a number between 0 and 100), \
'feedback' (helpful feedback in English), \
'feedback_ko' (the same feedback translated into natural Korean). \
Ensure the Korean translation sounds friendly and encouraging.";

pub struct ImageAnalysisService {
    model: Arc<dyn VisionModel>,
    sink: DebugSink,
}

impl ImageAnalysisService {
    pub fn new(model: Arc<dyn VisionModel>, sink: DebugSink) -> Self {
        Self { model, sink }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Analyze one image. Never fails; see [`AnalysisResult::from_message`].
    pub async fn analyze(&self, image_base64: &str, trace_id: Option<&str>) -> AnalysisResult {
        self.analyze_traced(image_base64, trace_id).await.result
    }

    /// Like [`analyze`](Self::analyze), also returning the resolved trace id.
    pub async fn analyze_traced(&self, image_base64: &str, trace_id: Option<&str>) -> AnalysisOutcome {
        let trace_id = TraceId::resolve(trace_id);

        let result = match self.run(image_base64, &trace_id).await {
            Ok(result) => result,
            Err(err) => {
                let message = redact_sensitive_data(&err.to_string());
                error!(trace_id = %trace_id, kind = err.kind(), error = %message, "Image analysis failed");
                AnalysisResult::from_message(&message)
            }
        };

        AnalysisOutcome { trace_id, result }
    }

    pub async fn analyze_request(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        self.analyze_traced(&request.image, request.trace_id.as_deref()).await
    }

    async fn run(&self, image_base64: &str, trace_id: &TraceId) -> Result<AnalysisResult, AnalysisError> {
        let decoded = decode_image(image_base64)?;

        match sniff_image_mime(&decoded.bytes) {
            Some("image/png") => {}
            sniffed => warn!(
                trace_id = %trace_id,
                sniffed = sniffed.unwrap_or("unknown"),
                declared = decoded.declared_mime.as_deref().unwrap_or("none"),
                "Image is not a PNG; submitting as image/png anyway"
            ),
        }

        let path = self.sink.write(trace_id, &decoded.bytes).await?;
        info!(trace_id = %trace_id, path = %path.display(), "Debug image saved");

        let request = VisionRequest::png(ANALYSIS_PROMPT, decoded.bytes);
        let reply = self.model.submit(&request).await?;
        parse_analysis_reply(&reply)
    }
}
