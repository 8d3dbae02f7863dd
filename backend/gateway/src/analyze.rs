//! `POST /analyze`: the HTTP face of [`ImageAnalysisService`](crate::service::ImageAnalysisService).
//!
//! Always answers with the three-field verdict shape. Analysis failures are
//! 200s with the error in the body; only a malformed request gets a 4xx.

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use qmark_core::{AnalysisRequest, AnalysisResult};
use serde_json::Value;
use tracing::{info, warn};

use crate::server::GatewayState;

pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Handler for `POST /analyze`.
pub async fn analyze(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    payload: Result<Json<HashMap<String, Value>>, JsonRejection>,
) -> Response {
    let trace_id = headers.get(TRACE_ID_HEADER).and_then(|v| v.to_str().ok());

    let Json(mut payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(trace_id = trace_id.unwrap_or(""), error = %rejection.body_text(), "Rejected analyze request body");
            let body = AnalysisResult::from_message(&rejection.body_text());
            return (rejection.status(), Json(body)).into_response();
        }
    };

    let Some(Value::String(image)) = payload.remove("image") else {
        warn!(trace_id = trace_id.unwrap_or(""), "Analyze request without image");
        let body = AnalysisResult::from_message("missing field: image");
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    };

    let request = AnalysisRequest {
        image,
        trace_id: trace_id.map(str::to_string),
    };
    let outcome = state.service.analyze_request(&request).await;
    info!(
        trace_id = %outcome.trace_id,
        similarity = outcome.result.similarity,
        feedback = %outcome.result.feedback,
        "Analysis complete"
    );

    let mut response = Json(outcome.result).into_response();
    if let Ok(value) = HeaderValue::from_str(outcome.trace_id.as_str()) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}
