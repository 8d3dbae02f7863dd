//! Main HTTP Gateway Server.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use qmark_config::ServerConfig;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::analyze::{self, TRACE_ID_HEADER};
use crate::health_api;
use crate::service::ImageAnalysisService;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub service: Arc<ImageAnalysisService>,
}

impl GatewayState {
    pub fn new(service: ImageAnalysisService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Build the router with all routes and HTTP layers.
pub fn build_router(state: GatewayState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/analyze", post(analyze::analyze))
        .route("/api/v1/analyze", post(analyze::analyze))
        .route("/health", get(health_api::get_health))
        .route("/api/health", get(health_api::get_health))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Permissive when no origins are configured, otherwise an explicit allow-list.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty() && *o != "*")
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let trace_header = HeaderName::from_static(TRACE_ID_HEADER);
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            trace_header.clone(),
        ])
        .expose_headers([trace_header])
        .allow_credentials(true)
}

/// Bind and serve until Ctrl-C.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<()> {
    let app = build_router(state, config);
    let addr = format!("{}:{}", config.bind_address, config.port);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("HTTP API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use base64::{engine::general_purpose::STANDARD, Engine};
    use qmark_core::{VisionReply, TRACE_ID_PREFIX};
    use qmark_media::DebugSink;
    use qmark_understanding::MockVision;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router(mock: MockVision, dir: &std::path::Path, config: &ServerConfig) -> Router {
        let service = ImageAnalysisService::new(Arc::new(mock), DebugSink::new(dir));
        build_router(GatewayState::new(service), config)
    }

    fn verdict_mock() -> MockVision {
        MockVision::new().with_reply(VisionReply::Structured(json!({
            "similarity": 87, "feedback": "Close!", "feedback_ko": "좋아요!"
        })))
    }

    fn analyze_request(body: Value, trace_id: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(id) = trace_id {
            builder = builder.header(TRACE_ID_HEADER, id);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn analyze_returns_model_verdict_and_echoes_trace_id() {
        let tmp = tempfile::tempdir().unwrap();
        let app = router(verdict_mock(), tmp.path(), &ServerConfig::default());

        let image = STANDARD.encode(b"pixels");
        let response = app
            .oneshot(analyze_request(json!({ "image": image, "extra": 1 }), Some("abc-123")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[TRACE_ID_HEADER], "abc-123");
        assert_eq!(
            json_body(response).await,
            json!({ "similarity": 87, "feedback": "Close!", "feedback_ko": "좋아요!" })
        );
        assert!(tmp.path().join("abc-123.png").exists());
    }

    #[tokio::test]
    async fn generated_trace_id_is_echoed() {
        let tmp = tempfile::tempdir().unwrap();
        let app = router(verdict_mock(), tmp.path(), &ServerConfig::default());

        let response = app
            .oneshot(analyze_request(json!({ "image": STANDARD.encode(b"x") }), None))
            .await
            .unwrap();

        let trace_id = response.headers()[TRACE_ID_HEADER].to_str().unwrap().to_string();
        assert!(trace_id.starts_with(TRACE_ID_PREFIX));
        assert!(tmp.path().join(format!("{trace_id}.png")).exists());
    }

    #[tokio::test]
    async fn model_transport_error_is_still_200() {
        let tmp = tempfile::tempdir().unwrap();
        let app = router(
            MockVision::new().failing("connection refused"),
            tmp.path(),
            &ServerConfig::default(),
        );

        let response = app
            .oneshot(analyze_request(json!({ "image": STANDARD.encode(b"x") }), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["similarity"], 0);
        assert_eq!(body["feedback"], "Error: model invocation failed (mock): connection refused");
        assert_eq!(body["feedback_ko"], "오류: model invocation failed (mock): connection refused");
    }

    #[tokio::test]
    async fn malformed_base64_has_same_shape() {
        let tmp = tempfile::tempdir().unwrap();
        let app = router(verdict_mock(), tmp.path(), &ServerConfig::default());

        let response = app
            .oneshot(analyze_request(json!({ "image": "not-base64-@@@" }), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(body["similarity"], 0);
        assert!(body["feedback"].as_str().unwrap().starts_with("Error: "));
    }

    #[tokio::test]
    async fn missing_image_is_bad_request() {
        let tmp = tempfile::tempdir().unwrap();
        let app = router(verdict_mock(), tmp.path(), &ServerConfig::default());

        let response = app
            .oneshot(analyze_request(json!({ "picture": "abc" }), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["similarity"], 0);
        assert_eq!(body["feedback"], "Error: missing field: image");
    }

    #[tokio::test]
    async fn non_json_body_keeps_verdict_shape() {
        let tmp = tempfile::tempdir().unwrap();
        let app = router(verdict_mock(), tmp.path(), &ServerConfig::default());

        let request = Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert!(response.status().is_client_error());
        let body = json_body(response).await;
        assert_eq!(body["similarity"], 0);
        assert!(body["feedback_ko"].as_str().unwrap().starts_with("오류: "));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            max_body_bytes: 64,
            ..ServerConfig::default()
        };
        let app = router(verdict_mock(), tmp.path(), &config);

        let image = STANDARD.encode(vec![0u8; 1024]);
        let response = app
            .oneshot(analyze_request(json!({ "image": image }), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn health_reports_model() {
        let tmp = tempfile::tempdir().unwrap();
        let app = router(verdict_mock(), tmp.path(), &ServerConfig::default());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "mock");
    }

    #[tokio::test]
    async fn cors_allow_list_echoes_configured_origin() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            allowed_origins: vec!["http://localhost:3000".into()],
            ..ServerConfig::default()
        };
        let app = router(verdict_mock(), tmp.path(), &config);

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/analyze")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
    }
}
