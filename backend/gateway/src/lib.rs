//! qmark HTTP gateway
//!
//! Hosts the image analysis service behind `POST /analyze`, plus a health check.

pub mod analyze;
pub mod health_api;
pub mod server;
pub mod service;

pub use server::{build_router, start_server, GatewayState};
pub use service::{ImageAnalysisService, ANALYSIS_PROMPT};
