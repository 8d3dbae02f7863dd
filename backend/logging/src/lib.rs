//! Structured logging for qmark.
//!
//! Handles subscriber setup (console + optional rolling NDJSON file) and
//! scrubbing of credentials from text before it is logged or returned.

pub mod logger;
pub mod redact;

pub use logger::init_logger;
pub use redact::redact_sensitive_data;
