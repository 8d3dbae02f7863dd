pub mod error;
pub mod traits;
pub mod types;

pub use error::AnalysisError;
pub use traits::{VisionModel, VisionReply, VisionRequest};
pub use types::{AnalysisOutcome, AnalysisRequest, AnalysisResult, TraceId, TRACE_ID_PREFIX};
