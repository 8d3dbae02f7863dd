pub mod mock;
pub mod reply;
pub mod vision;

pub use mock::MockVision;
pub use reply::{extract_json_object, parse_analysis_reply};
pub use vision::{build_model, GeminiVision, OpenAiVision};
