//! Image intake for qmark: base64 decoding, MIME sniffing, and the debug file sink.

pub mod debug_sink;
pub mod decode;
pub mod mime_detect;

pub use debug_sink::DebugSink;
pub use decode::{decode_image, DecodedImage};
pub use mime_detect::sniff_image_mime;
