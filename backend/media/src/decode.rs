//! Base64 image decoding.
//!
//! Accepts bare base64 or a data URI (`data:image/png;base64,....`). Everything
//! up to and including the first comma is treated as the header and dropped.
//! Whitespace anywhere in the payload is ignored, so line-wrapped base64 works.
//! Trailing `=` padding is optional.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use qmark_core::AnalysisError;

/// Standard alphabet, padding accepted but not required.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Raw image bytes plus whatever the data-URI header claimed they were.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub declared_mime: Option<String>,
}

/// Decode a (possibly data-URI prefixed) base64 image.
pub fn decode_image(input: &str) -> Result<DecodedImage, AnalysisError> {
    let (header, payload) = match input.split_once(',') {
        Some((header, payload)) => (Some(header), payload),
        None => (None, input),
    };

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(AnalysisError::Decode("image payload is empty".into()));
    }

    let bytes = LENIENT
        .decode(compact.as_bytes())
        .map_err(|e| AnalysisError::Decode(e.to_string()))?;

    Ok(DecodedImage {
        bytes,
        declared_mime: header.and_then(declared_mime),
    })
}

/// `data:image/png;base64` → `image/png`
fn declared_mime(header: &str) -> Option<String> {
    let rest = header.trim().strip_prefix("data:")?;
    let mime = rest.split(';').next()?.trim();
    if mime.is_empty() {
        None
    } else {
        Some(mime.to_ascii_lowercase())
    }
}
