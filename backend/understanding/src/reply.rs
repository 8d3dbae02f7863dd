//! Turning a model reply into an [`AnalysisResult`].
//!
//! Models asked for "JSON only" still wrap it in Markdown fences or chat
//! around it now and then, so text replies are unwrapped before parsing.

use qmark_core::{AnalysisError, AnalysisResult, VisionReply};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct RawVerdict {
    similarity: f64,
    feedback: String,
    feedback_ko: String,
}

/// Parse a reply into the three-field verdict.
///
/// Non-integral similarity is truncated toward zero; anything outside 0..=100,
/// a missing key, or a wrong type is a [`AnalysisError::ResponseShape`].
pub fn parse_analysis_reply(reply: &VisionReply) -> Result<AnalysisResult, AnalysisError> {
    let value = match reply {
        VisionReply::Structured(value) => value.clone(),
        VisionReply::Text(text) => extract_json_object(text).ok_or_else(|| {
            AnalysisError::ResponseShape(format!("no JSON object in reply: {}", excerpt(text)))
        })?,
    };

    // Gemini JSON mode occasionally answers with a one-element array.
    let value = match value {
        Value::Array(mut items) if items.len() == 1 && items[0].is_object() => items.remove(0),
        other => other,
    };

    let raw: RawVerdict =
        serde_json::from_value(value).map_err(|e| AnalysisError::ResponseShape(e.to_string()))?;

    if !raw.similarity.is_finite() || !(0.0..=100.0).contains(&raw.similarity) {
        return Err(AnalysisError::ResponseShape(format!(
            "similarity {} is outside 0..=100",
            raw.similarity
        )));
    }

    Ok(AnalysisResult::new(
        raw.similarity.trunc() as u8,
        raw.feedback,
        raw.feedback_ko,
    ))
}

/// Find the JSON object in free-form model text.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let raw = strip_code_fence(text);
    if raw.is_empty() {
        return None;
    }
    let mut candidates = vec![raw];
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if end > start {
            candidates.push(&raw[start..=end]);
        }
    }
    candidates
        .into_iter()
        .filter_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
        .find(|parsed| parsed.is_object() || parsed.is_array())
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_suffix("```").unwrap_or(body);
    let body = body.trim_start();
    let body = match body.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &body[4..],
        _ => body,
    };
    body.trim()
}

fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(120).collect();
    if text.chars().count() > 120 {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> VisionReply {
        VisionReply::Text(s.to_string())
    }

    #[test]
    fn structured_reply_maps_exactly() {
        let reply = VisionReply::Structured(json!({
            "similarity": 87, "feedback": "Close!", "feedback_ko": "좋아요!"
        }));
        assert_eq!(
            parse_analysis_reply(&reply).unwrap(),
            AnalysisResult::new(87, "Close!", "좋아요!")
        );
    }

    #[test]
    fn fenced_text_reply_parses() {
        let reply = text("```json\n{\"similarity\": 42, \"feedback\": \"Add a dot.\", \"feedback_ko\": \"점을 찍어 보세요!\"}\n```");
        let result = parse_analysis_reply(&reply).unwrap();
        assert_eq!(result.similarity, 42);
        assert_eq!(result.feedback_localized, "점을 찍어 보세요!");
    }

    #[test]
    fn prose_around_object_is_ignored() {
        let reply = text("Sure! Here you go: {\"similarity\": 10, \"feedback\": \"f\", \"feedback_ko\": \"k\"} Hope it helps.");
        assert_eq!(parse_analysis_reply(&reply).unwrap().similarity, 10);
    }

    #[test]
    fn fractional_similarity_is_truncated() {
        let reply = text(r#"{"similarity": 87.6, "feedback": "f", "feedback_ko": "k"}"#);
        assert_eq!(parse_analysis_reply(&reply).unwrap().similarity, 87);
    }

    #[test]
    fn single_element_array_is_unwrapped() {
        let reply = text(r#"[{"similarity": 5, "feedback": "f", "feedback_ko": "k"}]"#);
        assert_eq!(parse_analysis_reply(&reply).unwrap().similarity, 5);
    }

    #[test]
    fn missing_key_is_shape_error() {
        let reply = text(r#"{"similarity": 5, "feedback": "f"}"#);
        let err = parse_analysis_reply(&reply).unwrap_err();
        assert!(matches!(err, AnalysisError::ResponseShape(_)));
        assert!(err.to_string().contains("feedback_ko"));
    }

    #[test]
    fn out_of_range_similarity_is_shape_error() {
        for bad in ["101", "-1"] {
            let reply = text(&format!(r#"{{"similarity": {bad}, "feedback": "f", "feedback_ko": "k"}}"#));
            assert!(matches!(
                parse_analysis_reply(&reply),
                Err(AnalysisError::ResponseShape(_))
            ));
        }
    }

    #[test]
    fn non_json_text_is_shape_error() {
        let err = parse_analysis_reply(&text("I cannot see an image.")).unwrap_err();
        assert!(matches!(err, AnalysisError::ResponseShape(_)));
    }
}
