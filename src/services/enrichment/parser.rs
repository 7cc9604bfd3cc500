//! Strict parsing of model output
//!
//! Two layers are checked: the `generateContent` envelope (error object,
//! candidates, finish reason, text) and the JSON reply the prompt asks for
//! (summary, total score, similarity features). Anything off-shape is an
//! error; a partially filled report is never returned.
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::EnrichmentError;
use crate::models::{EnrichmentReport, FeatureScore, GenerateContentResponse};

/// The only finish reason accepted as a complete generation
const CLEAN_STOP: &str = "STOP";

const FENCE: &str = "```";

/// Extracts the reply text from a `generateContent` response body
pub fn parse_envelope(body: &str) -> Result<String, EnrichmentError> {
    let envelope: GenerateContentResponse = serde_json::from_str(body)?;
    extract_text(envelope)
}

/// Extracts the reply text, rejecting anything but a clean stop
pub fn extract_text(envelope: GenerateContentResponse) -> Result<String, EnrichmentError> {
    if let Some(error) = envelope.error {
        return Err(EnrichmentError::UpstreamError(error.to_string()));
    }

    let candidate = envelope
        .candidates
        .into_iter()
        .next()
        .ok_or(EnrichmentError::NoCandidates)?;

    match candidate.finish_reason.as_deref() {
        Some(CLEAN_STOP) => {}
        other => {
            return Err(EnrichmentError::IncompleteGeneration(
                other.unwrap_or("UNKNOWN").to_string(),
            ))
        }
    }

    candidate
        .content
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .filter(|text| !text.trim().is_empty())
        .ok_or(EnrichmentError::EmptyText)
}

/// Returns the body of the first fenced code block, or the whole text
///
/// Fences only count at the start of a line, so backticks inside a JSON
/// string leave an unfenced reply intact. A language tag after the opening
/// fence (```` ```json ````) is skipped. An unterminated fence yields
/// everything after the opening fence.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = line_start_fence(trimmed) else {
        return trimmed;
    };

    let after_open = trimmed[open + FENCE.len()..]
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    let close = line_start_fence(after_open).or_else(|| {
        let tail = after_open.trim_end();
        tail.ends_with(FENCE).then(|| tail.len() - FENCE.len())
    });

    let body = match close {
        Some(close) => &after_open[..close],
        None => after_open,
    };

    body.trim()
}

/// Byte offset of the first fence that opens a line
fn line_start_fence(text: &str) -> Option<usize> {
    text.match_indices(FENCE).map(|(i, _)| i).find(|&i| {
        let line = text[..i].trim_end_matches([' ', '\t']);
        line.is_empty() || line.ends_with('\n')
    })
}

/// Parses and validates the model's JSON reply
pub fn parse_report(text: &str) -> Result<EnrichmentReport, EnrichmentError> {
    let payload = strip_code_fence(text);
    let value: Value = serde_json::from_str(payload)?;
    let object = value
        .as_object()
        .ok_or_else(|| EnrichmentError::MissingField("summary".to_string()))?;

    let summary = object
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|summary| !summary.is_empty())
        .ok_or_else(|| EnrichmentError::MissingField("summary".to_string()))?;

    let total_score = score_field(object, "totalScore", "totalScore")?;

    let raw_features = object
        .get("similarFeatures")
        .and_then(Value::as_object)
        .ok_or_else(|| EnrichmentError::MissingField("similarFeatures".to_string()))?;

    if raw_features.is_empty() {
        return Err(EnrichmentError::NoFeatures);
    }

    let mut features = BTreeMap::new();
    for (name, raw) in raw_features {
        let path = format!("similarFeatures.{}", name);
        let feature = raw
            .as_object()
            .ok_or_else(|| EnrichmentError::MissingField(path.clone()))?;

        let score = score_field(feature, "score", &format!("{}.score", path))?;
        let explanation = feature
            .get("explanation")
            .and_then(Value::as_str)
            .ok_or_else(|| EnrichmentError::MissingField(format!("{}.explanation", path)))?;

        features.insert(
            name.clone(),
            FeatureScore {
                score,
                explanation: explanation.trim().to_string(),
            },
        );
    }

    Ok(EnrichmentReport {
        summary: summary.to_string(),
        total_score,
        features,
    })
}

/// Reads a numeric 0-100 field, rounding to the nearest integer
fn score_field(object: &Map<String, Value>, key: &str, path: &str) -> Result<u8, EnrichmentError> {
    let value = object
        .get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| EnrichmentError::MissingField(path.to_string()))?;

    if !(0.0..=100.0).contains(&value) {
        return Err(EnrichmentError::OutOfRange {
            field: path.to_string(),
            value,
        });
    }

    Ok(value.round() as u8)
}
