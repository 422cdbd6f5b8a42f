//! Loose parsing of model output into a recommendation list.
//!
//! Models asked for "JSON only" still wrap it in prose or code fences often
//! enough that strict parsing would throw away good answers. Candidate
//! selection order: interior of the first fenced code block, else the first
//! `{` through the last `}`, else the whole text.

use thiserror::Error;

use super::RecommendationList;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in model output")]
    NoJsonObject,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON object has no \"recommendations\" key")]
    MissingRecommendations,
}

/// Pure function from raw model text to a recommendation list.
pub fn parse_recommendations(raw: &str) -> Result<RecommendationList, ParseError> {
    let candidate = fenced_interior(raw).unwrap_or(raw);
    let candidate = trim_to_object(candidate).ok_or(ParseError::NoJsonObject)?;
    let value: serde_json::Value = serde_json::from_str(candidate)?;
    if value.get("recommendations").is_none() {
        return Err(ParseError::MissingRecommendations);
    }
    Ok(serde_json::from_value(value)?)
}

/// Interior of the first ``` fenced block, if any. Tolerates a `json` tag
/// after the opening fence.
fn fenced_interior(raw: &str) -> Option<&str> {
    let open = raw.find("```")?;
    let after = &raw[open + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    let close = after.find("```")?;
    Some(&after[..close])
}

/// Strips everything before the first `{` and after the last `}`.
fn trim_to_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end >= start).then(|| &text[start..=end])
}
