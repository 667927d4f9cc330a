//! Scorer: the seam between the fan-out engine and the language model.
//!
//! The engine builds prompts and parses replies; a `Scorer` only moves text.
//! `LlmClient` is the production backend; tests plug in canned replies.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::llm_client::{strip_json_fences, LlmClient, LlmError};

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("scorer request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("scorer reply is not valid JSON of the expected shape: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("scorer call timed out after {0:?}")]
    TimedOut(Duration),

    #[error("scoring task failed: {0}")]
    TaskFailed(String),
}

#[async_trait]
pub trait Scorer: Send + Sync {
    /// Sends one system instruction plus one user prompt, returning the raw reply text.
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, ScoreError>;
}

#[async_trait]
impl Scorer for LlmClient {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, ScoreError> {
        Ok(self.call_text(prompt, system).await?)
    }
}

/// The reply shape requested from the scorer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorerReply {
    #[serde(deserialize_with = "lenient_percentage")]
    pub match_percentage: i64,
    #[serde(default, deserialize_with = "nullable_insights")]
    pub insights: Map<String, Value>,
}

/// Parses a raw scorer reply, tolerating markdown code fences around the JSON.
pub fn parse_reply(raw: &str) -> Result<ScorerReply, ScoreError> {
    Ok(serde_json::from_str(strip_json_fences(raw))?)
}

/// Accepts `82`, `82.4` or `"82"`; models are not consistent about the number type.
fn lenient_percentage<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i),
            None => n
                .as_f64()
                .and_then(round_to_i64)
                .ok_or_else(|| D::Error::custom(format!("matchPercentage out of range: {n}"))),
        },
        Value::String(s) => s
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(round_to_i64)
            .ok_or_else(|| D::Error::custom(format!("matchPercentage is not numeric: {s:?}"))),
        other => Err(D::Error::custom(format!(
            "matchPercentage must be a number, got {other}"
        ))),
    }
}

/// `None` for NaN, infinities and anything outside the `i64` range.
fn round_to_i64(f: f64) -> Option<i64> {
    let rounded = f.round();
    // i64::MAX is not representable as f64; 2^63 is the first value out of range
    (rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64)
        .then_some(rounded as i64)
}

/// `"insights": null` reads as an empty map.
fn nullable_insights<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_reply_full_shape() {
        let raw = r#"{"matchPercentage": 82, "insights": {"strengths": ["x"], "improvements": ["y"], "missingSkills": ["z"]}}"#;
        let reply = parse_reply(raw).unwrap();

        assert_eq!(reply.match_percentage, 82);
        assert_eq!(reply.insights.len(), 3);
        assert_eq!(reply.insights["strengths"], json!(["x"]));
        assert_eq!(reply.insights["improvements"], json!(["y"]));
        assert_eq!(reply.insights["missingSkills"], json!(["z"]));
    }

    #[test]
    fn test_parse_reply_strips_fences() {
        let raw = "```json\n{\"matchPercentage\": 40, \"insights\": {}}\n```";
        assert_eq!(parse_reply(raw).unwrap().match_percentage, 40);
    }

    #[test]
    fn test_parse_reply_rejects_prose() {
        let err = parse_reply("The candidate is a strong match.").unwrap_err();
        assert!(matches!(err, ScoreError::Malformed(_)));
    }

    #[test]
    fn test_parse_reply_requires_percentage() {
        assert!(parse_reply(r#"{"insights": {"strengths": []}}"#).is_err());
    }

    #[test]
    fn test_missing_insights_default_to_empty() {
        let reply = parse_reply(r#"{"matchPercentage": 10}"#).unwrap();
        assert!(reply.insights.is_empty());
    }

    #[test]
    fn test_lenient_percentage_forms() {
        assert_eq!(parse_reply(r#"{"matchPercentage": 82.6}"#).unwrap().match_percentage, 83);
        assert_eq!(parse_reply(r#"{"matchPercentage": "75%"}"#).unwrap().match_percentage, 75);
        assert!(parse_reply(r#"{"matchPercentage": "high"}"#).is_err());
        assert!(parse_reply(r#"{"matchPercentage": null}"#).is_err());
    }

    #[test]
    fn test_non_finite_percentage_is_malformed() {
        for raw in [
            r#"{"matchPercentage": "NaN"}"#,
            r#"{"matchPercentage": "inf"}"#,
            r#"{"matchPercentage": "-infinity"}"#,
            r#"{"matchPercentage": 1e300}"#,
            r#"{"matchPercentage": "1e30"}"#,
        ] {
            let err = parse_reply(raw).unwrap_err();
            assert!(matches!(err, ScoreError::Malformed(_)), "{raw}");
        }
    }

    #[test]
    fn test_null_insights_read_as_empty() {
        let reply = parse_reply(r#"{"matchPercentage": 70, "insights": null}"#).unwrap();
        assert_eq!(reply.match_percentage, 70);
        assert!(reply.insights.is_empty());
    }

    #[test]
    fn test_unvalidated_range_passes_through() {
        assert_eq!(parse_reply(r#"{"matchPercentage": 140}"#).unwrap().match_percentage, 140);
    }
}
