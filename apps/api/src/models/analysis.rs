use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One scored resume in an analysis response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Sequential id ("1", "2", ...) following input order within the batch.
    pub id: String,
    pub name: String,
    pub upload_date: DateTime<Utc>,
    pub file_url: String,
    /// As returned by the scorer; conventionally 0–100 but not validated.
    pub match_percentage: i64,
    /// Shape is dictated by the scorer; usually strengths / improvements / missingSkills.
    pub insights: Map<String, Value>,
}

/// Pipeline step at which a resume dropped out of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Extraction,
    Scoring,
}

/// A resume that produced no result, reported next to the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub name: String,
    pub stage: FailureStage,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(name: impl Into<String>, stage: FailureStage, reason: impl ToString) -> Self {
        Self {
            name: name.into(),
            stage,
            reason: reason.to_string(),
        }
    }
}
