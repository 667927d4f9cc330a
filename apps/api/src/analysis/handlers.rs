//! Axum route handlers for the Analysis API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::engine::BatchOutcome;
use crate::analysis::ingest::{load_all_resumes, load_resume, LoadedBatch};
use crate::config::SingleFailurePolicy;
use crate::errors::AppError;
use crate::models::analysis::{AnalysisResult, FailureStage, ItemFailure};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResumeRequest {
    pub resume_name: String,
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeAllRequest {
    pub job_description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub success: bool,
    pub data: Vec<AnalysisResult>,
    pub total_resumes: usize,
    pub failures: Vec<ItemFailure>,
}

impl AnalysisResponse {
    /// Extraction failures come first, then scoring failures, each in input order.
    fn new(extraction_failures: Vec<ItemFailure>, outcome: BatchOutcome) -> Self {
        let mut failures = extraction_failures;
        failures.extend(outcome.failures);
        Self {
            success: true,
            total_resumes: outcome.results.len(),
            data: outcome.results,
            failures,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /new-resume
///
/// Scores one named resume against a job description.
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeResumeRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let Json(request) = payload.map_err(invalid_body)?;
    require_non_empty("resumeName", &request.resume_name)?;
    require_non_empty("jobDescription", &request.job_description)?;

    // Fail before touching the store when scoring cannot happen
    let engine = state.engine()?;

    info!("Analyzing resume {}", request.resume_name);
    let LoadedBatch { records, failures } = load_resume(
        state.blob_store.as_ref(),
        state.extractor.clone(),
        &request.resume_name,
        state.config.signed_url_ttl,
    )
    .await?;

    let policy = state.config.single_failure_policy;
    surface_single_failure(policy, &failures)?;

    let outcome = engine.analyze(&request.job_description, &records).await;
    surface_single_failure(policy, &outcome.failures)?;

    Ok(Json(AnalysisResponse::new(failures, outcome)))
}

/// POST /
///
/// Scores every resume document in the store against a job description.
/// Individual extraction or scoring failures never fail the request.
pub async fn handle_analyze_all(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeAllRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let Json(request) = payload.map_err(invalid_body)?;
    require_non_empty("jobDescription", &request.job_description)?;

    let engine = state.engine()?;

    let LoadedBatch { records, failures } = load_all_resumes(
        state.blob_store.as_ref(),
        state.extractor.clone(),
        state.config.signed_url_ttl,
        &state.config.document_extensions,
    )
    .await?;

    let outcome = engine.analyze(&request.job_description, &records).await;

    Ok(Json(AnalysisResponse::new(failures, outcome)))
}

fn invalid_body(rejection: JsonRejection) -> AppError {
    AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
}

fn require_non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Under `Surface`, the first failure of a single-resume request becomes the error.
fn surface_single_failure(
    policy: SingleFailurePolicy,
    failures: &[ItemFailure],
) -> Result<(), AppError> {
    match (policy, failures.first()) {
        (SingleFailurePolicy::Surface, Some(failure)) => {
            let message = format!("{}: {}", failure.name, failure.reason);
            Err(match failure.stage {
                FailureStage::Extraction => AppError::Extraction(message),
                FailureStage::Scoring => AppError::Scoring(message),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_policy_maps_stage_to_error() {
        let extraction = [ItemFailure::new("a.pdf", FailureStage::Extraction, "no text")];
        assert!(matches!(
            surface_single_failure(SingleFailurePolicy::Surface, &extraction),
            Err(AppError::Extraction(msg)) if msg == "a.pdf: no text"
        ));

        let scoring = [ItemFailure::new("a.pdf", FailureStage::Scoring, "timed out")];
        assert!(matches!(
            surface_single_failure(SingleFailurePolicy::Surface, &scoring),
            Err(AppError::Scoring(_))
        ));
    }

    #[test]
    fn test_omit_policy_passes_failures_through() {
        let failures = [ItemFailure::new("a.pdf", FailureStage::Scoring, "bad json")];
        assert!(surface_single_failure(SingleFailurePolicy::Omit, &failures).is_ok());
        assert!(surface_single_failure(SingleFailurePolicy::Surface, &[]).is_ok());
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("jobDescription", "Rust engineer").is_ok());
        assert!(matches!(
            require_non_empty("jobDescription", "   "),
            Err(AppError::Validation(msg)) if msg.contains("jobDescription")
        ));
    }
}
