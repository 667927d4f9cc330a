use std::sync::Arc;

use crate::analysis::engine::ScoringEngine;
use crate::config::Config;
use crate::errors::AppError;
use crate::extract::TextExtractor;
use crate::storage::BlobStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// S3 / MinIO in production, a local directory when `RESUME_DIR` is set.
    pub blob_store: Arc<dyn BlobStore>,
    pub extractor: Arc<dyn TextExtractor>,
    /// `None` when no scorer credentials are configured.
    pub engine: Option<ScoringEngine>,
    pub config: Config,
}

impl AppState {
    /// The scoring engine, or a configuration error when credentials are missing.
    pub fn engine(&self) -> Result<&ScoringEngine, AppError> {
        self.engine.as_ref().ok_or_else(|| {
            AppError::Configuration("OPENAI_API_KEY is not set; resume scoring is unavailable".to_string())
        })
    }
}
