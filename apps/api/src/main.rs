mod analysis;
mod config;
mod errors;
mod extract;
mod llm_client;
mod models;
mod routes;
mod state;
mod storage;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::engine::ScoringEngine;
use crate::config::Config;
use crate::extract::PdfTextExtractor;
use crate::llm_client::{LlmClient, LlmError};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{BlobStore, LocalBlobStore, S3BlobStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume API v{}", env!("CARGO_PKG_VERSION"));

    let blob_store = build_blob_store(&config).await;
    let engine = build_engine(&config)?;

    let state = AppState {
        blob_store,
        extractor: Arc::new(PdfTextExtractor),
        engine,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Local directory when `RESUME_DIR` is set, S3 / MinIO otherwise.
async fn build_blob_store(config: &Config) -> Arc<dyn BlobStore> {
    match &config.resume_dir {
        Some(dir) => {
            info!("Blob store: local directory {}", dir.display());
            Arc::new(LocalBlobStore::new(dir))
        }
        None => {
            let store = S3BlobStore::from_config(config).await;
            info!("Blob store: S3 bucket {}", config.s3_bucket);
            Arc::new(store)
        }
    }
}

/// A missing API key is not fatal at startup; analysis requests report it instead.
fn build_engine(config: &Config) -> Result<Option<ScoringEngine>> {
    match LlmClient::from_config(config) {
        Ok(llm) => {
            info!("LLM client initialized (model: {})", llm.model());
            Ok(Some(ScoringEngine::new(Arc::new(llm), config.scorer_timeout)))
        }
        Err(LlmError::MissingApiKey) => {
            warn!("OPENAI_API_KEY is not set; analysis endpoints will return errors");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
