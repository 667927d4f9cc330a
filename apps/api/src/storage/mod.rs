//! Blob Store: lists, downloads and issues access URLs for resume documents.
//!
//! `AppState` holds an `Arc<dyn BlobStore>`, chosen at startup:
//! `S3BlobStore` for S3 / MinIO, `LocalBlobStore` when `RESUME_DIR` is set.

pub mod local;
pub mod s3;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use local::LocalBlobStore;
pub use s3::S3BlobStore;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("object '{0}' not found")]
    NotFound(String),

    #[error("storage transport error: {0}")]
    Transport(String),
}

/// A downloaded object.
#[derive(Debug, Clone)]
pub struct BlobObject {
    pub bytes: Bytes,
    pub last_modified: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Names of every object in the bucket.
    async fn list(&self) -> Result<Vec<String>, BlobError>;

    async fn download(&self, name: &str) -> Result<BlobObject, BlobError>;

    /// An access URL for `name` that stays valid for `ttl`.
    async fn signed_url(&self, name: &str, ttl: Duration) -> Result<String, BlobError>;
}

/// True when `name` ends in one of `extensions` (lowercase, no dot).
pub fn has_document_extension(name: &str, extensions: &[String]) -> bool {
    std::path::Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            extensions.iter().any(|e| *e == ext)
        })
        .unwrap_or(false)
}
