//! Resume loading: blob store object → downloaded record → extracted text.
//!
//! A download failure fails the whole load. An extraction failure only drops that
//! resume; it is logged and reported in `LoadedBatch::failures`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::extract::{ExtractError, TextExtractor};
use crate::models::analysis::{FailureStage, ItemFailure};
use crate::models::resume::ResumeRecord;
use crate::storage::{has_document_extension, BlobError, BlobStore};

/// Records ready for scoring plus those that dropped out during extraction.
#[derive(Debug, Default)]
pub struct LoadedBatch {
    pub records: Vec<ResumeRecord>,
    pub failures: Vec<ItemFailure>,
}

/// Downloads `name` and issues its access URL. Both must succeed.
pub async fn fetch_resume(
    store: &dyn BlobStore,
    name: &str,
    url_ttl: Duration,
) -> Result<ResumeRecord, BlobError> {
    let (object, url) = tokio::try_join!(store.download(name), store.signed_url(name, url_ttl))?;
    let created_at = object.last_modified.unwrap_or_else(Utc::now);
    Ok(ResumeRecord::new(name, object.bytes, url, created_at))
}

/// Runs the extractor on the blocking pool and attaches the text to the record.
pub async fn extract_resume(
    extractor: Arc<dyn TextExtractor>,
    record: ResumeRecord,
) -> Result<ResumeRecord, (ResumeRecord, ExtractError)> {
    let raw = record.raw.clone();
    let extracted = tokio::task::spawn_blocking(move || extractor.extract(&raw))
        .await
        .unwrap_or_else(|e| Err(ExtractError::Panicked(e.to_string())));

    match extracted {
        Ok(text) => Ok(record.with_text(text)),
        Err(e) => Err((record, e)),
    }
}

/// Loads exactly one named resume.
pub async fn load_resume(
    store: &dyn BlobStore,
    extractor: Arc<dyn TextExtractor>,
    name: &str,
    url_ttl: Duration,
) -> Result<LoadedBatch, BlobError> {
    let record = fetch_resume(store, name, url_ttl).await?;
    let mut batch = LoadedBatch::default();
    push_extracted(&mut batch, extract_resume(extractor, record).await);
    Ok(batch)
}

/// Loads every object in the store whose extension is in `extensions`.
pub async fn load_all_resumes(
    store: &dyn BlobStore,
    extractor: Arc<dyn TextExtractor>,
    url_ttl: Duration,
    extensions: &[String],
) -> Result<LoadedBatch, BlobError> {
    let names: Vec<String> = store
        .list()
        .await?
        .into_iter()
        .filter(|name| has_document_extension(name, extensions))
        .collect();
    info!("Loading {} resume documents", names.len());

    let mut records = Vec::with_capacity(names.len());
    for name in &names {
        records.push(fetch_resume(store, name, url_ttl).await?);
    }

    let mut batch = LoadedBatch::default();
    for record in records {
        push_extracted(&mut batch, extract_resume(Arc::clone(&extractor), record).await);
    }
    Ok(batch)
}

fn push_extracted(
    batch: &mut LoadedBatch,
    extracted: Result<ResumeRecord, (ResumeRecord, ExtractError)>,
) {
    match extracted {
        Ok(record) => batch.records.push(record),
        Err((record, e)) => {
            warn!("Skipping {}: text extraction failed: {e}", record.name);
            batch
                .failures
                .push(ItemFailure::new(record.name, FailureStage::Extraction, e));
        }
    }
}
