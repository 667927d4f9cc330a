//! In-memory collaborators shared by unit tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};

use crate::analysis::scorer::{ScoreError, Scorer};
use crate::config::{Config, SingleFailurePolicy};
use crate::extract::{ExtractError, TextExtractor};
use crate::models::resume::ResumeRecord;
use crate::storage::{BlobError, BlobObject, BlobStore};

/// Blob store over a name → bytes map. Names in `broken` fail with a transport error.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: BTreeMap<String, Bytes>,
    broken: HashSet<String>,
    pub downloads: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn with(mut self, name: &str, content: &str) -> Self {
        self.objects
            .insert(name.to_string(), Bytes::copy_from_slice(content.as_bytes()));
        self
    }

    pub fn broken(mut self, name: &str) -> Self {
        self.objects.insert(name.to_string(), Bytes::new());
        self.broken.insert(name.to_string());
        self
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list(&self) -> Result<Vec<String>, BlobError> {
        Ok(self.objects.keys().cloned().collect())
    }

    async fn download(&self, name: &str) -> Result<BlobObject, BlobError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.broken.contains(name) {
            return Err(BlobError::Transport(format!("connection reset reading {name}")));
        }
        let bytes = self
            .objects
            .get(name)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(name.to_string()))?;
        Ok(BlobObject {
            bytes,
            last_modified: Some(fixed_time()),
        })
    }

    async fn signed_url(&self, name: &str, ttl: Duration) -> Result<String, BlobError> {
        if !self.objects.contains_key(name) {
            return Err(BlobError::NotFound(name.to_string()));
        }
        Ok(format!("https://blobs.test/{name}?expires={}", ttl.as_secs()))
    }
}

/// Treats bytes as UTF-8 text. Content starting with `CORRUPT` fails to parse.
pub struct Utf8Extractor;

impl TextExtractor for Utf8Extractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let text = String::from_utf8_lossy(bytes).trim().to_string();
        if text.starts_with("CORRUPT") {
            return Err(ExtractError::Parse("xref table missing".to_string()));
        }
        if text.is_empty() {
            return Err(ExtractError::NoText);
        }
        Ok(text)
    }
}

type ReplyFn = dyn Fn(&str) -> Result<String, ScoreError> + Send + Sync;

/// Scorer that answers from a closure over the prompt.
/// With jitter enabled, each call sleeps a prompt-dependent few milliseconds so
/// completion order differs from submission order.
pub struct MockScorer {
    reply: Box<ReplyFn>,
    jitter: bool,
    pub calls: AtomicUsize,
}

impl MockScorer {
    pub fn new(reply: impl Fn(&str) -> Result<String, ScoreError> + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            jitter: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers with a well-formed reply carrying `percentage`.
    pub fn always(percentage: i64) -> Self {
        Self::new(move |_| Ok(reply_json(percentage)))
    }

    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scorer for MockScorer {
    async fn complete(&self, prompt: &str, _system: &str) -> Result<String, ScoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.jitter {
            let spread = prompt.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            tokio::time::sleep(Duration::from_millis(spread % 7)).await;
        }
        (self.reply)(prompt)
    }
}

/// A reply in the shape the scorer is asked for.
pub fn reply_json(percentage: i64) -> String {
    format!(
        r#"{{"matchPercentage": {percentage}, "insights": {{"strengths": ["Rust"], "improvements": ["Add metrics"], "missingSkills": ["Kafka"]}}}}"#
    )
}

pub fn fixed_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
}

/// An already-extracted record whose text is `text`.
pub fn extracted_record(name: &str, text: &str) -> ResumeRecord {
    ResumeRecord::new(
        name,
        Bytes::copy_from_slice(text.as_bytes()),
        format!("https://blobs.test/{name}"),
        fixed_time(),
    )
    .with_text(text.to_string())
}

/// Configuration with defaults and no credentials.
pub fn test_config() -> Config {
    Config {
        s3_bucket: "resumes-test".to_string(),
        s3_endpoint: None,
        s3_region: "us-east-1".to_string(),
        aws_access_key_id: None,
        aws_secret_access_key: None,
        resume_dir: None,
        signed_url_ttl: Duration::from_secs(3600),
        document_extensions: vec!["pdf".to_string()],
        openai_api_key: None,
        openai_base_url: "http://localhost:0/v1".to_string(),
        openai_model: "gpt-3.5-turbo".to_string(),
        scorer_timeout: Duration::from_secs(5),
        single_failure_policy: SingleFailurePolicy::Surface,
        port: 0,
        rust_log: "debug".to_string(),
    }
}
