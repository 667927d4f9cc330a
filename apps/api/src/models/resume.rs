use bytes::Bytes;
use chrono::{DateTime, Utc};

/// One resume as it moves through a request: downloaded, extracted, scored, dropped.
#[derive(Debug, Clone)]
pub struct ResumeRecord {
    /// Object name in the blob store. Unique within one batch.
    pub name: String,
    /// Raw document bytes exactly as downloaded.
    pub raw: Bytes,
    /// Extracted plain text. `None` until extraction has run.
    pub text: Option<String>,
    /// Time-limited access URL to the original object.
    pub url: String,
    /// Last-modified time reported by the store, or the download time.
    pub created_at: DateTime<Utc>,
}

impl ResumeRecord {
    pub fn new(name: impl Into<String>, raw: Bytes, url: String, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            raw,
            text: None,
            url,
            created_at,
        }
    }

    /// Attaches extracted text, consuming the record.
    pub fn with_text(mut self, text: String) -> Self {
        self.text = Some(text);
        self
    }

    /// Extracted text, or an empty string if extraction has not run.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}
