use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::{BlobError, BlobObject, BlobStore};

/// Blob store over a flat local directory. Used for development without object storage.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves an object name to a file directly under the root.
    /// Anything that would escape the root is reported as not found.
    fn resolve(&self, name: &str) -> Result<PathBuf, BlobError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(file)), None) => Ok(self.root.join(file)),
            _ => Err(BlobError::NotFound(name.to_string())),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn list(&self) -> Result<Vec<String>, BlobError> {
        let mut dir = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            BlobError::Transport(format!("reading directory {}: {e}", self.root.display()))
        })?;

        let mut names = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| BlobError::Transport(e.to_string()))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn download(&self, name: &str) -> Result<BlobObject, BlobError> {
        let path = self.resolve(name)?;
        let map_err = |e: std::io::Error| match e.kind() {
            ErrorKind::NotFound => BlobError::NotFound(name.to_string()),
            _ => BlobError::Transport(format!("reading {}: {e}", path.display())),
        };

        let metadata = tokio::fs::metadata(&path).await.map_err(map_err)?;
        if !metadata.is_file() {
            return Err(BlobError::NotFound(name.to_string()));
        }
        let bytes = tokio::fs::read(&path).await.map_err(map_err)?;

        Ok(BlobObject {
            bytes: Bytes::from(bytes),
            last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    /// Local files have no expiring URLs; the lifetime is ignored.
    async fn signed_url(&self, name: &str, _ttl: Duration) -> Result<String, BlobError> {
        let path = self.resolve(name)?;
        let absolute = tokio::fs::canonicalize(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => BlobError::NotFound(name.to_string()),
            _ => BlobError::Transport(e.to_string()),
        })?;
        Ok(format!("file://{}", absolute.display()))
    }
}
