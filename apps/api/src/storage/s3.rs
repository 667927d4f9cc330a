use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{BlobError, BlobObject, BlobStore};
use crate::config::Config;

/// Blob store backed by an S3-compatible bucket (AWS S3 or MinIO).
#[derive(Clone)]
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Constructs a client configured for MinIO (custom endpoint) or AWS.
    /// Static credentials are used when configured, the default provider chain otherwise.
    pub async fn from_config(config: &Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.s3_region.clone()));

        if let (Some(key_id), Some(secret)) =
            (&config.aws_access_key_id, &config.aws_secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                key_id,
                secret,
                None,
                None,
                "resume-api-static",
            ));
        }
        if let Some(endpoint) = &config.s3_endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            // MinIO only serves path-style requests
            .force_path_style(config.s3_endpoint.is_some())
            .build();

        Self::new(aws_sdk_s3::Client::from_conf(s3_config), &config.s3_bucket)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn list(&self) -> Result<Vec<String>, BlobError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .into_paginator()
            .send();

        let mut names = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                BlobError::Transport(format!(
                    "listing bucket '{}': {}",
                    self.bucket,
                    DisplayErrorContext(&e)
                ))
            })?;
            names.extend(
                page.contents()
                    .iter()
                    .filter_map(|obj| obj.key().map(String::from)),
            );
        }

        debug!("Listed {} objects in bucket {}", names.len(), self.bucket);
        Ok(names)
    }

    async fn download(&self, name: &str) -> Result<BlobObject, BlobError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|se| se.is_no_such_key()) == Some(true) {
                    BlobError::NotFound(name.to_string())
                } else {
                    BlobError::Transport(format!("reading '{name}': {}", DisplayErrorContext(&e)))
                }
            })?;

        let last_modified = output.last_modified().and_then(|t| from_epoch_secs(t.secs()));

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| BlobError::Transport(format!("reading body of '{name}': {e}")))?
            .into_bytes();

        Ok(BlobObject {
            bytes,
            last_modified,
        })
    }

    async fn signed_url(&self, name: &str, ttl: Duration) -> Result<String, BlobError> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| BlobError::Transport(format!("invalid URL lifetime: {e}")))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .presigned(presigning)
            .await
            .map_err(|e| {
                BlobError::Transport(format!("signing URL for '{name}': {}", DisplayErrorContext(&e)))
            })?;

        Ok(request.uri().to_string())
    }
}

fn from_epoch_secs(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
}
