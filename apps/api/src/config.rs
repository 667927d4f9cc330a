use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Passed explicitly into the blob store and scorer constructors.
#[derive(Debug, Clone)]
pub struct Config {
    pub s3_bucket: String,
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    /// When set, resumes are read from this directory instead of object storage.
    pub resume_dir: Option<PathBuf>,
    pub signed_url_ttl: Duration,
    /// Lowercase extensions (without the dot) considered resume documents.
    pub document_extensions: Vec<String>,
    /// Optional at startup; every analysis request fails until it is set.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub scorer_timeout: Duration,
    pub single_failure_policy: SingleFailurePolicy,
    pub port: u16,
    pub rust_log: String,
}

/// How the single-resume endpoint reports an extraction or scoring failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SingleFailurePolicy {
    /// Fail the request with an error distinct from "not found".
    #[default]
    Surface,
    /// Succeed with empty `data` and the failure listed, like the batch endpoint.
    Omit,
}

impl FromStr for SingleFailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "surface" => Ok(Self::Surface),
            "omit" => Ok(Self::Omit),
            other => bail!("unknown single failure policy '{other}' (expected 'surface' or 'omit')"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let aws_access_key_id = optional_env("AWS_ACCESS_KEY_ID");
        let aws_secret_access_key = optional_env("AWS_SECRET_ACCESS_KEY");
        if aws_access_key_id.is_some() != aws_secret_access_key.is_some() {
            bail!("AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together");
        }

        Ok(Config {
            s3_bucket: env_or("S3_BUCKET", "user-resumes"),
            s3_endpoint: optional_env("S3_ENDPOINT"),
            s3_region: env_or("S3_REGION", "us-east-1"),
            aws_access_key_id,
            aws_secret_access_key,
            resume_dir: optional_env("RESUME_DIR").map(PathBuf::from),
            signed_url_ttl: Duration::from_secs(parse_env("SIGNED_URL_TTL_SECS", 3600)?),
            document_extensions: parse_extensions(&env_or("DOCUMENT_EXTENSIONS", "pdf")),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_model: env_or("OPENAI_MODEL", "gpt-3.5-turbo"),
            scorer_timeout: Duration::from_secs(parse_env("SCORER_TIMEOUT_SECS", 120)?),
            single_failure_policy: parse_env("SINGLE_FAILURE_POLICY", SingleFailurePolicy::Surface)?,
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
    }
}

/// Splits a comma-separated extension list, dropping dots, blanks and case.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    let mut exts: Vec<String> = raw
        .split(',')
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();
    exts.sort();
    exts.dedup();
    exts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parses_case_insensitively() {
        assert_eq!(
            "Surface".parse::<SingleFailurePolicy>().unwrap(),
            SingleFailurePolicy::Surface
        );
        assert_eq!(
            " omit ".parse::<SingleFailurePolicy>().unwrap(),
            SingleFailurePolicy::Omit
        );
    }

    #[test]
    fn test_policy_rejects_unknown_value() {
        assert!("drop".parse::<SingleFailurePolicy>().is_err());
    }

    #[test]
    fn test_parse_extensions_normalizes() {
        assert_eq!(parse_extensions(".PDF, docx,,pdf "), vec!["docx", "pdf"]);
    }

    #[test]
    fn test_parse_extensions_empty() {
        assert!(parse_extensions(" , ").is_empty());
    }
}
