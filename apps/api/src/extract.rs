//! Text Extractor: converts downloaded document bytes into plain text.

use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    #[error("PDF parser panicked: {0}")]
    Panicked(String),

    /// Image-only or empty documents extract to whitespace.
    #[error("document contains no extractable text")]
    NoText,
}

/// Synchronous, CPU-bound extraction. Callers run it on the blocking pool.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// Default extractor backed by the `pdf-extract` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        // pdf-extract panics on some malformed inputs instead of returning an error
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        }))
        .map_err(|payload| ExtractError::Panicked(panic_message(payload.as_ref())))?;

        let text = outcome.map_err(|e| ExtractError::Parse(e.to_string()))?;
        let text = normalize_text(&text);
        if text.is_empty() {
            return Err(ExtractError::NoText);
        }

        debug!("Extracted {} chars from {} bytes", text.len(), bytes.len());
        Ok(text)
    }
}

/// Trims every line and collapses runs of blank lines to a single blank line.
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = false;
    for line in raw.lines().map(str::trim) {
        if line.is_empty() {
            blank_run = !out.is_empty();
            continue;
        }
        if blank_run {
            out.push('\n');
            blank_run = false;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_fail() {
        let result = PdfTextExtractor.extract(b"this is not a pdf at all");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(PdfTextExtractor.extract(&[]).is_err());
    }

    #[test]
    fn test_normalize_text_collapses_blank_lines() {
        let raw = "\n\n  Jane Doe  \n\n\n\nRust Engineer\n  \n";
        assert_eq!(normalize_text(raw), "Jane Doe\n\nRust Engineer");
    }

    #[test]
    fn test_normalize_text_whitespace_only() {
        assert_eq!(normalize_text(" \n\t\n "), "");
    }

    #[test]
    fn test_panic_message_variants() {
        let static_payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(static_payload.as_ref()), "boom");

        let owned_payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(owned_payload.as_ref()), "bang");
    }
}
