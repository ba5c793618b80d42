//! Document text extraction.
//!
//! The sectioning core only ever sees a `String`; everything format-specific
//! lives behind [`TextExtractor`].

pub mod docx;
pub mod pdf;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("cannot read {name}: {reason}")]
    Io { name: String, reason: String },

    #[error("document is {size} bytes, limit is {max}")]
    TooLarge { size: u64, max: u64 },

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX extraction failed: {0}")]
    Docx(String),

    #[error("document contains no extractable text")]
    Empty,

    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Turns a document on disk into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    fn of(path: &Path) -> Result<Self, ExtractionError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "" => Err(ExtractionError::UnsupportedFormat("(no extension)".to_string())),
            other => Err(ExtractionError::UnsupportedFormat(format!(".{other}"))),
        }
    }
}

/// Extension-dispatching extractor for `.pdf` and `.docx` files.
#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    max_bytes: u64,
}

impl DocumentExtractor {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

#[async_trait]
impl TextExtractor for DocumentExtractor {
    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let kind = DocumentKind::of(path)?;
        let name = display_name(path);

        let meta = tokio::fs::metadata(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ExtractionError::NotFound(name.clone()),
            _ => ExtractionError::Io {
                name: name.clone(),
                reason: e.to_string(),
            },
        })?;
        if meta.len() > self.max_bytes {
            return Err(ExtractionError::TooLarge {
                size: meta.len(),
                max: self.max_bytes,
            });
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| ExtractionError::Io {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        // Both decoders are synchronous and CPU-bound.
        let text = tokio::task::spawn_blocking(move || match kind {
            DocumentKind::Pdf => pdf::extract_pdf_text(&bytes),
            DocumentKind::Docx => docx::extract_docx_text(&bytes),
        })
        .await
        .map_err(|e| ExtractionError::Task(e.to_string()))??;

        let text = clean_extracted(&text);
        if text.is_empty() {
            return Err(ExtractionError::Empty);
        }
        debug!(file = %name, chars = text.chars().count(), "Extracted document text");
        Ok(text)
    }
}

/// File name only; full paths stay out of errors and logs.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "<unnamed>".to_string())
}

/// Unified line endings, right-trimmed lines, at most one blank line in a row.
pub fn clean_extracted(s: &str) -> String {
    let unified = s.replace("\r\n", "\n").replace('\r', "\n");
    let mut out = String::with_capacity(unified.len());
    let mut blank_run = 0usize;
    for line in unified.split('\n') {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}
