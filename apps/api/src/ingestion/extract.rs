//! Raw document bytes -> plain text.
//!
//! PDF parsing is CPU-bound and runs on the blocking pool. A panic inside the
//! parser surfaces as a `JoinError` and is reported as an extraction failure.

use bytes::Bytes;

use super::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Detects the document kind from content type, filename and magic bytes.
    pub fn detect(content_type: Option<&str>, filename: &str, bytes: &[u8]) -> Option<Self> {
        let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
        let filename = filename.to_ascii_lowercase();

        if content_type.contains("pdf") || filename.ends_with(".pdf") || bytes.starts_with(b"%PDF")
        {
            Some(Self::Pdf)
        } else if content_type.starts_with("text/")
            || filename.ends_with(".txt")
            || filename.ends_with(".md")
        {
            Some(Self::PlainText)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::PlainText => "text",
        }
    }
}

/// Extracts trimmed text from a document.
pub async fn extract_text(id: &str, kind: DocumentKind, bytes: Bytes) -> Result<String, IngestError> {
    let text = match kind {
        DocumentKind::PlainText => String::from_utf8_lossy(&bytes).into_owned(),
        DocumentKind::Pdf => tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| IngestError::Extraction {
                id: id.to_string(),
                message: format!("PDF parser aborted: {e}"),
            })?
            .map_err(|e| IngestError::Extraction {
                id: id.to_string(),
                message: e.to_string(),
            })?,
    };
    Ok(text.trim().to_string())
}
