// Ingestion: blob store -> text extraction -> embedding -> template store.
// Single-item ingest reports failure explicitly; batch ingest never aborts on
// one bad document.

use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::store::{IndexError, StoreError};

pub mod extract;
pub mod handlers;
pub mod pipeline;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No extractable content in {0}")]
    NoExtractableContent(String),

    #[error("Embedding provider failed: {0}")]
    Provider(#[from] EmbeddingError),

    #[error("Template store failed: {0}")]
    Store(#[from] StoreError),

    #[error("Source document not found: {0}")]
    NotFound(String),

    #[error("Text extraction failed for {id}: {message}")]
    Extraction { id: String, message: String },

    #[error("Blob store failed: {0}")]
    Blob(String),
}

impl From<IndexError> for IngestError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::Provider(e) => IngestError::Provider(e),
            IndexError::Store(e) => IngestError::Store(e),
        }
    }
}

impl IngestError {
    /// Stable label used in batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::InvalidInput(_) => "invalid_input",
            IngestError::NoExtractableContent(_) => "no_extractable_content",
            IngestError::Provider(_) => "provider",
            IngestError::Store(_) => "store",
            IngestError::NotFound(_) => "not_found",
            IngestError::Extraction { .. } => "extraction",
            IngestError::Blob(_) => "blob",
        }
    }
}
