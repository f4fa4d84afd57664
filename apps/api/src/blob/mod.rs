//! Blob store: raw template and resume documents.
//!
//! Templates are enumerated and fetched during ingestion; uploaded resumes are
//! stored and served back for download. Ids are keys relative to the store's
//! prefix.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod s3;

pub use s3::S3BlobStore;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("S3 error: {0}")]
    S3(String),
}

/// Listing-level facts about a stored blob.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobInfo {
    pub id: String,
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// A fetched blob with its bytes and user metadata.
#[derive(Debug, Clone)]
pub struct Blob {
    pub info: BlobInfo,
    pub content_type: Option<String>,
    /// User metadata (`title`, `filename`, `category`, ...). Keys are lowercase.
    pub metadata: HashMap<String, String>,
    pub bytes: Bytes,
}

impl Blob {
    /// Original filename: `filename` metadata, else the last path segment of the id.
    pub fn filename(&self) -> String {
        self.metadata
            .get("filename")
            .filter(|f| !f.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| {
                self.info
                    .id
                    .rsplit('/')
                    .next()
                    .unwrap_or(&self.info.id)
                    .to_string()
            })
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Enumerates every blob under this store's prefix.
    async fn list(&self) -> Result<Vec<BlobInfo>, BlobError>;

    /// Fetches one blob. Missing ids are `BlobError::NotFound`.
    async fn fetch(&self, id: &str) -> Result<Blob, BlobError>;

    async fn put(
        &self,
        id: &str,
        bytes: Bytes,
        content_type: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<(), BlobError>;
}
