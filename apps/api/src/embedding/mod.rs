//! Embedding provider: turns text into fixed-length vectors.
//!
//! Only the template index talks to a provider. Nothing else in the service
//! reads or writes embeddings.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod openai;

pub use openai::OpenAiEmbedder;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Embedding provider rate limited the request")]
    RateLimited,

    #[error("Embedding provider returned no vector")]
    Empty,

    #[error("Embedding call timed out after {0:?}")]
    Timeout(Duration),
}

/// Computes embeddings for text. Implementations must be deterministic for
/// identical input so that re-ingestion reproduces the same vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Identifier of the model behind this provider, for logging.
    fn model(&self) -> &str;
}
