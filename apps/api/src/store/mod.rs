//! Template Store: persists (content, metadata, embedding) per template id and
//! answers nearest-neighbour queries.
//!
//! `TemplateStore` is the raw vector-store contract. `TemplateIndex` is the
//! collection handle the rest of the service uses: it owns the embedding
//! provider, bounds every call by a timeout, and exposes text-in operations.
//!
//! Backends:
//! - `PgVectorStore` (Postgres + pgvector) for deployments.
//! - `InMemoryStore` for local runs without a database, and for tests.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::models::template::{Metadata, Template};

pub mod memory;
pub mod pgvector;

pub use memory::InMemoryStore;
pub use pgvector::PgVectorStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Embedding has {actual} dimensions, collection expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Malformed stored record: {0}")]
    Malformed(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure of a text-level index operation: either the embedding could not be
/// computed or the store rejected the call.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Embedding provider failed: {0}")]
    Provider(#[from] EmbeddingError),

    #[error("Template store failed: {0}")]
    Store(#[from] StoreError),
}

/// Which vector-store backend holds the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    PgVector,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pgvector" | "postgres" => Ok(Self::PgVector),
            "memory" => Ok(Self::Memory),
            other => bail!("TEMPLATE_STORE must be 'pgvector' or 'memory', got '{other}'"),
        }
    }
}

/// Distance reported by the store. Lower means more similar.
///
/// Both metrics are bounded on unit-normalized embeddings (cosine in [0, 2],
/// L2 in [0, 2]); similarity conversion clamps at 1.0 regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    Cosine,
    L2,
}

impl FromStr for DistanceMetric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "l2" | "euclidean" => Ok(Self::L2),
            other => bail!("DISTANCE_METRIC must be 'cosine' or 'l2', got '{other}'"),
        }
    }
}

/// One nearest-neighbour hit, as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    pub distance: f64,
}

/// Raw vector-store contract.
///
/// `query` must return at most `top_k` candidates, nearest first. Ties keep
/// insertion order. `upsert` overwrites any entry with the same id.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn upsert(
        &self,
        id: &str,
        embedding: &[f32],
        content: &str,
        metadata: &Metadata,
    ) -> Result<(), StoreError>;

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<Candidate>, StoreError>;

    /// Number of templates in the collection.
    async fn count(&self) -> Result<usize, StoreError>;

    /// Up to `limit` stored templates, oldest first.
    async fn peek(&self, limit: usize) -> Result<Vec<Template>, StoreError>;
}

/// Process-wide collection handle. Cheap to clone; shared across requests
/// without extra locking, relying on the backing store's own concurrency.
#[derive(Clone)]
pub struct TemplateIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn TemplateStore>,
    timeout: Duration,
}

impl TemplateIndex {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn TemplateStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            store,
            timeout,
        }
    }

    /// Embeds `content` and upserts it under `id`.
    pub async fn upsert_text(
        &self,
        id: &str,
        content: &str,
        metadata: &Metadata,
    ) -> Result<(), IndexError> {
        let embedding = self.embed(content).await?;
        tokio::time::timeout(
            self.timeout,
            self.store.upsert(id, &embedding, content, metadata),
        )
        .await
        .map_err(|_| StoreError::Timeout(self.timeout))??;
        debug!("Upserted template {id} ({} dims)", embedding.len());
        Ok(())
    }

    /// Embeds `text` and returns up to `top_k` nearest templates, nearest first.
    pub async fn query_text(&self, text: &str, top_k: usize) -> Result<Vec<Candidate>, IndexError> {
        let embedding = self.embed(text).await?;
        let candidates = tokio::time::timeout(self.timeout, self.store.query(&embedding, top_k))
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))??;
        Ok(candidates)
    }

    pub async fn count(&self) -> Result<usize, StoreError> {
        tokio::time::timeout(self.timeout, self.store.count())
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }

    pub async fn peek(&self, limit: usize) -> Result<Vec<Template>, StoreError> {
        tokio::time::timeout(self.timeout, self.store.peek(limit))
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        tokio::time::timeout(self.timeout, self.embedder.embed(text))
            .await
            .map_err(|_| EmbeddingError::Timeout(self.timeout))?
    }
}
