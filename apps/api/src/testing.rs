//! Test doubles shared by unit tests across modules.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::blob::{Blob, BlobError, BlobInfo, BlobStore};
use crate::config::Config;
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::llm_client::LlmClient;
use crate::models::template::{Metadata, Template};
use crate::retrieval::ranker::{SearchParams, TemplateRanker};
use crate::state::AppState;
use crate::store::{
    Candidate, DistanceMetric, InMemoryStore, StoreBackend, StoreError, TemplateIndex,
    TemplateStore,
};

const KEYWORD_DIMS: usize = 64;

/// Deterministic bag-of-words embedder: each lowercase word increments one
/// hashed bucket, then the vector is unit-normalized.
pub struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0_f32; KEYWORD_DIMS];
        let lowered = text.to_lowercase();
        for word in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = word
                .bytes()
                .fold(0_usize, |h, b| (h * 31 + usize::from(b)) % 1_000_003);
            vector[hash % KEYWORD_DIMS] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }

    fn model(&self) -> &str {
        "keyword-test"
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Api {
            status: 503,
            message: "provider unavailable".to_string(),
        })
    }

    fn model(&self) -> &str {
        "failing-test"
    }
}

/// Never completes; exercises timeouts.
pub struct HangingEmbedder;

#[async_trait]
impl EmbeddingProvider for HangingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        std::future::pending().await
    }

    fn model(&self) -> &str {
        "hanging-test"
    }
}

/// Returns `template-1..n` with fixed distances for every query, ignoring the
/// embedding and `top_k`.
pub struct ScriptedStore {
    candidates: Vec<Candidate>,
}

impl ScriptedStore {
    pub fn new(distances: &[f64]) -> Self {
        let candidates = distances
            .iter()
            .enumerate()
            .map(|(i, distance)| {
                let id = format!("template-{}", i + 1);
                let mut metadata = Metadata::new();
                metadata.insert("file_id".to_string(), format!("file-{}", i + 1).into());
                metadata.insert("filename".to_string(), format!("{id}.pdf").into());
                Candidate {
                    content: format!("Resume template {} content", i + 1),
                    id,
                    metadata,
                    distance: *distance,
                }
            })
            .collect();
        Self { candidates }
    }
}

#[async_trait]
impl TemplateStore for ScriptedStore {
    async fn upsert(
        &self,
        _id: &str,
        _embedding: &[f32],
        _content: &str,
        _metadata: &Metadata,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    async fn query(&self, _embedding: &[f32], _top_k: usize) -> Result<Vec<Candidate>, StoreError> {
        Ok(self.candidates.clone())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.candidates.len())
    }

    async fn peek(&self, limit: usize) -> Result<Vec<Template>, StoreError> {
        Ok(self
            .candidates
            .iter()
            .take(limit)
            .map(|c| Template::from_stored(&c.id, c.content.clone(), c.metadata.clone()))
            .collect())
    }
}

pub struct FailingStore;

#[async_trait]
impl TemplateStore for FailingStore {
    async fn upsert(
        &self,
        _id: &str,
        _embedding: &[f32],
        _content: &str,
        _metadata: &Metadata,
    ) -> Result<(), StoreError> {
        Err(StoreError::Malformed("store offline".to_string()))
    }

    async fn query(&self, _embedding: &[f32], _top_k: usize) -> Result<Vec<Candidate>, StoreError> {
        Err(StoreError::Malformed("store offline".to_string()))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Err(StoreError::Malformed("store offline".to_string()))
    }

    async fn peek(&self, _limit: usize) -> Result<Vec<Template>, StoreError> {
        Err(StoreError::Malformed("store offline".to_string()))
    }
}

/// Blob store kept in a map. Listing order is insertion order.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<Vec<Blob>>,
    /// Ids that `list` reports but `fetch` treats as missing.
    phantom: Vec<String>,
}

impl MemoryBlobStore {
    pub fn with_phantom(ids: &[&str]) -> Self {
        Self {
            blobs: RwLock::new(Vec::new()),
            phantom: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub async fn insert(&self, id: &str, bytes: &[u8], content_type: &str, metadata: &[(&str, &str)]) {
        let metadata = metadata
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.put(id, Bytes::copy_from_slice(bytes), content_type, &metadata)
            .await
            .unwrap();
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list(&self) -> Result<Vec<BlobInfo>, BlobError> {
        let mut infos: Vec<BlobInfo> = self.blobs.read().await.iter().map(|b| b.info.clone()).collect();
        infos.extend(self.phantom.iter().map(|id| BlobInfo {
            id: id.clone(),
            size: None,
            last_modified: None,
        }));
        Ok(infos)
    }

    async fn fetch(&self, id: &str) -> Result<Blob, BlobError> {
        self.blobs
            .read()
            .await
            .iter()
            .find(|b| b.info.id == id)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(id.to_string()))
    }

    async fn put(
        &self,
        id: &str,
        bytes: Bytes,
        content_type: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<(), BlobError> {
        let blob = Blob {
            info: BlobInfo {
                id: id.to_string(),
                size: Some(bytes.len() as u64),
                last_modified: None,
            },
            content_type: Some(content_type.to_string()),
            metadata: metadata.clone(),
            bytes,
        };
        let mut blobs = self.blobs.write().await;
        match blobs.iter_mut().find(|b| b.info.id == id) {
            Some(existing) => *existing = blob,
            None => blobs.push(blob),
        }
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: None,
        s3_bucket: "test-bucket".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        template_prefix: "templates/".to_string(),
        resume_prefix: "resumes/".to_string(),
        openai_api_key: "test".to_string(),
        embedding_model: "keyword-test".to_string(),
        embedding_base_url: "http://localhost:1".to_string(),
        anthropic_api_key: "test".to_string(),
        llm_model: crate::llm_client::DEFAULT_MODEL.to_string(),
        collection: "resume_templates".to_string(),
        store_backend: StoreBackend::Memory,
        distance_metric: DistanceMetric::Cosine,
        score_threshold: 0.6,
        top_k: 3,
        provider_timeout: Duration::from_secs(5),
        port: 0,
        rust_log: "debug".to_string(),
    }
}

/// App state over in-memory stores and the keyword embedder. Returns the
/// template library so tests can seed it.
pub fn test_state() -> (AppState, Arc<MemoryBlobStore>) {
    let config = test_config();
    let index = TemplateIndex::new(
        Arc::new(KeywordEmbedder),
        Arc::new(InMemoryStore::new(config.distance_metric)),
        config.provider_timeout,
    );
    let ranker = TemplateRanker::new(
        index.clone(),
        SearchParams {
            top_k: config.top_k,
            score_threshold: config.score_threshold,
        },
    );
    let template_blobs = Arc::new(MemoryBlobStore::default());
    let state = AppState {
        llm: LlmClient::new(config.anthropic_api_key.clone(), config.llm_model.clone()).unwrap(),
        config,
        index,
        ranker,
        template_blobs: template_blobs.clone(),
        resume_blobs: Arc::new(MemoryBlobStore::default()),
    };
    (state, template_blobs)
}
