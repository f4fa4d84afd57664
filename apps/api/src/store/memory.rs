use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Candidate, DistanceMetric, StoreError, TemplateStore};
use crate::models::template::{Metadata, Template};

struct Entry {
    id: String,
    content: String,
    metadata: Metadata,
    embedding: Vec<f32>,
}

/// Vector store held in process memory. Exact (brute-force) search.
///
/// Entries keep their first-insertion position across upserts, so equal
/// distances are returned in insertion order.
pub struct InMemoryStore {
    metric: DistanceMetric,
    entries: RwLock<Vec<Entry>>,
}

impl InMemoryStore {
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            entries: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TemplateStore for InMemoryStore {
    async fn upsert(
        &self,
        id: &str,
        embedding: &[f32],
        content: &str,
        metadata: &Metadata,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;

        if let Some(expected) = entries
            .iter()
            .find(|e| e.id != id)
            .map(|e| e.embedding.len())
        {
            if expected != embedding.len() {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        let entry = Entry {
            id: id.to_string(),
            content: content.to_string(),
            metadata: metadata.clone(),
            embedding: embedding.to_vec(),
        };
        match entries.iter_mut().find(|e| e.id == id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<Candidate>, StoreError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let entries = self.entries.read().await;

        let mut scored = Vec::with_capacity(entries.len());
        for entry in entries.iter() {
            if entry.embedding.len() != embedding.len() {
                return Err(StoreError::DimensionMismatch {
                    expected: entry.embedding.len(),
                    actual: embedding.len(),
                });
            }
            scored.push((distance(self.metric, embedding, &entry.embedding), entry));
        }
        // stable: ties stay in insertion order
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(distance, entry)| Candidate {
                id: entry.id.clone(),
                content: entry.content.clone(),
                metadata: entry.metadata.clone(),
                distance,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().await.len())
    }

    async fn peek(&self, limit: usize) -> Result<Vec<Template>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .take(limit)
            .map(|e| Template::from_stored(&e.id, e.content.clone(), e.metadata.clone()))
            .collect())
    }
}

fn distance(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f64 {
    match metric {
        DistanceMetric::L2 => a
            .iter()
            .zip(b)
            .map(|(x, y)| {
                let d = f64::from(*x) - f64::from(*y);
                d * d
            })
            .sum::<f64>()
            .sqrt(),
        DistanceMetric::Cosine => {
            let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
            for (x, y) in a.iter().zip(b) {
                let (x, y) = (f64::from(*x), f64::from(*y));
                dot += x * y;
                norm_a += x * x;
                norm_b += y * y;
            }
            if norm_a == 0.0 || norm_b == 0.0 {
                return 1.0;
            }
            1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(title: &str) -> Metadata {
        let mut m = Metadata::new();
        m.insert("title".to_string(), title.into());
        m
    }

    #[test]
    fn test_cosine_distance_of_identical_vectors_is_zero() {
        let d = distance(DistanceMetric::Cosine, &[0.6, 0.8], &[0.6, 0.8]);
        assert!(d.abs() < 1e-9, "distance was {d}");
    }

    #[test]
    fn test_cosine_distance_of_zero_vector_is_one() {
        assert_eq!(distance(DistanceMetric::Cosine, &[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[test]
    fn test_l2_distance() {
        let d = distance(DistanceMetric::L2, &[0.0, 0.0], &[3.0, 4.0]);
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_in_place() {
        let store = InMemoryStore::new(DistanceMetric::L2);
        store.upsert("a", &[1.0, 0.0], "first", &meta("A")).await.unwrap();
        store.upsert("b", &[0.0, 1.0], "second", &meta("B")).await.unwrap();
        store.upsert("a", &[1.0, 0.0], "first v2", &meta("A2")).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        let hits = store.query(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[0].content, "first v2");
        assert_eq!(hits[0].metadata["title"], "A2");
    }

    #[tokio::test]
    async fn test_peek_lists_oldest_first_up_to_limit() {
        let store = InMemoryStore::new(DistanceMetric::Cosine);
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.peek(5).await.unwrap().is_empty());

        store.upsert("a", &[1.0, 0.0], "first", &meta("A")).await.unwrap();
        store.upsert("b", &[0.0, 1.0], "second", &meta("B")).await.unwrap();
        store.upsert("c", &[1.0, 1.0], "third", &Metadata::new()).await.unwrap();
        store.upsert("a", &[1.0, 0.0], "first v2", &meta("A2")).await.unwrap();

        let sample = store.peek(2).await.unwrap();
        let ids: Vec<&str> = sample.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(sample[0].title, "A2");
        assert_eq!(sample[0].content, "first v2");

        let all = store.peek(10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].title, "c");
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let store = InMemoryStore::new(DistanceMetric::L2);
        store.upsert("first", &[0.0, 1.0], "x", &Metadata::new()).await.unwrap();
        store.upsert("second", &[0.0, -1.0], "y", &Metadata::new()).await.unwrap();

        let hits = store.query(&[0.0, 0.0], 2).await.unwrap();
        assert_eq!(hits[0].id, "first");
        assert_eq!(hits[1].id, "second");
        assert_eq!(hits[0].distance, hits[1].distance);
    }

    #[tokio::test]
    async fn test_query_respects_top_k_and_empty_store() {
        let store = InMemoryStore::new(DistanceMetric::Cosine);
        assert!(store.query(&[1.0], 3).await.unwrap().is_empty());

        for id in ["a", "b", "c"] {
            store.upsert(id, &[1.0], id, &Metadata::new()).await.unwrap();
        }
        assert_eq!(store.query(&[1.0], 2).await.unwrap().len(), 2);
        assert!(store.query(&[1.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_rejected() {
        let store = InMemoryStore::new(DistanceMetric::Cosine);
        store.upsert("a", &[1.0, 0.0], "x", &Metadata::new()).await.unwrap();
        let err = store.upsert("b", &[1.0], "y", &Metadata::new()).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
        assert!(store.query(&[1.0, 0.0, 0.0], 1).await.is_err());
    }
}
