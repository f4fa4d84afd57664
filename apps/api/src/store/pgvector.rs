use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::info;

use super::{Candidate, DistanceMetric, StoreError, TemplateStore};
use crate::models::template::{Metadata, Template};

#[derive(Debug, FromRow)]
struct CandidateRow {
    id: String,
    content: String,
    metadata: serde_json::Value,
    distance: f64,
}

#[derive(Debug, FromRow)]
struct TemplateRow {
    id: String,
    content: String,
    metadata: serde_json::Value,
}

/// Template collection stored in a Postgres table with a pgvector column.
///
/// The table name is the collection name; it is validated as a plain
/// identifier when configuration is loaded.
#[derive(Clone)]
pub struct PgVectorStore {
    pool: PgPool,
    table: String,
    metric: DistanceMetric,
}

impl PgVectorStore {
    pub fn new(pool: PgPool, collection: &str, metric: DistanceMetric) -> Self {
        Self {
            pool,
            table: collection.to_string(),
            metric,
        }
    }

    /// Opens a pool against `database_url`. Acquiring a connection is bounded by
    /// `acquire_timeout` so an unreachable database fails startup quickly.
    pub async fn connect(
        database_url: &str,
        collection: &str,
        metric: DistanceMetric,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;
        info!("PostgreSQL connection pool established");
        Ok(Self::new(pool, collection, metric))
    }

    /// Creates the pgvector extension and the collection table if missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id         TEXT PRIMARY KEY,
                seq        BIGSERIAL,
                content    TEXT NOT NULL,
                metadata   JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                embedding  vector NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
            table = self.table
        ))
        .execute(&self.pool)
        .await?;
        info!("Template collection '{}' ready", self.table);
        Ok(())
    }

    fn count_sql(&self) -> String {
        format!("SELECT count(*) FROM {}", self.table)
    }

    fn peek_sql(&self) -> String {
        format!(
            "SELECT id, content, metadata FROM {} ORDER BY seq ASC LIMIT $1",
            self.table
        )
    }

    fn distance_operator(&self) -> &'static str {
        match self.metric {
            DistanceMetric::Cosine => "<=>",
            DistanceMetric::L2 => "<->",
        }
    }
}

/// pgvector text literal: `[0.1,0.2,...]`.
fn vector_literal(embedding: &[f32]) -> String {
    let parts: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

#[async_trait]
impl TemplateStore for PgVectorStore {
    async fn upsert(
        &self,
        id: &str,
        embedding: &[f32],
        content: &str,
        metadata: &Metadata,
    ) -> Result<(), StoreError> {
        // Last write wins; Postgres row locking serializes concurrent upserts of one id.
        sqlx::query(&format!(
            r#"
            INSERT INTO {table} (id, content, metadata, embedding)
            VALUES ($1, $2, $3, $4::text::vector)
            ON CONFLICT (id) DO UPDATE
            SET content = EXCLUDED.content,
                metadata = EXCLUDED.metadata,
                embedding = EXCLUDED.embedding,
                updated_at = now()
            "#,
            table = self.table
        ))
        .bind(id)
        .bind(content)
        .bind(serde_json::Value::Object(metadata.clone()))
        .bind(vector_literal(embedding))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<Candidate>, StoreError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, CandidateRow>(&format!(
            r#"
            SELECT id, content, metadata, (embedding {op} $1::text::vector)::float8 AS distance
            FROM {table}
            ORDER BY distance ASC, seq ASC
            LIMIT $2
            "#,
            op = self.distance_operator(),
            table = self.table
        ))
        .bind(vector_literal(embedding))
        .bind(i64::try_from(top_k).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<Candidate, StoreError> {
                Ok(Candidate {
                    metadata: metadata_object(&row.id, row.metadata)?,
                    id: row.id,
                    content: row.content,
                    distance: row.distance,
                })
            })
            .collect()
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(&self.count_sql())
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn peek(&self, limit: usize) -> Result<Vec<Template>, StoreError> {
        let rows = sqlx::query_as::<_, TemplateRow>(&self.peek_sql())
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| -> Result<Template, StoreError> {
                let metadata = metadata_object(&row.id, row.metadata)?;
                Ok(Template::from_stored(&row.id, row.content, metadata))
            })
            .collect()
    }
}

fn metadata_object(id: &str, value: serde_json::Value) -> Result<Metadata, StoreError> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        serde_json::Value::Null => Ok(Metadata::new()),
        other => Err(StoreError::Malformed(format!(
            "metadata for {id} is not an object: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_literal_format() {
        assert_eq!(vector_literal(&[0.5, -1.0, 0.25]), "[0.5,-1,0.25]");
        assert_eq!(vector_literal(&[]), "[]");
    }

    #[test]
    fn test_metadata_must_be_an_object() {
        assert!(metadata_object("t1", serde_json::Value::Null).unwrap().is_empty());
        let map = metadata_object("t1", serde_json::json!({"title": "A"})).unwrap();
        assert_eq!(map["title"], "A");
        assert!(matches!(
            metadata_object("t1", serde_json::json!([1, 2])),
            Err(StoreError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_inspection_sql_targets_collection_table() {
        // lazy pools never connect until used
        let pool = PgPool::connect_lazy("postgres://localhost/templates").unwrap();
        let store = PgVectorStore::new(pool, "resume_templates", DistanceMetric::Cosine);
        assert_eq!(store.count_sql(), "SELECT count(*) FROM resume_templates");
        assert_eq!(
            store.peek_sql(),
            "SELECT id, content, metadata FROM resume_templates ORDER BY seq ASC LIMIT $1"
        );
    }
}
