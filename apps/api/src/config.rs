use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::store::{DistanceMetric, StoreBackend};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub template_prefix: String,
    pub resume_prefix: String,
    pub openai_api_key: String,
    pub embedding_model: String,
    pub embedding_base_url: String,
    pub anthropic_api_key: String,
    pub llm_model: String,
    pub collection: String,
    pub store_backend: StoreBackend,
    pub distance_metric: DistanceMetric,
    pub score_threshold: f64,
    pub top_k: usize,
    pub provider_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let store_backend: StoreBackend = optional_env("TEMPLATE_STORE", "pgvector").parse()?;
        let database_url = match store_backend {
            StoreBackend::PgVector => Some(require_env("DATABASE_URL")?),
            StoreBackend::Memory => std::env::var("DATABASE_URL").ok(),
        };

        let collection = optional_env("TEMPLATE_COLLECTION", "resume_templates");
        validate_collection_name(&collection)?;

        let score_threshold = optional_env("SCORE_THRESHOLD", "0.6")
            .parse::<f64>()
            .context("SCORE_THRESHOLD must be a number")?;
        if score_threshold.is_nan() {
            bail!("SCORE_THRESHOLD must be a number");
        }

        Ok(Config {
            database_url,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            template_prefix: optional_env("TEMPLATE_PREFIX", "templates/"),
            resume_prefix: optional_env("RESUME_PREFIX", "resumes/"),
            openai_api_key: require_env("OPENAI_API_KEY")?,
            embedding_model: optional_env("EMBEDDING_MODEL", "text-embedding-3-small"),
            embedding_base_url: optional_env("EMBEDDING_BASE_URL", "https://api.openai.com/v1"),
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm_model: optional_env("LLM_MODEL", crate::llm_client::DEFAULT_MODEL),
            collection,
            store_backend,
            distance_metric: optional_env("DISTANCE_METRIC", "cosine").parse()?,
            score_threshold: score_threshold.clamp(0.0, 1.0),
            top_k: optional_env("TOP_K", "3")
                .parse::<usize>()
                .context("TOP_K must be a non-negative integer")?,
            provider_timeout: Duration::from_secs(
                optional_env("PROVIDER_TIMEOUT_SECS", "20")
                    .parse::<u64>()
                    .context("PROVIDER_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            port: optional_env("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// The collection name doubles as a SQL table name, so it is restricted to
/// lowercase identifiers.
pub fn validate_collection_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_head = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    let valid_tail = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !valid_head || !valid_tail || name.len() > 63 {
        bail!("TEMPLATE_COLLECTION '{name}' must match [a-z_][a-z0-9_]* (max 63 chars)");
    }
    Ok(())
}
