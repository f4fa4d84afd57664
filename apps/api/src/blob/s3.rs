use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::{ByteStream, DateTime as S3DateTime};
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{Blob, BlobError, BlobInfo, BlobStore};

/// Blob store over one S3 (or MinIO) bucket prefix.
#[derive(Clone)]
pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
    prefix: String,
}

impl S3BlobStore {
    pub fn new(client: S3Client, bucket: &str, prefix: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        }
    }

    fn key(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    /// Maps an object key back to a blob id; `None` for the prefix itself
    /// and for folder markers.
    fn id_from_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        let id = key.strip_prefix(self.prefix.as_str())?;
        if id.is_empty() || id.ends_with('/') {
            None
        } else {
            Some(id)
        }
    }
}

fn to_chrono(dt: &S3DateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(dt.secs(), dt.subsec_nanos())
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn list(&self) -> Result<Vec<BlobInfo>, BlobError> {
        let mut blobs = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&self.prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| BlobError::S3(format!("list {}: {e}", self.prefix)))?;

            for object in output.contents() {
                let Some(id) = object.key().and_then(|k| self.id_from_key(k)) else {
                    continue;
                };
                blobs.push(BlobInfo {
                    id: id.to_string(),
                    size: object.size().and_then(|s| u64::try_from(s).ok()),
                    last_modified: object.last_modified().and_then(to_chrono),
                });
            }

            match output.next_continuation_token() {
                Some(token) if output.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        debug!("Listed {} blobs under s3://{}/{}", blobs.len(), self.bucket, self.prefix);
        Ok(blobs)
    }

    async fn fetch(&self, id: &str) -> Result<Blob, BlobError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.key(id))
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                GetObjectError::NoSuchKey(_) => BlobError::NotFound(id.to_string()),
                other => BlobError::S3(format!("get {id}: {other}")),
            })?;

        let info = BlobInfo {
            id: id.to_string(),
            size: output
                .content_length()
                .and_then(|s| u64::try_from(s).ok()),
            last_modified: output.last_modified().and_then(to_chrono),
        };
        let content_type = output.content_type().map(str::to_string);
        let metadata = output.metadata().cloned().unwrap_or_default();
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| BlobError::S3(format!("read {id}: {e}")))?
            .into_bytes();

        Ok(Blob {
            info,
            content_type,
            metadata,
            bytes,
        })
    }

    async fn put(
        &self,
        id: &str,
        bytes: Bytes,
        content_type: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<(), BlobError> {
        let key = self.key(id);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .set_metadata(Some(metadata.clone()))
            .send()
            .await
            .map_err(|e| BlobError::S3(format!("put {id}: {e}")))?;

        info!("Uploaded blob to s3://{}/{}", self.bucket, key);
        Ok(())
    }
}
