use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::errors::AppError;

/// One buffered multipart field.
#[derive(Debug, Clone)]
pub struct UploadedPart {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedPart {
    /// Field value as text, for plain form fields.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).trim().to_string()
    }

    pub fn is_pdf(&self) -> bool {
        self.file_name
            .as_deref()
            .is_some_and(|n| n.to_ascii_lowercase().ends_with(".pdf"))
    }
}

/// Buffers every named field of a multipart body. Later duplicates win.
pub async fn collect_parts(mut multipart: Multipart) -> Result<HashMap<String, UploadedPart>, AppError> {
    let mut parts = HashMap::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        parts.insert(
            name,
            UploadedPart {
                file_name,
                content_type,
                bytes,
            },
        );
    }
    Ok(parts)
}

/// Removes a required field, failing with a validation error naming it.
pub fn require_part(
    parts: &mut HashMap<String, UploadedPart>,
    name: &str,
) -> Result<UploadedPart, AppError> {
    parts
        .remove(name)
        .ok_or_else(|| AppError::Validation(format!("Missing multipart field '{name}'")))
}

/// Removes a required field that must be a `.pdf` upload.
pub fn require_pdf(
    parts: &mut HashMap<String, UploadedPart>,
    name: &str,
) -> Result<UploadedPart, AppError> {
    let part = require_part(parts, name)?;
    if !part.is_pdf() {
        return Err(AppError::Validation(
            "Only PDF files are supported.".to_string(),
        ));
    }
    Ok(part)
}
