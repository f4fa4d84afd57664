use serde_json::Value;

/// Open key/value metadata attached to a template. Flows through to search
/// results untouched.
pub type Metadata = serde_json::Map<String, Value>;

/// A retrievable resume template. The embedding is owned by the template
/// store and never appears here.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub id: String,
    pub title: String,
    pub filename: String,
    pub content: String,
    pub metadata: Metadata,
}

impl Template {
    /// Builds a template view from stored fields. `title` falls back to
    /// `filename`, then to `id`; `filename` falls back to `id`.
    pub fn from_stored(id: &str, content: String, metadata: Metadata) -> Self {
        let filename = non_empty_str(&metadata, "filename")
            .unwrap_or(id)
            .to_string();
        let title = non_empty_str(&metadata, "title")
            .unwrap_or(&filename)
            .to_string();
        Self {
            id: id.to_string(),
            title,
            filename,
            content,
            metadata,
        }
    }

    /// Blob identifier used for download links. Prefers the `file_id`
    /// metadata written at ingestion, else the template id.
    pub fn file_id(&self) -> &str {
        non_empty_str(&self.metadata, "file_id").unwrap_or(&self.id)
    }
}

fn non_empty_str<'a>(metadata: &'a Metadata, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(value: Value) -> Metadata {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_title_defaults_to_filename_then_id() {
        let t = Template::from_stored(
            "abc",
            String::new(),
            metadata(json!({"filename": "swe.pdf"})),
        );
        assert_eq!(t.title, "swe.pdf");
        assert_eq!(t.filename, "swe.pdf");

        let t = Template::from_stored("abc", String::new(), Metadata::new());
        assert_eq!(t.title, "abc");
        assert_eq!(t.filename, "abc");
    }

    #[test]
    fn test_explicit_title_wins() {
        let t = Template::from_stored(
            "abc",
            String::new(),
            metadata(json!({"title": "Software Engineer", "filename": "swe.pdf", "file_id": "f-1"})),
        );
        assert_eq!(t.title, "Software Engineer");
        assert_eq!(t.file_id(), "f-1");
    }

    #[test]
    fn test_blank_title_is_ignored() {
        let t = Template::from_stored("abc", String::new(), metadata(json!({"title": "  "})));
        assert_eq!(t.title, "abc");
        assert_eq!(t.file_id(), "abc");
    }
}
