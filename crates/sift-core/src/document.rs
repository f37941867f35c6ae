use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored document. Immutable once indexed; re-indexing with the same id
/// replaces it wholesale (delete-then-insert).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Caller-supplied identifier, the joint key across the sparse index
    /// and the dense store.
    pub id: String,
    /// Raw document text.
    pub text: String,
    /// Free-form metadata, opaque to the engine.
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// When this document was (last) indexed.
    pub indexed_at: DateTime<Utc>,
}

impl Document {
    /// Create a document with empty metadata, stamped now.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: serde_json::Value::Null,
            indexed_at: Utc::now(),
        }
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// blake3 hash of the text, used for embedding-cache keys and to detect
    /// source-text changes on re-index.
    pub fn content_hash(&self) -> String {
        blake3::hash(self.text.as_bytes()).to_hex().to_string()
    }
}

/// A document as it comes back from the store, with its persisted hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub document: Document,
    pub content_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_stable() {
        let a = Document::new("d1", "hello world");
        let b = Document::new("d2", "hello world");
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn content_hash_tracks_text() {
        let a = Document::new("d1", "hello world");
        let b = Document::new("d1", "hello worlds");
        assert_ne!(a.content_hash(), b.content_hash());
    }
}
