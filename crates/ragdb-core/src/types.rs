//! Core domain types for the RAG store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Opaque key/value metadata attached to documents and chunks.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// A document in the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Row identity, assigned by the store on insert.
    pub id: Option<i64>,

    /// Full document text.
    pub content: String,

    /// Where the document came from (file://, https://, ...).
    pub uri: Option<String>,

    /// User-provided metadata.
    #[serde(default)]
    pub metadata: Metadata,

    /// Creation timestamp (Unix millis).
    pub created_at: u64,

    /// Last update timestamp (Unix millis).
    pub updated_at: u64,
}

impl Document {
    /// Create a new, not yet persisted document.
    pub fn new(content: impl Into<String>) -> Self {
        let now = now_millis();

        Self {
            id: None,
            content: content.into(),
            uri: None,
            metadata: Metadata::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the origin locator.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Replace the metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A token window of a document, the unit that gets embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Row identity, shared with the full-text and embedding rows.
    pub id: Option<i64>,

    /// Owning document, assigned by the store on insert.
    pub document_id: Option<i64>,

    /// Chunk text content.
    pub content: String,

    /// Chunk metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Chunk {
    /// Create a new, not yet persisted chunk.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: None,
            document_id: None,
            content: content.into(),
            metadata: Metadata::new(),
        }
    }
}

/// Statistics about the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Number of documents.
    pub documents: u64,

    /// Number of chunks.
    pub chunks: u64,

    /// Number of embeddings.
    pub embeddings: u64,

    /// Database size in bytes.
    pub storage_bytes: u64,
}
