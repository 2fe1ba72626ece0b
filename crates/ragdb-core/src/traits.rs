//! Core traits defining the interfaces between components.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Chunk, Document, Stats};

/// Storage layer trait.
///
/// Lifecycle (open, upgrades, settings validation, close) is specific to
/// each backend; this trait covers what the ingest pipeline writes and reads.
#[async_trait]
pub trait Store: Send + Sync {
    // Document operations

    /// Persist a document with its chunks and their embeddings in one unit.
    ///
    /// `embeddings` is either empty (chunks stored without vectors) or
    /// parallel to `chunks`.
    async fn insert_document(
        &self,
        doc: Document,
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<(Document, Vec<Chunk>)>;
    async fn get_document(&self, id: i64) -> Result<Option<Document>>;
    async fn get_document_by_uri(&self, uri: &str) -> Result<Option<Document>>;
    async fn list_documents(&self, limit: u32, offset: u32) -> Result<Vec<Document>>;
    async fn delete_document(&self, id: i64) -> Result<()>;

    // Chunk operations
    async fn get_chunks_for_document(&self, document_id: i64) -> Result<Vec<Chunk>>;

    /// Swap a document's chunks (and embeddings) for a new set.
    async fn replace_chunks(
        &self,
        document_id: i64,
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Vec<Chunk>>;

    // Embedding operations
    async fn insert_embeddings(&self, chunk_ids: &[i64], embeddings: &[Vec<f32>]) -> Result<()>;
    async fn get_embedding(&self, chunk_id: i64) -> Result<Option<Vec<f32>>>;

    /// Drop and rebuild the embedding index at the active dimension.
    async fn recreate_embedding_index(&self) -> Result<()>;

    /// Overwrite the settings snapshot with the active configuration.
    async fn save_settings(&self) -> Result<()>;

    // Stats
    async fn get_stats(&self) -> Result<Stats>;
}

/// Embedding provider trait: text in, fixed-length vector out.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;
}

/// Chunking strategy trait.
pub trait Chunker: Send + Sync {
    /// Split text into an ordered, fully materialized list of chunks.
    fn chunk(&self, text: &str) -> Result<Vec<String>>;
}
