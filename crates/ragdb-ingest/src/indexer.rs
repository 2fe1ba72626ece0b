//! Indexing pipeline: chunk, embed, persist.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use ragdb_core::{Chunk, Chunker, Document, Embedder, Metadata, RagError, Result, Store};

/// Documents fetched per page during a rebuild.
const REBUILD_PAGE_SIZE: u32 = 100;

/// Outcome of [`Indexer::rebuild`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Documents re-chunked and re-embedded.
    pub documents: u64,

    /// Chunks written across all documents.
    pub chunks: u64,
}

/// Writes documents into a store under the active chunking and embedding
/// configuration.
pub struct Indexer<S, E> {
    /// Storage backend.
    store: Arc<S>,

    /// Embedding model.
    embedder: Arc<E>,

    /// Chunking strategy.
    chunker: Arc<dyn Chunker>,

    /// Texts per embedding request.
    batch_size: usize,
}

impl<S, E> Indexer<S, E>
where
    S: Store,
    E: Embedder,
{
    /// Create a new indexer.
    pub fn new(store: Arc<S>, embedder: Arc<E>, chunker: Arc<dyn Chunker>) -> Self {
        Self {
            store,
            embedder,
            chunker,
            batch_size: 32,
        }
    }

    /// Set how many chunks go into one embedding request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Chunk, embed and persist a new document.
    pub async fn add_document(
        &self,
        content: &str,
        uri: Option<&str>,
        metadata: Metadata,
    ) -> Result<Document> {
        let start = Instant::now();

        let mut doc = Document::new(content).with_metadata(metadata);
        doc.uri = uri.map(str::to_string);

        let (chunks, embeddings) = self.prepare(content).await?;
        let (doc, chunks) = self.store.insert_document(doc, chunks, embeddings).await?;

        info!(
            "Indexed document {:?} ({} chunks) in {:?}",
            doc.id,
            chunks.len(),
            start.elapsed()
        );
        Ok(doc)
    }

    /// Replace a document's chunks and embeddings using the current
    /// chunker and embedder.
    pub async fn reindex_document(&self, id: i64) -> Result<Vec<Chunk>> {
        let doc = self
            .store
            .get_document(id)
            .await?
            .ok_or(RagError::DocumentNotFound { id })?;

        let (chunks, embeddings) = self.prepare(&doc.content).await?;
        let chunks = self.store.replace_chunks(id, chunks, embeddings).await?;

        debug!("Reindexed document {} into {} chunks", id, chunks.len());
        Ok(chunks)
    }

    /// Rebuild every document under the active configuration.
    ///
    /// Recreates the embedding index, re-chunks and re-embeds each
    /// document, then records the active configuration as the settings
    /// snapshot. Pair with a store opened without settings validation.
    pub async fn rebuild(&self) -> Result<RebuildReport> {
        let start = Instant::now();
        let mut report = RebuildReport::default();

        self.store.recreate_embedding_index().await?;

        let mut offset = 0;
        loop {
            let page = self.store.list_documents(REBUILD_PAGE_SIZE, offset).await?;
            if page.is_empty() {
                break;
            }

            for doc in &page {
                let Some(id) = doc.id else { continue };
                let chunks = self.reindex_document(id).await?;
                report.documents += 1;
                report.chunks += chunks.len() as u64;
            }

            offset += page.len() as u32;
        }

        self.store.save_settings().await?;

        info!(
            "Rebuilt {} documents ({} chunks) in {:?}",
            report.documents,
            report.chunks,
            start.elapsed()
        );
        Ok(report)
    }

    /// Chunk `content` and embed every chunk, in order.
    async fn prepare(&self, content: &str) -> Result<(Vec<Chunk>, Vec<Vec<f32>>)> {
        let texts = self.chunker.chunk(content)?;
        let expected = self.embedder.dimension();

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
            let vectors = self.embedder.embed_batch(&refs).await?;

            if vectors.len() != batch.len() {
                return Err(RagError::embedding(format!(
                    "embedder returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: bad.len(),
                });
            }

            embeddings.extend(vectors);
        }

        let chunks = texts.into_iter().map(Chunk::new).collect();
        Ok((chunks, embeddings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragdb_chunk::{ChunkingConfig, TokenChunker};
    use ragdb_core::RagConfig;
    use ragdb_store::{SqliteStore, StoreOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TEXT: &str = "one two three four five six seven";

    /// Deterministic embedder: vectors derived from a byte sum.
    struct MockEmbedder {
        dimension: usize,
        calls: AtomicUsize,
    }

    impl MockEmbedder {
        fn new(dimension: usize) -> Self {
            Self {
                dimension,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for MockEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_add(b as u64));
            Ok((0..self.dimension)
                .map(|i| ((hash.wrapping_mul(i as u64 + 1)) as f32 % 1000.0) / 1000.0 - 0.5)
                .collect())
        }

        fn dimension(&self) -> usize {
            self.dimension
        }
    }

    /// Claims one dimension, returns another.
    struct LyingEmbedder;

    #[async_trait]
    impl Embedder for LyingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; 3])
        }

        fn dimension(&self) -> usize {
            8
        }
    }

    fn config(dimension: usize) -> RagConfig {
        let mut config = RagConfig::default();
        config.embedding.vector_dim = dimension;
        config.chunking = ChunkingConfig {
            chunk_size: 4,
            chunk_overlap: 1,
        };
        config
    }

    fn chunker(config: &RagConfig) -> Arc<dyn Chunker> {
        Arc::new(TokenChunker::new(&config.chunking).unwrap())
    }

    fn indexer(dimension: usize) -> Indexer<SqliteStore, MockEmbedder> {
        let config = config(dimension);
        let store = SqliteStore::open_memory(&config).unwrap();
        Indexer::new(
            Arc::new(store),
            Arc::new(MockEmbedder::new(dimension)),
            chunker(&config),
        )
    }

    #[tokio::test]
    async fn test_add_document() {
        let indexer = indexer(8);

        let doc = indexer
            .add_document(TEXT, Some("file:///tmp/numbers.txt"), Metadata::new())
            .await
            .unwrap();
        let id = doc.id.unwrap();

        let chunks = indexer.store().get_chunks_for_document(id).await.unwrap();
        let contents: Vec<_> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["one two three four", "four five six seven"]);

        let embedding = indexer
            .store()
            .get_embedding(chunks[0].id.unwrap())
            .await
            .unwrap()
            .unwrap();
        let expected = MockEmbedder::new(8).embed("one two three four").await.unwrap();
        assert_eq!(embedding, expected);

        let stats = indexer.store().get_stats().await.unwrap();
        assert_eq!((stats.documents, stats.chunks, stats.embeddings), (1, 2, 2));
    }

    #[tokio::test]
    async fn test_empty_document_has_no_chunks() {
        let indexer = indexer(8);
        let doc = indexer.add_document("", None, Metadata::new()).await.unwrap();

        assert!(doc.id.is_some());
        let stats = indexer.store().get_stats().await.unwrap();
        assert_eq!((stats.documents, stats.chunks), (1, 0));
    }

    #[tokio::test]
    async fn test_small_batches_preserve_order() {
        let indexer = indexer(8).with_batch_size(1);
        let doc = indexer.add_document(TEXT, None, Metadata::new()).await.unwrap();

        let chunks = indexer
            .store()
            .get_chunks_for_document(doc.id.unwrap())
            .await
            .unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(indexer.embedder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(chunks[1].content, "four five six seven");
    }

    #[tokio::test]
    async fn test_reindex_with_new_chunker() {
        let first = indexer(8);
        let doc = first.add_document(TEXT, None, Metadata::new()).await.unwrap();
        let id = doc.id.unwrap();

        let narrow = ChunkingConfig {
            chunk_size: 2,
            chunk_overlap: 0,
        };
        let second = Indexer::new(
            Arc::clone(first.store()),
            Arc::new(MockEmbedder::new(8)),
            Arc::new(TokenChunker::new(&narrow).unwrap()),
        );

        let chunks = second.reindex_document(id).await.unwrap();
        let contents: Vec<_> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["one two", "three four", "five six", "seven"]);

        let stats = second.store().get_stats().await.unwrap();
        assert_eq!((stats.chunks, stats.embeddings), (4, 4));
    }

    #[tokio::test]
    async fn test_reindex_missing_document() {
        let indexer = indexer(8);
        assert!(matches!(
            indexer.reindex_document(7).await,
            Err(RagError::DocumentNotFound { id: 7 })
        ));
    }

    #[tokio::test]
    async fn test_wrong_embedding_width_stores_nothing() {
        let config = config(8);
        let indexer = Indexer::new(
            Arc::new(SqliteStore::open_memory(&config).unwrap()),
            Arc::new(LyingEmbedder),
            chunker(&config),
        );

        let err = indexer
            .add_document(TEXT, None, Metadata::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 8,
                actual: 3
            }
        ));
        assert_eq!(indexer.store().get_stats().await.unwrap().documents, 0);
    }

    #[tokio::test]
    async fn test_rebuild_after_model_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rag.sqlite");

        let old = config(8);
        {
            let store = SqliteStore::open(&path, &old, StoreOptions::default()).unwrap();
            let indexer = Indexer::new(
                Arc::new(store),
                Arc::new(MockEmbedder::new(8)),
                chunker(&old),
            );
            indexer.add_document(TEXT, None, Metadata::new()).await.unwrap();
            indexer.add_document("eight nine", None, Metadata::new()).await.unwrap();
            indexer.store().close().unwrap();
        }

        let mut new = config(16);
        new.embedding.model = "nomic-embed-text".to_string();
        assert!(matches!(
            SqliteStore::open(&path, &new, StoreOptions::default()),
            Err(RagError::ConfigMismatch { .. })
        ));

        let store = SqliteStore::open(
            &path,
            &new,
            StoreOptions {
                skip_validation: true,
                ..StoreOptions::default()
            },
        )
        .unwrap();
        let indexer = Indexer::new(
            Arc::new(store),
            Arc::new(MockEmbedder::new(16)),
            chunker(&new),
        );

        let report = indexer.rebuild().await.unwrap();
        assert_eq!(
            report,
            RebuildReport {
                documents: 2,
                chunks: 3
            }
        );

        let stats = indexer.store().get_stats().await.unwrap();
        assert_eq!(stats.embeddings, 3);

        let snapshot = indexer.store().settings().get().unwrap();
        assert_eq!(snapshot["embedding"]["vector_dim"], serde_json::json!(16));
        indexer.store().close().unwrap();

        assert!(SqliteStore::open(&path, &new, StoreOptions::default()).is_ok());
    }
}
