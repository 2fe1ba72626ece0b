//! ragdb-ingest - Indexing pipeline
//!
//! Turns raw document text into persisted chunks and embeddings:
//! chunk with the configured [`Chunker`](ragdb_core::Chunker), embed each
//! chunk in order, then write the document, its chunks and their vectors
//! through the [`Store`](ragdb_core::Store) in one unit.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragdb_ingest::Indexer;
//! use std::sync::Arc;
//!
//! let indexer = Indexer::new(Arc::new(store), Arc::new(embedder), Arc::new(chunker));
//! let doc = indexer.add_document("Some text", Some("file:///notes.txt"), Default::default()).await?;
//! let report = indexer.rebuild().await?;
//! ```

mod indexer;

pub use indexer::{Indexer, RebuildReport};
