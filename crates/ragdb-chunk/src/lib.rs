//! ragdb-chunk - Token-window chunking
//!
//! This crate splits document text into overlapping, token-bounded windows
//! ready for embedding.
//!
//! # Tokenizers
//!
//! - [`WordTokenizer`]: dependency-free word/punctuation tokenizer.
//! - [`HfTokenizer`]: any Hugging Face `tokenizer.json`.
//!
//! # Example
//!
//! ```rust
//! use ragdb_chunk::{Chunker, ChunkingConfig, TokenChunker};
//!
//! let config = ChunkingConfig { chunk_size: 4, chunk_overlap: 1 };
//! let chunker = TokenChunker::new(&config).unwrap();
//! let chunks = chunker.chunk("one two three four five six").unwrap();
//! assert_eq!(chunks, vec!["one two three four", "four five six"]);
//! ```

mod tokenizer;
mod window;

pub use tokenizer::{HfTokenizer, TextTokenizer, WordTokenizer};
pub use window::TokenChunker;

// Re-export types for convenience
pub use ragdb_core::{Chunker, ChunkingConfig};
