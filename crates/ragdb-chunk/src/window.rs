//! Token-window chunker.
//!
//! Splits text into windows of at most `chunk_size` tokens, each window
//! starting `chunk_size - chunk_overlap` tokens after the previous one.

use std::ops::Range;
use std::sync::Arc;

use tracing::debug;

use ragdb_core::{Chunker, ChunkingConfig, Result};

use crate::tokenizer::{TextTokenizer, WordTokenizer};

/// Deterministic, stateless token-window chunker.
#[derive(Clone)]
pub struct TokenChunker {
    config: ChunkingConfig,
    tokenizer: Arc<dyn TextTokenizer>,
}

impl TokenChunker {
    /// Create a chunker using the built-in [`WordTokenizer`].
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        Self::with_tokenizer(config, Arc::new(WordTokenizer))
    }

    /// Create a chunker with a custom tokenizer.
    pub fn with_tokenizer(config: &ChunkingConfig, tokenizer: Arc<dyn TextTokenizer>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config: config.clone(),
            tokenizer,
        })
    }

    /// The configuration this chunker was built with.
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Count tokens in text.
    pub fn count_tokens(&self, text: &str) -> Result<usize> {
        self.tokenizer.count_tokens(text)
    }

    /// Token index ranges of every window over a stream of `len` tokens.
    pub fn windows(&self, len: usize) -> Vec<Range<usize>> {
        let mut windows = Vec::new();
        let stride = self.config.stride();
        let mut start = 0;

        while start < len {
            let end = (start + self.config.chunk_size).min(len);
            windows.push(start..end);

            if end == len {
                break;
            }
            start += stride;
        }

        windows
    }
}

impl Chunker for TokenChunker {
    fn chunk(&self, text: &str) -> Result<Vec<String>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let tokens = self.tokenizer.tokenize(text)?;

        if tokens.len() <= self.config.chunk_size {
            return Ok(vec![text.to_string()]);
        }

        let chunks: Vec<String> = self
            .windows(tokens.len())
            .into_iter()
            .map(|w| decode(text, &tokens[w]).to_string())
            .collect();

        debug!(
            "Chunked {} tokens into {} windows (size={}, overlap={})",
            tokens.len(),
            chunks.len(),
            self.config.chunk_size,
            self.config.chunk_overlap
        );

        Ok(chunks)
    }
}

/// Source text covered by a non-empty run of token spans.
fn decode<'a>(text: &'a str, spans: &[Range<usize>]) -> &'a str {
    let (Some(first), Some(last)) = (spans.first(), spans.last()) else {
        return "";
    };

    let mut start = first.start.min(text.len());
    while !text.is_char_boundary(start) {
        start -= 1;
    }

    let mut end = last.end.clamp(start, text.len());
    while !text.is_char_boundary(end) {
        end += 1;
    }

    &text[start..end]
}
