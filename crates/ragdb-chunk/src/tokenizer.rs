//! Tokenizer backends.
//!
//! Tokens are reported as byte spans into the source text. Decoding a run of
//! tokens is slicing the source from the first span's start to the last
//! span's end, which is lossless and never depends on a vocabulary.

use std::ops::Range;
use std::path::Path;

use tokenizers::Tokenizer;
use tracing::info;

use ragdb_core::{RagError, Result};

/// Splits text into token spans.
pub trait TextTokenizer: Send + Sync {
    /// Byte spans of every token, in source order.
    fn tokenize(&self, text: &str) -> Result<Vec<Range<usize>>>;

    /// Number of tokens in `text`.
    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(self.tokenize(text)?.len())
    }
}

/// Dependency-free tokenizer: runs of alphanumeric characters form one
/// token, every other non-whitespace character is a token of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl TextTokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Range<usize>>> {
        let mut spans = Vec::new();
        let mut word_start: Option<usize> = None;

        for (i, c) in text.char_indices() {
            if c.is_alphanumeric() || c == '_' {
                word_start.get_or_insert(i);
                continue;
            }

            if let Some(start) = word_start.take() {
                spans.push(start..i);
            }
            if !c.is_whitespace() {
                spans.push(i..i + c.len_utf8());
            }
        }

        if let Some(start) = word_start {
            spans.push(start..text.len());
        }

        Ok(spans)
    }
}

/// Tokenizer backed by a Hugging Face `tokenizer.json`.
pub struct HfTokenizer {
    inner: Tokenizer,
}

impl HfTokenizer {
    /// Load a tokenizer from a `tokenizer.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading tokenizer from {:?}", path);

        let inner = Tokenizer::from_file(path)
            .map_err(|e| RagError::chunking(format!("Failed to load tokenizer: {}", e)))?;
        Ok(Self { inner })
    }

    /// Load a tokenizer from the bytes of a `tokenizer.json`.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self> {
        let inner = Tokenizer::from_bytes(bytes)
            .map_err(|e| RagError::chunking(format!("Failed to parse tokenizer: {}", e)))?;
        Ok(Self { inner })
    }
}

impl TextTokenizer for HfTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Range<usize>>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| RagError::chunking(format!("Tokenization failed: {}", e)))?;

        // Tokens with an empty span carry no source text (added/special tokens).
        Ok(encoding
            .get_offsets()
            .iter()
            .filter(|(start, end)| end > start)
            .map(|&(start, end)| start..end.min(text.len()))
            .collect())
    }
}
