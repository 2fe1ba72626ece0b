//! Configuration types for the RAG store.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RagError, Result};

/// Main configuration for the RAG store.
///
/// The serialized form of this struct is what the settings snapshot stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Embedding configuration.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunking configuration.
    #[serde(default)]
    pub chunking: ChunkingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Enable WAL mode (recommended).
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// SQLite cache size in KB (negative = KB, positive = pages).
    #[serde(default = "default_cache_size")]
    pub cache_size: i32,

    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            wal_mode: true,
            cache_size: default_cache_size(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

/// Embedding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding provider identity (e.g. `ollama`).
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Embedding model identity.
    #[serde(default = "default_model")]
    pub model: String,

    /// Length of every stored embedding vector.
    #[serde(default = "default_vector_dim")]
    pub vector_dim: usize,

    /// Provider endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Batch size for embedding requests.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            vector_dim: default_vector_dim(),
            base_url: default_base_url(),
            batch_size: default_batch_size(),
        }
    }
}

/// Chunking configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum tokens per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Tokens repeated between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl ChunkingConfig {
    /// Check `0 <= chunk_overlap < chunk_size`.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::config("chunk_size must be greater than 0"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Number of tokens the window advances by.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

// Default value functions

fn default_true() -> bool {
    true
}

fn default_cache_size() -> i32 {
    -64000
}

fn default_busy_timeout() -> u32 {
    30000
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_model() -> String {
    "mxbai-embed-large".to_string()
}

fn default_vector_dim() -> usize {
    1024
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_chunk_size() -> usize {
    256
}

fn default_chunk_overlap() -> usize {
    32
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ragdb")
        .join("ragdb.sqlite")
}

impl RagConfig {
    /// Load configuration from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| RagError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default paths.
    pub fn load_default() -> Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("ragdb").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("ragdb.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }

    /// Reject configurations no store or chunker can work with.
    pub fn validate(&self) -> Result<()> {
        if self.embedding.vector_dim == 0 {
            return Err(RagError::config("embedding.vector_dim must be greater than 0"));
        }
        self.chunking.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RagConfig::default();
        assert_eq!(config.embedding.provider, "ollama");
        assert_eq!(config.embedding.vector_dim, 1024);
        assert_eq!(config.chunking.chunk_size, 256);
        assert_eq!(config.chunking.chunk_overlap, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_chunking_validation() {
        let zero = ChunkingConfig {
            chunk_size: 0,
            chunk_overlap: 0,
        };
        assert!(zero.validate().is_err());

        let overlap_too_large = ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 10,
        };
        assert!(overlap_too_large.validate().is_err());

        let ok = ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 3,
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.stride(), 7);
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragdb.toml");
        std::fs::write(
            &path,
            "[embedding]\nmodel = \"nomic-embed-text\"\nvector_dim = 768\n\n[chunking]\nchunk_size = 512\n",
        )
        .unwrap();

        let config = RagConfig::load(&path).unwrap();
        assert_eq!(config.embedding.model, "nomic-embed-text");
        assert_eq!(config.embedding.vector_dim, 768);
        assert_eq!(config.embedding.provider, "ollama");
        assert_eq!(config.chunking.chunk_size, 512);
        assert_eq!(config.chunking.chunk_overlap, 32);
        assert!(config.database.wal_mode);
    }

    #[test]
    fn test_load_rejects_invalid_chunking() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragdb.toml");
        std::fs::write(&path, "[chunking]\nchunk_size = 8\nchunk_overlap = 8\n").unwrap();

        assert!(matches!(
            RagConfig::load(&path),
            Err(RagError::Config { .. })
        ));
    }
}
