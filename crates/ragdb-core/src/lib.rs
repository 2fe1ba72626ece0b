//! ragdb-core - Core types and traits for the RAG store
//!
//! This crate provides the configuration, domain types, error handling,
//! version codec and component traits shared by the other ragdb crates.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;
pub mod version;

pub use config::*;
pub use error::{RagError, Result, SettingMismatch};
pub use traits::*;
pub use types::*;
pub use version::{decode_version, encode_version, SchemaVersion};
