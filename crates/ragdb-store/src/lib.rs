//! ragdb-store - SQLite storage engine with sqlite-vec
//!
//! Persists documents, chunks, embeddings and a settings snapshot in one
//! SQLite file. Opening a store brings the schema up to the running
//! version through the upgrade registry, then checks that the active
//! configuration matches the one the data was built with.

mod schema;
mod settings;
mod sqlite;
mod upgrades;

pub use settings::{compare as compare_settings, SettingsRepository, CRITICAL_SETTINGS};
pub use sqlite::{SqliteStore, StoreOptions};
pub use upgrades::{Upgrade, UpgradeRegistry, UpgradeStep};

// Re-export schema for tests and upgrade steps
pub use schema::{embeddings_schema, EMBEDDINGS_TABLE, SCHEMA, SETTINGS_ROW_ID};
