//! Settings snapshot and configuration compatibility guard.
//!
//! Chunks and embeddings are only meaningful under the configuration that
//! produced them. The snapshot records that configuration; every open
//! compares its critical keys against the active configuration.

use rusqlite::{params, OptionalExtension};
use serde_json::{Map, Value};
use tracing::{debug, info};

use ragdb_core::{RagConfig, RagError, Result, SettingMismatch};

use crate::schema::SETTINGS_ROW_ID;
use crate::sqlite::SqliteStore;

/// Keys that must match between the snapshot and the active configuration.
pub const CRITICAL_SETTINGS: &[&str] = &[
    "embedding.provider",
    "embedding.model",
    "embedding.vector_dim",
    "chunking.chunk_size",
    "chunking.chunk_overlap",
];

/// Read/write access to the singleton settings record.
pub struct SettingsRepository<'a> {
    store: &'a SqliteStore,
}

impl<'a> SettingsRepository<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// The stored snapshot, or an empty map if none was saved yet.
    pub fn get(&self) -> Result<Map<String, Value>> {
        self.store.with_conn(|conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT settings FROM settings WHERE id = ?1",
                    params![SETTINGS_ROW_ID],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| RagError::database(e.to_string()))?;

            match raw {
                Some(json) => Ok(serde_json::from_str(&json)?),
                None => Ok(Map::new()),
            }
        })
    }

    /// Overwrite the snapshot with the store's active configuration.
    pub fn save(&self) -> Result<()> {
        let settings_json = serde_json::to_string(self.store.config())?;

        self.store.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO settings (id, settings) VALUES (?1, ?2)
                ON CONFLICT(id) DO UPDATE SET settings = excluded.settings
                "#,
                params![SETTINGS_ROW_ID, settings_json],
            )
            .map_err(|e| RagError::database(format!("Failed to save settings: {}", e)))?;

            debug!("Saved settings snapshot");
            Ok(())
        })
    }

    /// Fail with `ConfigMismatch` if a critical key drifted.
    ///
    /// With no snapshot yet, the active configuration is saved and accepted.
    pub fn validate_compatibility(&self) -> Result<()> {
        let stored = self.get()?;
        if stored.is_empty() {
            info!("No settings snapshot found, saving current configuration");
            return self.save();
        }

        let mismatches = compare(&stored, self.store.config())?;
        if mismatches.is_empty() {
            return Ok(());
        }

        Err(RagError::ConfigMismatch { mismatches })
    }
}

/// Critical keys whose values differ between `stored` and `current`.
pub fn compare(stored: &Map<String, Value>, current: &RagConfig) -> Result<Vec<SettingMismatch>> {
    let stored = Value::Object(stored.clone());
    let current = serde_json::to_value(current)?;

    Ok(CRITICAL_SETTINGS
        .iter()
        .filter_map(|key| {
            let stored_value = lookup(&stored, key);
            let current_value = lookup(&current, key);
            (stored_value != current_value).then(|| SettingMismatch {
                key: key.to_string(),
                stored: stored_value,
                current: current_value,
            })
        })
        .collect())
}

/// Value at a dotted path, `Null` when absent.
fn lookup(value: &Value, dotted: &str) -> Value {
    let pointer = format!("/{}", dotted.replace('.', "/"));
    value.pointer(&pointer).cloned().unwrap_or(Value::Null)
}
