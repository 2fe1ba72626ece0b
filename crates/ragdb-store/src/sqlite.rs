//! SQLite-based storage engine.

use std::path::Path;
use std::sync::{Mutex, Once};

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info, warn};

use ragdb_core::{
    now_millis, Chunk, DatabaseConfig, Document, RagConfig, RagError, Result, SchemaVersion,
    Stats, Store,
};

use crate::schema::{embeddings_schema, EMBEDDINGS_TABLE, SCHEMA, SETTINGS_ROW_ID};
use crate::settings::SettingsRepository;
use crate::upgrades::UpgradeRegistry;

static VEC_EXTENSION: Once = Once::new();

/// Register sqlite-vec for every connection opened by this process.
fn register_vec_extension() {
    VEC_EXTENSION.call_once(|| {
        // SAFETY: sqlite3_vec_init has the signature of a SQLite extension
        // entry point; auto_extension only stores the pointer.
        let rc = unsafe {
            rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
                sqlite_vec::sqlite3_vec_init as *const (),
            )))
        };
        if rc != rusqlite::ffi::SQLITE_OK {
            warn!("Failed to register sqlite-vec extension (rc={})", rc);
        }
    });
}

/// How a store is opened.
#[derive(Debug)]
pub struct StoreOptions {
    /// Skip the settings compatibility check (rebuild workflows).
    pub skip_validation: bool,

    /// Version of the running software; bounds which upgrades may run.
    pub software_version: SchemaVersion,

    /// Upgrades applied to existing databases.
    pub upgrades: UpgradeRegistry,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            skip_validation: false,
            software_version: SchemaVersion::current(),
            upgrades: UpgradeRegistry::builtin(),
        }
    }
}

/// SQLite-based store: documents, chunks, a sqlite-vec embedding index,
/// an FTS5 mirror of chunk text and the settings snapshot, in one file.
///
/// The connection lives behind a blocking Mutex; `None` once closed.
pub struct SqliteStore {
    conn: Mutex<Option<Connection>>,

    /// Active configuration, fixed for the lifetime of the handle.
    config: RagConfig,

    /// Descriptions of the upgrade steps executed while opening.
    applied_upgrades: Vec<String>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("open", &self.is_open())
            .field("dimension", &self.dimension())
            .field("applied_upgrades", &self.applied_upgrades)
            .finish()
    }
}

impl SqliteStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>, config: &RagConfig, options: StoreOptions) -> Result<Self> {
        let path = path.as_ref();
        config.validate()?;
        register_vec_extension();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| RagError::database(format!("Failed to open database: {}", e)))?;

        Self::init(conn, config, options, path)
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory(config: &RagConfig) -> Result<Self> {
        config.validate()?;
        register_vec_extension();

        let conn = Connection::open_in_memory()
            .map_err(|e| RagError::database(format!("Failed to open in-memory database: {}", e)))?;

        Self::init(conn, config, StoreOptions::default(), Path::new(":memory:"))
    }

    /// Bring the schema up to date, then gate on settings compatibility.
    ///
    /// On any error the connection is dropped, so no handle escapes.
    fn init(conn: Connection, config: &RagConfig, options: StoreOptions, path: &Path) -> Result<Self> {
        Self::configure_connection(&conn, &config.database)?;

        let running = options.software_version;
        let (stored, applied_upgrades) = if Self::has_schema(&conn)? {
            let stored = Self::read_schema_version(&conn)?;
            let applied = Self::run_upgrades(&conn, &options.upgrades, config, stored, running)?;
            (Some(stored), applied)
        } else {
            Self::create_schema(&conn, config, running)?;
            (None, Vec::new())
        };

        let store = Self {
            conn: Mutex::new(Some(conn)),
            config: config.clone(),
            applied_upgrades,
        };

        if !options.skip_validation {
            store.settings().validate_compatibility()?;
        }

        // Only a handle that passed the guard moves the marker to the running version.
        if let Some(stored) = stored {
            if running > stored {
                store.with_conn(|conn| Self::write_schema_version(conn, running))?;
            } else if running < stored {
                warn!(
                    "Database schema {} is newer than this build ({}); leaving it untouched",
                    stored, running
                );
            }
        }

        info!(
            "Database opened at {:?} (schema {})",
            path,
            store.schema_version()?
        );

        Ok(store)
    }

    /// Configure SQLite connection from the database settings.
    fn configure_connection(conn: &Connection, db: &DatabaseConfig) -> Result<()> {
        let journal_mode = if db.wal_mode { "WAL" } else { "DELETE" };

        conn.execute_batch(&format!(
            r#"
            PRAGMA journal_mode = {journal_mode};
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = {};
            PRAGMA busy_timeout = {};
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            "#,
            db.cache_size, db.busy_timeout_ms
        ))
        .map_err(|e| RagError::database(format!("Failed to configure connection: {}", e)))?;

        Ok(())
    }

    fn has_schema(conn: &Connection) -> Result<bool> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'documents'",
                [],
                |row| row.get(0),
            )
            .map_err(|e| RagError::database(e.to_string()))?;
        Ok(count > 0)
    }

    fn read_schema_version(conn: &Connection) -> Result<SchemaVersion> {
        let packed: i32 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(|e| RagError::database(e.to_string()))?;
        Ok(SchemaVersion::from_packed(packed as u32))
    }

    fn write_schema_version(conn: &Connection, version: SchemaVersion) -> Result<()> {
        conn.execute_batch(&format!("PRAGMA user_version = {}", version.to_packed() as i32))
            .map_err(|e| RagError::database(format!("Failed to set schema version: {}", e)))
    }

    /// Create every table in one transaction and stamp the version.
    fn create_schema(conn: &Connection, config: &RagConfig, version: SchemaVersion) -> Result<()> {
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RagError::database(e.to_string()))?;

        tx.execute_batch(SCHEMA)
            .map_err(|e| RagError::database(format!("Failed to initialize schema: {}", e)))?;

        tx.execute_batch(&embeddings_schema(config.embedding.vector_dim))
            .map_err(|e| RagError::database(format!("Failed to create vec table: {}", e)))?;

        let settings_json = serde_json::to_string(config)?;
        tx.execute(
            "INSERT OR IGNORE INTO settings (id, settings) VALUES (?1, ?2)",
            params![SETTINGS_ROW_ID, settings_json],
        )
        .map_err(|e| RagError::database(format!("Failed to seed settings: {}", e)))?;

        Self::write_schema_version(&tx, version)?;

        tx.commit()
            .map_err(|e| RagError::database(e.to_string()))?;

        info!("Created schema (version {}, dimension {})", version, config.embedding.vector_dim);
        Ok(())
    }

    /// Apply every upgrade with `stored < version <= running`.
    ///
    /// Each upgrade's steps and its marker bump commit together. A failing
    /// step aborts the walk; upgrades committed before it stay applied.
    /// The final stamp to the running version is left to the caller.
    fn run_upgrades(
        conn: &Connection,
        registry: &UpgradeRegistry,
        config: &RagConfig,
        stored: SchemaVersion,
        running: SchemaVersion,
    ) -> Result<Vec<String>> {
        let mut applied = Vec::new();

        for upgrade in registry.pending(stored, running) {
            let version = upgrade.version();
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| RagError::database(e.to_string()))?;

            for step in upgrade.steps() {
                step.apply(&tx, config).map_err(|e| RagError::Upgrade {
                    version: version.to_string(),
                    step: step.name().to_string(),
                    message: e.to_string(),
                })?;
                info!("DB upgrade: {}", step.description());
                applied.push(step.description().to_string());
            }

            Self::write_schema_version(&tx, version)?;
            tx.commit().map_err(|e| RagError::Upgrade {
                version: version.to_string(),
                step: "commit".to_string(),
                message: e.to_string(),
            })?;
        }

        Ok(applied)
    }

    /// Execute a blocking operation on the connection.
    pub(crate) fn with_conn<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R>,
    {
        let guard = self.conn.lock().map_err(|e| RagError::database(e.to_string()))?;
        let conn = guard.as_ref().ok_or(RagError::NotAvailable)?;
        f(conn)
    }

    /// Release the connection. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.conn.lock().map_err(|e| RagError::database(e.to_string()))?;

        if let Some(conn) = guard.take() {
            conn.close()
                .map_err(|(_, e)| RagError::database(format!("Failed to close database: {}", e)))?;
            debug!("Database closed");
        }

        Ok(())
    }

    /// Whether the handle is still open.
    pub fn is_open(&self) -> bool {
        self.conn.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    /// The persisted schema version marker.
    pub fn schema_version(&self) -> Result<SchemaVersion> {
        self.with_conn(Self::read_schema_version)
    }

    /// Descriptions of the upgrade steps run while opening this handle.
    pub fn applied_upgrades(&self) -> &[String] {
        &self.applied_upgrades
    }

    /// The settings snapshot / compatibility guard.
    pub fn settings(&self) -> SettingsRepository<'_> {
        SettingsRepository::new(self)
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Configured embedding dimension.
    pub fn dimension(&self) -> usize {
        self.config.embedding.vector_dim
    }

    /// Convert f32 vector to bytes (little-endian, no header).
    pub fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Inverse of [`SqliteStore::serialize_embedding`].
    pub fn deserialize_embedding(bytes: &[u8]) -> Result<Vec<f32>> {
        if bytes.len() % 4 != 0 {
            return Err(RagError::database(format!(
                "Embedding blob of {} bytes is not a whole number of f32s",
                bytes.len()
            )));
        }

        Ok(bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }

    fn check_dimensions(&self, embeddings: &[Vec<f32>]) -> Result<()> {
        let expected = self.dimension();
        match embeddings.iter().find(|e| e.len() != expected) {
            Some(bad) => Err(RagError::DimensionMismatch {
                expected,
                actual: bad.len(),
            }),
            None => Ok(()),
        }
    }

    fn check_parallel(chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        if !embeddings.is_empty() && embeddings.len() != chunks.len() {
            return Err(RagError::invalid_argument(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    // Document operations

    async fn insert_document(
        &self,
        doc: Document,
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<(Document, Vec<Chunk>)> {
        Self::check_parallel(&chunks, &embeddings)?;
        self.check_dimensions(&embeddings)?;

        let metadata = serde_json::to_string(&doc.metadata)?;

        self.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| RagError::database(e.to_string()))?;

            tx.execute(
                r#"
                INSERT INTO documents (content, uri, metadata, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    doc.content,
                    doc.uri,
                    metadata,
                    doc.created_at as i64,
                    doc.updated_at as i64,
                ],
            )
            .map_err(|e| RagError::database(format!("Failed to insert document: {}", e)))?;

            let id = tx.last_insert_rowid();
            let chunks = Self::write_chunks(&tx, id, chunks, &embeddings)?;

            tx.commit()
                .map_err(|e| RagError::database(e.to_string()))?;

            debug!("Inserted document {} with {} chunks", id, chunks.len());
            Ok((Document { id: Some(id), ..doc }, chunks))
        })
    }

    async fn get_document(&self, id: i64) -> Result<Option<Document>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT id, content, uri, metadata, created_at, updated_at
                    FROM documents WHERE id = ?1
                    "#,
                )
                .map_err(|e| RagError::database(e.to_string()))?;

            let result = stmt
                .query_row(params![id], |row| Self::row_to_document(row))
                .optional()
                .map_err(|e| RagError::database(e.to_string()))?;

            Ok(result)
        })
    }

    async fn get_document_by_uri(&self, uri: &str) -> Result<Option<Document>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT id, content, uri, metadata, created_at, updated_at
                    FROM documents WHERE uri = ?1
                    ORDER BY id LIMIT 1
                    "#,
                )
                .map_err(|e| RagError::database(e.to_string()))?;

            let result = stmt
                .query_row(params![uri], |row| Self::row_to_document(row))
                .optional()
                .map_err(|e| RagError::database(e.to_string()))?;

            Ok(result)
        })
    }

    async fn list_documents(&self, limit: u32, offset: u32) -> Result<Vec<Document>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT id, content, uri, metadata, created_at, updated_at
                    FROM documents
                    ORDER BY id
                    LIMIT ?1 OFFSET ?2
                    "#,
                )
                .map_err(|e| RagError::database(e.to_string()))?;

            let documents = stmt
                .query_map(params![limit, offset], |row| Self::row_to_document(row))
                .map_err(|e| RagError::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| RagError::database(e.to_string()))?;

            Ok(documents)
        })
    }

    async fn delete_document(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| RagError::database(e.to_string()))?;

            // The vec0 index has no foreign keys; clear it by hand.
            Self::delete_embeddings_for_document(&tx, id)?;

            // Chunks go by CASCADE, their FTS rows by trigger.
            let deleted = tx
                .execute("DELETE FROM documents WHERE id = ?1", params![id])
                .map_err(|e| RagError::database(e.to_string()))?;

            if deleted == 0 {
                return Err(RagError::DocumentNotFound { id });
            }

            tx.commit()
                .map_err(|e| RagError::database(e.to_string()))?;

            debug!("Deleted document: {}", id);
            Ok(())
        })
    }

    // Chunk operations

    async fn get_chunks_for_document(&self, document_id: i64) -> Result<Vec<Chunk>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT id, document_id, content, metadata
                    FROM chunks
                    WHERE document_id = ?1
                    ORDER BY id
                    "#,
                )
                .map_err(|e| RagError::database(e.to_string()))?;

            let chunks = stmt
                .query_map(params![document_id], |row| Self::row_to_chunk(row))
                .map_err(|e| RagError::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| RagError::database(e.to_string()))?;

            Ok(chunks)
        })
    }

    async fn replace_chunks(
        &self,
        document_id: i64,
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Vec<Chunk>> {
        Self::check_parallel(&chunks, &embeddings)?;
        self.check_dimensions(&embeddings)?;

        self.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| RagError::database(e.to_string()))?;

            let updated = tx
                .execute(
                    "UPDATE documents SET updated_at = ?2 WHERE id = ?1",
                    params![document_id, now_millis() as i64],
                )
                .map_err(|e| RagError::database(e.to_string()))?;

            if updated == 0 {
                return Err(RagError::DocumentNotFound { id: document_id });
            }

            Self::delete_embeddings_for_document(&tx, document_id)?;
            tx.execute("DELETE FROM chunks WHERE document_id = ?1", params![document_id])
                .map_err(|e| RagError::database(e.to_string()))?;

            let chunks = Self::write_chunks(&tx, document_id, chunks, &embeddings)?;

            tx.commit()
                .map_err(|e| RagError::database(e.to_string()))?;

            debug!("Replaced chunks of document {} ({} new)", document_id, chunks.len());
            Ok(chunks)
        })
    }

    // Embedding operations

    async fn insert_embeddings(&self, chunk_ids: &[i64], embeddings: &[Vec<f32>]) -> Result<()> {
        if chunk_ids.len() != embeddings.len() {
            return Err(RagError::invalid_argument(
                "chunk_ids and embeddings must have same length",
            ));
        }
        self.check_dimensions(embeddings)?;

        self.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| RagError::database(e.to_string()))?;

            {
                // vec0 has no foreign keys; an orphan row would collide with a future chunk id.
                let mut exists = tx
                    .prepare("SELECT 1 FROM chunks WHERE id = ?1")
                    .map_err(|e| RagError::database(e.to_string()))?;
                for chunk_id in chunk_ids {
                    let found = exists
                        .exists(params![chunk_id])
                        .map_err(|e| RagError::database(e.to_string()))?;
                    if !found {
                        return Err(RagError::invalid_argument(format!(
                            "No chunk with id {} to attach an embedding to",
                            chunk_id
                        )));
                    }
                }

                let mut delete = tx
                    .prepare(&format!("DELETE FROM {EMBEDDINGS_TABLE} WHERE chunk_id = ?1"))
                    .map_err(|e| RagError::database(e.to_string()))?;
                let mut insert = tx
                    .prepare(&format!(
                        "INSERT INTO {EMBEDDINGS_TABLE} (chunk_id, embedding) VALUES (?1, ?2)"
                    ))
                    .map_err(|e| RagError::database(e.to_string()))?;

                for (chunk_id, embedding) in chunk_ids.iter().zip(embeddings) {
                    delete
                        .execute(params![chunk_id])
                        .map_err(|e| RagError::database(e.to_string()))?;
                    insert
                        .execute(params![chunk_id, Self::serialize_embedding(embedding)])
                        .map_err(|e| RagError::database(format!("Failed to insert embedding: {}", e)))?;
                }
            }

            tx.commit()
                .map_err(|e| RagError::database(e.to_string()))?;

            debug!("Inserted {} embeddings", chunk_ids.len());
            Ok(())
        })
    }

    async fn get_embedding(&self, chunk_id: i64) -> Result<Option<Vec<f32>>> {
        let bytes: Option<Vec<u8>> = self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT embedding FROM {EMBEDDINGS_TABLE} WHERE chunk_id = ?1"),
                params![chunk_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| RagError::database(e.to_string()))
        })?;

        bytes.map(|b| Self::deserialize_embedding(&b)).transpose()
    }

    async fn recreate_embedding_index(&self) -> Result<()> {
        let dimension = self.dimension();

        self.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| RagError::database(e.to_string()))?;

            tx.execute_batch(&format!("DROP TABLE IF EXISTS {EMBEDDINGS_TABLE};"))
                .map_err(|e| RagError::database(format!("Failed to drop vec table: {}", e)))?;
            tx.execute_batch(&embeddings_schema(dimension))
                .map_err(|e| RagError::database(format!("Failed to create vec table: {}", e)))?;

            tx.commit()
                .map_err(|e| RagError::database(e.to_string()))?;

            info!("Recreated embedding index with dimension {}", dimension);
            Ok(())
        })
    }

    async fn save_settings(&self) -> Result<()> {
        self.settings().save()
    }

    // Stats

    async fn get_stats(&self) -> Result<Stats> {
        self.with_conn(|conn| {
            let count = |sql: &str| -> Result<u64> {
                conn.query_row(sql, [], |row| row.get::<_, i64>(0))
                    .map(|n| n as u64)
                    .map_err(|e| RagError::database(e.to_string()))
            };

            let documents = count("SELECT COUNT(*) FROM documents")?;
            let chunks = count("SELECT COUNT(*) FROM chunks")?;
            let embeddings = count(&format!("SELECT COUNT(*) FROM {EMBEDDINGS_TABLE}"))?;

            // Get page count and page size to estimate storage
            let page_count = count("PRAGMA page_count").unwrap_or(0);
            let page_size = count("PRAGMA page_size").unwrap_or(4096);

            Ok(Stats {
                documents,
                chunks,
                embeddings,
                storage_bytes: page_count * page_size,
            })
        })
    }
}

// Helper methods
impl SqliteStore {
    /// Insert chunks (and embeddings, when given) for a document.
    fn write_chunks(
        conn: &Connection,
        document_id: i64,
        chunks: Vec<Chunk>,
        embeddings: &[Vec<f32>],
    ) -> Result<Vec<Chunk>> {
        let mut chunk_stmt = conn
            .prepare("INSERT INTO chunks (document_id, content, metadata) VALUES (?1, ?2, ?3)")
            .map_err(|e| RagError::database(e.to_string()))?;

        let mut vec_stmt = if embeddings.is_empty() {
            None
        } else {
            Some(
                conn.prepare(&format!(
                    "INSERT INTO {EMBEDDINGS_TABLE} (chunk_id, embedding) VALUES (?1, ?2)"
                ))
                .map_err(|e| RagError::database(e.to_string()))?,
            )
        };

        let mut stored = Vec::with_capacity(chunks.len());
        for (i, mut chunk) in chunks.into_iter().enumerate() {
            let metadata = serde_json::to_string(&chunk.metadata)?;
            chunk_stmt
                .execute(params![document_id, chunk.content, metadata])
                .map_err(|e| RagError::database(format!("Failed to insert chunk: {}", e)))?;

            let chunk_id = conn.last_insert_rowid();

            if let Some(stmt) = vec_stmt.as_mut() {
                stmt.execute(params![chunk_id, Self::serialize_embedding(&embeddings[i])])
                    .map_err(|e| RagError::database(format!("Failed to insert embedding: {}", e)))?;
            }

            chunk.id = Some(chunk_id);
            chunk.document_id = Some(document_id);
            stored.push(chunk);
        }

        Ok(stored)
    }

    fn delete_embeddings_for_document(conn: &Connection, document_id: i64) -> Result<()> {
        conn.execute(
            &format!(
                "DELETE FROM {EMBEDDINGS_TABLE} WHERE chunk_id IN (SELECT id FROM chunks WHERE document_id = ?1)"
            ),
            params![document_id],
        )
        .map_err(|e| RagError::database(e.to_string()))?;
        Ok(())
    }

    /// Convert a row to a Document.
    fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
        let metadata_str: Option<String> = row.get(3)?;

        Ok(Document {
            id: Some(row.get(0)?),
            content: row.get(1)?,
            uri: row.get(2)?,
            metadata: metadata_str
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_default(),
            created_at: row.get::<_, i64>(4)? as u64,
            updated_at: row.get::<_, i64>(5)? as u64,
        })
    }

    /// Convert a row to a Chunk.
    fn row_to_chunk(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chunk> {
        let metadata_str: Option<String> = row.get(3)?;

        Ok(Chunk {
            id: Some(row.get(0)?),
            document_id: Some(row.get(1)?),
            content: row.get(2)?,
            metadata: metadata_str
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_default(),
        })
    }
}
