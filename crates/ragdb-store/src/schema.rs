//! Database schema definitions.

/// Main schema SQL for initializing the database.
pub const SCHEMA: &str = r#"
-- Documents table
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL,
    uri TEXT,
    metadata TEXT DEFAULT '{}',
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_uri ON documents(uri);

-- Chunks table
CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    metadata TEXT DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_chunks_document_id ON chunks(document_id);

-- FTS5 virtual table for keyword search
CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(
    content,
    content='chunks',
    content_rowid='id'
);

-- Triggers to keep FTS5 in sync with chunks table
CREATE TRIGGER IF NOT EXISTS chunks_ai AFTER INSERT ON chunks BEGIN
    INSERT INTO chunks_fts(rowid, content) VALUES (NEW.id, NEW.content);
END;

CREATE TRIGGER IF NOT EXISTS chunks_ad AFTER DELETE ON chunks BEGIN
    INSERT INTO chunks_fts(chunks_fts, rowid, content) VALUES ('delete', OLD.id, OLD.content);
END;

CREATE TRIGGER IF NOT EXISTS chunks_au AFTER UPDATE ON chunks BEGIN
    INSERT INTO chunks_fts(chunks_fts, rowid, content) VALUES ('delete', OLD.id, OLD.content);
    INSERT INTO chunks_fts(rowid, content) VALUES (NEW.id, NEW.content);
END;

-- Singleton settings snapshot
CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY DEFAULT 1,
    settings TEXT NOT NULL DEFAULT '{}'
);
"#;

/// Name of the sqlite-vec embedding index.
pub const EMBEDDINGS_TABLE: &str = "chunk_embeddings";

/// Fixed row identity of the settings snapshot.
pub const SETTINGS_ROW_ID: i64 = 1;

/// Schema for the sqlite-vec virtual table, sized to `dimension`.
pub fn embeddings_schema(dimension: usize) -> String {
    format!(
        r#"
CREATE VIRTUAL TABLE IF NOT EXISTS {EMBEDDINGS_TABLE} USING vec0(
    chunk_id INTEGER PRIMARY KEY,
    embedding float[{dimension}]
);
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embeddings_schema_carries_dimension() {
        let sql = embeddings_schema(384);
        assert!(sql.contains("chunk_embeddings USING vec0"));
        assert!(sql.contains("float[384]"));
    }
}
