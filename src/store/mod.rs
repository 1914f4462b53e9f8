//! Vector store backed by SQLite and sqlite-vec.
//!
//! One shared collection (a pair of tables, fixed at startup) holds all
//! chunks across all indexed projects. The store holds the embedding
//! provider handle; callers embed through it first, then pass the
//! vectors to the synchronous `add`/`query`. The SQLite connection is
//! never held across an await point that way, and ranking stays the
//! store's job; callers never compute similarity themselves.
use std::path::Path;
use std::sync::Arc;
use std::sync::Once;

use rusqlite::types::Value;
use rusqlite::{Connection, params};
use sqlite_vec::sqlite3_vec_init;
use thiserror::Error;
use tracing::info;

pub mod models;

use crate::embedding::{EmbedError, EmbeddingProvider};
use models::{ChunkMetadata, QueryMatch, RecordFilter, StoredRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error("invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("batch length mismatch: {ids} ids, {documents} documents, {embeddings} embeddings, {metadatas} metadatas")]
    BatchMismatch {
        ids: usize,
        documents: usize,
        embeddings: usize,
        metadatas: usize,
    },
}

static INIT_VEC: Once = Once::new();

/// Initialize the sqlite-vec extension. Safe to call multiple times.
fn init_sqlite_vec() {
    INIT_VEC.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

fn schema_sql(collection: &str, dimensions: usize) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {collection}_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    record_id TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL,
    file_path TEXT NOT NULL,
    file_type TEXT NOT NULL,
    chunk_index INTEGER NOT NULL DEFAULT 0,
    project_id TEXT NOT NULL,
    project_name TEXT NOT NULL,
    project_path TEXT NOT NULL,
    source_type TEXT NOT NULL,
    indexed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_{collection}_project ON {collection}_records(project_id);
CREATE INDEX IF NOT EXISTS idx_{collection}_file_type ON {collection}_records(file_type);
CREATE INDEX IF NOT EXISTS idx_{collection}_file_path ON {collection}_records(file_path);

CREATE VIRTUAL TABLE IF NOT EXISTS {collection}_vec USING vec0(
    embedding FLOAT[{dimensions}]
);
"#
    )
}

/// A single shared collection in the vector store.
///
/// Records are only ever created or overwritten whole by id collision on
/// re-indexing; there is no per-record update or delete path.
pub struct VectorStore {
    conn: Connection,
    provider: Arc<dyn EmbeddingProvider>,
    collection: String,
}

impl VectorStore {
    /// Open (or create) the collection at the given database path.
    pub fn open<P: AsRef<Path>>(
        path: P,
        collection: &str,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref();
        info!("opening vector store: {}", path.display());
        init_sqlite_vec();
        let conn = Connection::open(path)?;
        Self::init(conn, collection, provider)
    }

    /// Open an in-memory collection (used by tests).
    pub fn open_in_memory(
        collection: &str,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, StoreError> {
        init_sqlite_vec();
        let conn = Connection::open_in_memory()?;
        Self::init(conn, collection, provider)
    }

    fn init(
        conn: Connection,
        collection: &str,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, StoreError> {
        if collection.is_empty()
            || !collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(StoreError::InvalidCollection(collection.to_string()));
        }

        let vec_version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
        info!("sqlite-vec version: {vec_version}");

        conn.execute_batch(&schema_sql(collection, provider.dimensions()))?;

        Ok(Self {
            conn,
            provider,
            collection: collection.to_string(),
        })
    }

    /// The embedding provider this collection was opened with.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Insert records, overwriting any existing record with the same id.
    ///
    /// `embeddings[i]` is the precomputed vector for `documents[i]`
    /// (the caller embeds via [`Self::provider`] beforehand). The batch
    /// is written in a single transaction: either the whole batch lands
    /// or none of it does.
    pub fn add(
        &mut self,
        ids: &[String],
        documents: &[&str],
        embeddings: &[Vec<f32>],
        metadatas: &[ChunkMetadata],
    ) -> Result<(), StoreError> {
        if ids.len() != documents.len()
            || ids.len() != embeddings.len()
            || ids.len() != metadatas.len()
        {
            return Err(StoreError::BatchMismatch {
                ids: ids.len(),
                documents: documents.len(),
                embeddings: embeddings.len(),
                metadatas: metadatas.len(),
            });
        }

        let records_table = format!("{}_records", self.collection);
        let vec_table = format!("{}_vec", self.collection);

        let tx = self.conn.transaction()?;
        for (i, record_id) in ids.iter().enumerate() {
            let m = &metadatas[i];
            let rowid: i64 = tx.query_row(
                &format!(
                    r#"
                    INSERT INTO {records_table}
                        (record_id, content, file_path, file_type, chunk_index,
                         project_id, project_name, project_path, source_type, indexed_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    ON CONFLICT(record_id) DO UPDATE SET
                        content = excluded.content,
                        file_path = excluded.file_path,
                        file_type = excluded.file_type,
                        chunk_index = excluded.chunk_index,
                        project_id = excluded.project_id,
                        project_name = excluded.project_name,
                        project_path = excluded.project_path,
                        source_type = excluded.source_type,
                        indexed_at = excluded.indexed_at
                    RETURNING id
                    "#
                ),
                params![
                    record_id,
                    documents[i],
                    m.file_path,
                    m.file_type,
                    m.chunk_index as i64,
                    m.project_id,
                    m.project_name,
                    m.project_path,
                    m.source_type,
                    m.indexed_at,
                ],
                |row| row.get(0),
            )?;

            // Virtual tables have no upsert; replace the vector row by hand.
            tx.execute(
                &format!("DELETE FROM {vec_table} WHERE rowid = ?"),
                params![rowid],
            )?;
            tx.execute(
                &format!("INSERT INTO {vec_table} (rowid, embedding) VALUES (?, ?)"),
                params![rowid, serialize_vector(&embeddings[i])],
            )?;
        }
        tx.commit()?;

        Ok(())
    }

    /// Fetch up to `limit` records matching the filter, in whatever order
    /// the store returns them.
    pub fn get(
        &self,
        filter: &RecordFilter<'_>,
        limit: usize,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let mut sql = format!(
            r#"
            SELECT record_id, content, file_path, file_type, chunk_index,
                   project_id, project_name, project_path, source_type, indexed_at
            FROM {}_records
            "#,
            self.collection
        );

        let mut params: Vec<Value> = Vec::new();
        let clauses = filter_clauses(filter, &mut params);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(limit as i64));

        let param_refs: Vec<&dyn rusqlite::ToSql> =
            params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            Ok(StoredRecord {
                id: row.get(0)?,
                content: row.get(1)?,
                metadata: metadata_from_row(row)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Similarity query over a precomputed query vector, ranked by
    /// cosine distance.
    ///
    /// Ranking is entirely the store's; callers receive raw distances and
    /// must not re-sort.
    pub fn query(
        &self,
        query_vector: &[f32],
        limit: usize,
        filter: &RecordFilter<'_>,
    ) -> Result<Vec<QueryMatch>, StoreError> {
        let mut sql = format!(
            r#"
            SELECT r.record_id, r.content, r.file_path, r.file_type, r.chunk_index,
                   r.project_id, r.project_name, r.project_path, r.source_type, r.indexed_at,
                   vec_distance_cosine(v.embedding, ?) AS distance
            FROM {c}_vec v
            JOIN {c}_records r ON v.rowid = r.id
            "#,
            c = self.collection
        );

        let mut params: Vec<Value> = vec![Value::Blob(serialize_vector(query_vector))];
        let clauses = filter_clauses(filter, &mut params);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY distance ASC LIMIT ?");
        params.push(Value::Integer(limit as i64));

        let param_refs: Vec<&dyn rusqlite::ToSql> =
            params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), |row| {
            Ok(QueryMatch {
                record: StoredRecord {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    metadata: metadata_from_row(row)?,
                },
                distance: row.get(10)?,
            })
        })?;

        let mut matches = Vec::new();
        for row in rows {
            matches.push(row?);
        }
        Ok(matches)
    }

    /// Total record count in the collection.
    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}_records", self.collection),
            [],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }
}

/// Columns 2..=9 of both read queries map onto `ChunkMetadata`.
fn metadata_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChunkMetadata> {
    Ok(ChunkMetadata {
        file_path: row.get(2)?,
        file_type: row.get(3)?,
        chunk_index: row.get::<_, i64>(4)? as usize,
        project_id: row.get(5)?,
        project_name: row.get(6)?,
        project_path: row.get(7)?,
        source_type: row.get(8)?,
        indexed_at: row.get(9)?,
    })
}

fn filter_clauses(filter: &RecordFilter<'_>, params: &mut Vec<Value>) -> Vec<String> {
    let mut clauses = Vec::new();
    if let Some(project_id) = filter.project_id {
        clauses.push("project_id = ?".to_string());
        params.push(Value::Text(project_id.to_string()));
    }
    if let Some(file_type) = filter.file_type {
        clauses.push("file_type = ?".to_string());
        params.push(Value::Text(file_type.to_string()));
    }
    if let Some(file_path) = filter.file_path {
        clauses.push("file_path = ?".to_string());
        params.push(Value::Text(file_path.to_string()));
    }
    clauses
}

/// Serialize a float32 vector into bytes for the vec0 virtual table.
fn serialize_vector(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}
