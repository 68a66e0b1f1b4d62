//! SQLite-backed vector store
//!
//! All collections share one `memgate_memories` table; each store handle is
//! scoped to a single collection. Embeddings are JSON arrays and similarity is
//! computed in process.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memgate_core::{
    Error, MemoryRecord, MemorySource, Metadata, NewMemoryRecord, Result, SearchResult, VectorStore,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use super::{content_hash, db_error, merge_metadata, rank};
use crate::migrations::run_migrations;

const SELECT_COLUMNS: &str = "id, content, embedding, source, metadata, created_at";

/// Collection-scoped handle over a shared SQLite connection
#[derive(Clone)]
pub struct SqliteVectorStore {
    conn: Arc<Mutex<Connection>>,
    collection: String,
}

impl SqliteVectorStore {
    /// Open (creating if needed) the database file at `path`
    pub fn open(path: &Path, collection: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(db_error)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")
            .map_err(db_error)?;

        debug!(path = %path.display(), collection, "Opened sqlite vector store");
        Self::with_connection(Arc::new(Mutex::new(conn)), collection)
    }

    /// Private in-memory database
    pub fn open_in_memory(collection: &str) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_error)?;
        Self::with_connection(Arc::new(Mutex::new(conn)), collection)
    }

    /// Scope an existing connection to `collection`, running migrations
    pub fn with_connection(conn: Arc<Mutex<Connection>>, collection: &str) -> Result<Self> {
        {
            let guard = conn.lock().map_err(|_| Error::LockPoisoned)?;
            run_migrations(&guard)?;
        }

        Ok(Self {
            conn,
            collection: collection.to_string(),
        })
    }

    /// Handle for another collection in the same database
    pub fn for_collection(&self, collection: &str) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            collection: collection.to_string(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Distinct collection names present in the database
    pub fn collections(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT collection FROM memgate_memories ORDER BY collection")
            .map_err(db_error)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(db_error)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_error)?;
        Ok(names)
    }
}

/// Row as stored, before JSON decoding
struct RawMemory {
    id: String,
    content: String,
    embedding: String,
    source: String,
    metadata: String,
    created_at: i64,
}

impl RawMemory {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            content: row.get(1)?,
            embedding: row.get(2)?,
            source: row.get(3)?,
            metadata: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_record(self) -> Result<MemoryRecord> {
        let source = MemorySource::from_str(&self.source)
            .ok_or_else(|| Error::Store(format!("unknown source '{}' for {}", self.source, self.id)))?;
        let created_at = DateTime::<Utc>::from_timestamp_millis(self.created_at)
            .ok_or_else(|| Error::Store(format!("invalid created_at for {}", self.id)))?;

        Ok(MemoryRecord {
            embedding: serde_json::from_str(&self.embedding)?,
            metadata: serde_json::from_str(&self.metadata)?,
            id: self.id,
            content: self.content,
            source,
            created_at,
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn upsert(&self, record: NewMemoryRecord) -> Result<String> {
        let hash = content_hash(&record.content);
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;

        let existing: Option<(String, String)> = conn
            .query_row(
                "SELECT id, metadata FROM memgate_memories
                 WHERE collection = ?1 AND content_hash = ?2
                 ORDER BY seq LIMIT 1",
                params![&self.collection, &hash],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(db_error)?;

        if let Some((id, metadata)) = existing {
            let mut merged: Metadata = serde_json::from_str(&metadata)?;
            merge_metadata(&mut merged, record.metadata);
            conn.execute(
                "UPDATE memgate_memories SET metadata = ?1 WHERE id = ?2",
                params![serde_json::to_string(&merged)?, &id],
            )
            .map_err(db_error)?;
            debug!(id = %id, collection = %self.collection, "Merged into existing memory");
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO memgate_memories
                (id, collection, content, content_hash, embedding, dimensions, source, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &id,
                &self.collection,
                &record.content,
                &hash,
                serde_json::to_string(&record.embedding)?,
                record.embedding.len() as i64,
                record.source.as_str(),
                serde_json::to_string(&record.metadata)?,
                record.created_at.timestamp_millis(),
            ],
        )
        .map_err(db_error)?;

        Ok(id)
    }

    async fn search(&self, vector: &[f32], top_k: usize, min_score: f32) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let raw = {
            let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM memgate_memories
                     WHERE collection = ?1 AND dimensions = ?2
                     ORDER BY seq"
                ))
                .map_err(db_error)?;
            let rows = stmt
                .query_map(
                    params![&self.collection, vector.len() as i64],
                    RawMemory::from_row,
                )
                .map_err(db_error)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(db_error)?;
            rows
        };

        let records = raw
            .into_iter()
            .map(RawMemory::into_record)
            .collect::<Result<Vec<_>>>()?;

        Ok(rank(records.iter(), vector, top_k, min_score))
    }

    async fn get(&self, id: &str) -> Result<Option<MemoryRecord>> {
        let raw = {
            let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
            conn.query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM memgate_memories WHERE id = ?1 AND collection = ?2"
                ),
                params![id, &self.collection],
                RawMemory::from_row,
            )
            .optional()
            .map_err(db_error)?
        };

        raw.map(RawMemory::into_record).transpose()
    }

    async fn augment_metadata(&self, id: &str, metadata: Metadata) -> Result<bool> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;

        let current: Option<String> = conn
            .query_row(
                "SELECT metadata FROM memgate_memories WHERE id = ?1 AND collection = ?2",
                params![id, &self.collection],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_error)?;

        let Some(current) = current else {
            return Ok(false);
        };

        let mut merged: Metadata = serde_json::from_str(&current)?;
        merge_metadata(&mut merged, metadata);
        conn.execute(
            "UPDATE memgate_memories SET metadata = ?1 WHERE id = ?2",
            params![serde_json::to_string(&merged)?, id],
        )
        .map_err(db_error)?;

        Ok(true)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<MemoryRecord>> {
        let raw = {
            let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM memgate_memories
                     WHERE collection = ?1
                     ORDER BY seq DESC LIMIT ?2"
                ))
                .map_err(db_error)?;
            let rows = stmt
                .query_map(params![&self.collection, limit as i64], RawMemory::from_row)
                .map_err(db_error)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(db_error)?;
            rows
        };

        raw.into_iter().map(RawMemory::into_record).collect()
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM memgate_memories WHERE collection = ?1",
                params![&self.collection],
                |row| row.get(0),
            )
            .map_err(db_error)?;
        Ok(count as usize)
    }
}
