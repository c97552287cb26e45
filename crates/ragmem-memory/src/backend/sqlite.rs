//! SQLite storage backend.

use super::{
    rank_candidates, IndexFilter, IndexQuery, SortOrder, StorageBackend, VectorMatch, VectorQuery,
};
use crate::error::MemoryError;
use crate::schema::{sqlite_schema, TABLE};
use crate::Result;
use async_trait::async_trait;
use ragmem_core::{MemoryDocument, MemoryId, MemoryMetadata, MemoryRecord, MemoryType};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, trace};

const RECORD_COLUMNS: &str = "id, project_id, session_id, type, title, content, tags, \
                              embedding, metadata, created_at";

/// Backend storing records in a SQLite database.
///
/// Tags and metadata are JSON text; embeddings are little-endian `f64` blobs
/// so they read back bit-for-bit. Vector search scans the filtered rows and
/// ranks them by cosine similarity.
#[derive(Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Wrap an existing pool and create the schema if needed.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        let backend = Self { pool };
        backend.init().await?;
        Ok(backend)
    }

    /// Open (or create) a database file.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::Backend(format!("Cannot create {}: {}", parent.display(), e))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        debug!(path = %path.display(), "Opened SQLite memory store");
        Self::new(pool).await
    }

    /// A private in-memory database.
    ///
    /// Each SQLite `:memory:` connection is its own database, so the pool is
    /// pinned to one connection that is never recycled.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect("sqlite::memory:")
            .await?;
        Self::new(pool).await
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init(&self) -> Result<()> {
        for statement in sqlite_schema() {
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    async fn insert(&self, doc: MemoryDocument) -> Result<MemoryId> {
        let id = MemoryId::generate();
        let memory = doc.memory();
        let metadata = memory
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let sql = format!(
            "INSERT INTO {TABLE} ({RECORD_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        sqlx::query(&sql)
            .bind(id.as_str())
            .bind(&memory.project_id)
            .bind(&memory.session_id)
            .bind(memory.memory_type.as_str())
            .bind(&memory.title)
            .bind(&memory.content)
            .bind(serde_json::to_string(&memory.tags)?)
            .bind(encode_embedding(doc.embedding()))
            .bind(metadata)
            .bind(doc.created_at())
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    async fn get(&self, id: &MemoryId) -> Result<Option<MemoryRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM {TABLE} WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn delete(&self, id: &MemoryId) -> Result<()> {
        let sql = format!("DELETE FROM {TABLE} WHERE id = ?");
        sqlx::query(&sql)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn query_index(&self, query: &IndexQuery) -> Result<Vec<MemoryRecord>> {
        let mut sql = format!("SELECT {RECORD_COLUMNS} FROM {TABLE} WHERE ");
        sql.push_str(match &query.filter {
            IndexFilter::Project { .. } => "project_id = ?",
            IndexFilter::ProjectType { .. } => "project_id = ? AND type = ?",
            IndexFilter::Session { .. } => "session_id = ?",
        });
        sql.push_str(match query.order {
            SortOrder::Ascending => " ORDER BY created_at ASC, seq ASC",
            SortOrder::Descending => " ORDER BY created_at DESC, seq DESC",
        });
        // SQLite reads a negative LIMIT as "no limit"
        sql.push_str(" LIMIT ?");

        let mut q = sqlx::query(&sql);
        q = match &query.filter {
            IndexFilter::Project { project_id } => q.bind(project_id),
            IndexFilter::ProjectType {
                project_id,
                memory_type,
            } => q.bind(project_id).bind(memory_type.as_str()),
            IndexFilter::Session { session_id } => q.bind(session_id),
        };
        let limit = query
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);
        q = q.bind(limit);

        let rows = q.fetch_all(&self.pool).await?;
        trace!(index = query.filter.index_name(), rows = rows.len(), "Queried index");
        rows.iter().map(row_to_record).collect()
    }

    async fn vector_search(&self, query: &VectorQuery) -> Result<Vec<VectorMatch>> {
        let mut sql = format!("SELECT id, embedding FROM {TABLE} WHERE project_id = ?");
        if query.filter.memory_type.is_some() {
            sql.push_str(" AND type = ?");
        }

        let mut q = sqlx::query(&sql).bind(&query.filter.project_id);
        if let Some(memory_type) = query.filter.memory_type {
            q = q.bind(memory_type.as_str());
        }
        let rows = q.fetch_all(&self.pool).await?;

        let candidates = rows
            .iter()
            .map(|row| -> Result<(MemoryId, Vec<f64>)> {
                let id: String = row.try_get("id")?;
                let blob: Vec<u8> = row.try_get("embedding")?;
                Ok((MemoryId::new(id), decode_embedding(&blob)?))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(rank_candidates(
            &query.vector,
            candidates.iter().map(|(id, e)| (id, e.as_slice())),
            query.limit,
        ))
    }
}

fn row_to_record(row: &SqliteRow) -> Result<MemoryRecord> {
    let memory_type: String = row.try_get("type")?;
    let tags: String = row.try_get("tags")?;
    let embedding: Vec<u8> = row.try_get("embedding")?;
    let metadata: Option<String> = row.try_get("metadata")?;

    Ok(MemoryRecord {
        id: MemoryId::new(row.try_get::<String, _>("id")?),
        project_id: row.try_get("project_id")?,
        session_id: row.try_get("session_id")?,
        memory_type: memory_type.parse::<MemoryType>()?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        tags: serde_json::from_str(&tags)?,
        embedding: decode_embedding(&embedding)?,
        metadata: metadata
            .as_deref()
            .map(serde_json::from_str::<MemoryMetadata>)
            .transpose()?,
        created_at: row.try_get("created_at")?,
    })
}

fn encode_embedding(embedding: &[f64]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Result<Vec<f64>> {
    if blob.len() % 8 != 0 {
        return Err(MemoryError::Backend(format!(
            "Embedding blob length {} is not a multiple of 8",
            blob.len()
        )));
    }

    Ok(blob
        .chunks_exact(8)
        .map(|chunk| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            f64::from_le_bytes(bytes)
        })
        .collect())
}
