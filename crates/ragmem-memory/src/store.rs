//! Memory record lifecycle over a storage backend.

use crate::backend::{IndexFilter, IndexQuery, StorageBackend};
use crate::error::MemoryError;
use crate::Result;
use chrono::Utc;
use ragmem_core::{
    validate_project_id, MemoryDocument, MemoryId, MemoryRecord, MemoryType, NewMemory,
    ValidationError,
};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default `list_by_project` limit.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Default `get_recent` limit.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Creates, reads, and deletes memory records, partitioned by project.
///
/// Records are never updated in place. `created_at` is assigned here and is
/// non-decreasing across inserts made through one store.
pub struct MemoryStore {
    backend: Arc<dyn StorageBackend>,
    last_created_at: AtomicI64,
}

impl MemoryStore {
    /// Create a store over `backend`.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            last_created_at: AtomicI64::new(i64::MIN),
        }
    }

    /// The storage and vector-index collaborator.
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Persist a memory with its precomputed embedding and return the new id.
    pub async fn insert(&self, memory: NewMemory, embedding: Vec<f64>) -> Result<MemoryId> {
        let created_at = self.next_created_at();
        let doc = MemoryDocument::new(memory, embedding, created_at)?;
        let project_id = doc.memory().project_id.clone();
        let memory_type = doc.memory().memory_type;

        let id = self.backend.insert(doc).await?;
        debug!(
            memory_id = %id,
            project_id = %project_id,
            memory_type = %memory_type,
            created_at,
            "Inserted memory"
        );
        Ok(id)
    }

    /// Point lookup. A missing record is `Ok(None)`.
    pub async fn get_by_id(&self, id: &MemoryId) -> Result<Option<MemoryRecord>> {
        self.backend.get(id).await
    }

    /// Delete one record. Succeeds whether or not the id existed.
    pub async fn delete_by_id(&self, id: &MemoryId) -> Result<bool> {
        self.backend.delete(id).await?;
        debug!(memory_id = %id, "Deleted memory");
        Ok(true)
    }

    /// Delete every record of a project and return how many were removed.
    ///
    /// Not atomic: records are listed, then deleted one at a time. Records
    /// inserted concurrently may survive. If a delete fails the error is
    /// [`MemoryError::PartialDelete`] carrying the count removed so far.
    pub async fn delete_all_for_project(&self, project_id: &str) -> Result<usize> {
        validate_project_id(project_id)?;

        let records = self
            .backend
            .query_index(&IndexQuery::new(IndexFilter::project(project_id, None)))
            .await?;

        let mut deleted = 0;
        for record in &records {
            if let Err(e) = self.backend.delete(&record.id).await {
                warn!(
                    project_id = %project_id,
                    memory_id = %record.id,
                    deleted,
                    total = records.len(),
                    error = %e,
                    "Bulk delete interrupted"
                );
                return Err(MemoryError::PartialDelete {
                    deleted,
                    source: Box::new(e),
                });
            }
            deleted += 1;
        }

        info!(project_id = %project_id, deleted, "Cleared project memories");
        Ok(deleted)
    }

    /// Newest records of a project, optionally of one type.
    pub async fn list_by_project(
        &self,
        project_id: &str,
        memory_type: Option<MemoryType>,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>> {
        validate_project_id(project_id)?;
        let query =
            IndexQuery::new(IndexFilter::project(project_id, memory_type)).with_limit(limit);
        self.backend.query_index(&query).await
    }

    /// Newest records of a project regardless of type.
    pub async fn get_recent(&self, project_id: &str, limit: usize) -> Result<Vec<MemoryRecord>> {
        self.list_by_project(project_id, None, limit).await
    }

    /// Newest records written in one session.
    pub async fn list_by_session(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>> {
        if session_id.trim().is_empty() {
            return Err(ValidationError::EmptySessionId.into());
        }
        let query = IndexQuery::new(IndexFilter::Session {
            session_id: session_id.to_string(),
        })
        .with_limit(limit);
        self.backend.query_index(&query).await
    }

    /// Wall-clock milliseconds, never behind the previous assignment.
    fn next_created_at(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_created_at
            .fetch_max(now, Ordering::SeqCst);
        previous.max(now)
    }
}
