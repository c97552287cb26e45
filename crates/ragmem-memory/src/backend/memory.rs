//! In-memory storage backend.

use super::{rank_candidates, IndexQuery, SortOrder, StorageBackend, VectorMatch, VectorQuery};
use crate::Result;
use async_trait::async_trait;
use ragmem_core::{MemoryDocument, MemoryId, MemoryRecord};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::trace;

struct StoredRecord {
    /// Insertion sequence, breaks `created_at` ties.
    seq: u64,
    record: MemoryRecord,
}

#[derive(Default)]
struct State {
    records: HashMap<MemoryId, StoredRecord>,
    next_seq: u64,
}

/// Process-local backend. Contents are lost when it is dropped.
#[derive(Default)]
pub struct InMemoryBackend {
    state: RwLock<State>,
}

impl InMemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Whether the backend holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn insert(&self, doc: MemoryDocument) -> Result<MemoryId> {
        let id = MemoryId::generate();
        let mut state = self.state.write().await;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.records.insert(
            id.clone(),
            StoredRecord {
                seq,
                record: doc.into_record(id.clone()),
            },
        );
        trace!(memory_id = %id, seq, "Inserted record");
        Ok(id)
    }

    async fn get(&self, id: &MemoryId) -> Result<Option<MemoryRecord>> {
        let state = self.state.read().await;
        Ok(state.records.get(id).map(|stored| stored.record.clone()))
    }

    async fn delete(&self, id: &MemoryId) -> Result<()> {
        let mut state = self.state.write().await;
        state.records.remove(id);
        Ok(())
    }

    async fn query_index(&self, query: &IndexQuery) -> Result<Vec<MemoryRecord>> {
        let state = self.state.read().await;

        let mut matches: Vec<&StoredRecord> = state
            .records
            .values()
            .filter(|stored| query.filter.matches(&stored.record))
            .collect();

        matches.sort_by_key(|stored| (stored.record.created_at, stored.seq));
        if query.order == SortOrder::Descending {
            matches.reverse();
        }

        trace!(index = query.filter.index_name(), rows = matches.len(), "Queried index");
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matches
            .into_iter()
            .take(limit)
            .map(|stored| stored.record.clone())
            .collect())
    }

    async fn vector_search(&self, query: &VectorQuery) -> Result<Vec<VectorMatch>> {
        let state = self.state.read().await;

        let candidates = state
            .records
            .values()
            .map(|stored| &stored.record)
            .filter(|r| query.filter.matches(&r.project_id, r.memory_type))
            .map(|r| (&r.id, r.embedding.as_slice()));

        Ok(rank_candidates(&query.vector, candidates, query.limit))
    }
}
