//! Project-scoped memory records with semantic search.
//!
//! This crate provides:
//! - Embedding generation via the OpenAI API, with a deterministic local fallback
//! - A memory store over pluggable storage backends (in-memory, SQLite)
//! - Similarity search scoped by project and memory type
//!
//! [`RagMemory`] wires these together for a hosting application.

pub mod backend;
pub mod embeddings;
pub mod error;
pub mod schema;
pub mod search;
pub mod store;

pub use backend::{open_backend, InMemoryBackend, SqliteBackend, StorageBackend};
pub use embeddings::{fallback_embedding, Embedder, EmbeddingProvider, OpenAIEmbeddings};
pub use error::MemoryError;
pub use search::{SearchQuery, SearchResult, SimilaritySearch};
pub use store::MemoryStore;

use ragmem_core::config::QueryDefaults;
use ragmem_core::{Config, MemoryId, MemoryRecord, MemoryType, NewMemory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result type for memory operations.
pub type Result<T> = std::result::Result<T, MemoryError>;

/// Outcome of [`RagMemory::store_memory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOutcome {
    pub memory_id: MemoryId,
    pub success: bool,
}

/// Outcome of [`RagMemory::delete_memory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,
}

/// Outcome of [`RagMemory::clear_project`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearOutcome {
    pub deleted: usize,
}

/// Entry points for a hosting application.
///
/// Type names arrive as strings here and are validated before anything
/// reaches storage. Omitted limits fall back to [`QueryDefaults`].
pub struct RagMemory {
    embedder: Arc<Embedder>,
    store: Arc<MemoryStore>,
    search: SimilaritySearch,
    defaults: QueryDefaults,
}

impl RagMemory {
    /// Assemble from parts.
    pub fn new(
        embedder: Embedder,
        backend: Arc<dyn StorageBackend>,
        defaults: QueryDefaults,
    ) -> Self {
        let embedder = Arc::new(embedder);
        let store = Arc::new(MemoryStore::new(backend));
        let search = SimilaritySearch::new(embedder.clone(), store.clone());
        Self {
            embedder,
            store,
            search,
            defaults,
        }
    }

    /// Build the embedder and open the backend described by `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let embedder = Embedder::from_config(&config.embeddings)?;
        let backend = open_backend(&config.storage).await?;
        Ok(Self::new(embedder, backend, config.defaults.clone()))
    }

    /// The underlying store.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Embed `title + "\n\n" + content` and persist the memory.
    pub async fn store_memory(&self, memory: NewMemory) -> Result<StoreOutcome> {
        memory.validate()?;
        let embedding = self.embedder.embed(&memory.embedding_text()).await;
        let memory_id = self.store.insert(memory, embedding).await?;
        Ok(StoreOutcome {
            memory_id,
            success: true,
        })
    }

    /// Most similar memories in a project, best first.
    pub async fn search(
        &self,
        project_id: &str,
        query: &str,
        memory_type: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        let mut search_query = SearchQuery::new(project_id, query)
            .with_limit(limit.unwrap_or(self.defaults.search_limit));
        search_query.memory_type = MemoryType::parse_optional(memory_type)?;
        self.search.search(&search_query).await
    }

    /// Newest memories of a project, optionally of one type.
    pub async fn list_by_project(
        &self,
        project_id: &str,
        memory_type: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<MemoryRecord>> {
        let memory_type = MemoryType::parse_optional(memory_type)?;
        self.store
            .list_by_project(
                project_id,
                memory_type,
                limit.unwrap_or(self.defaults.list_limit),
            )
            .await
    }

    /// Newest memories of a project.
    pub async fn get_recent(
        &self,
        project_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<MemoryRecord>> {
        self.store
            .get_recent(project_id, limit.unwrap_or(self.defaults.recent_limit))
            .await
    }

    /// Newest memories written in a session.
    pub async fn list_by_session(
        &self,
        session_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<MemoryRecord>> {
        self.store
            .list_by_session(session_id, limit.unwrap_or(self.defaults.list_limit))
            .await
    }

    /// Fetch one memory.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<MemoryRecord>> {
        let id: MemoryId = id.parse()?;
        self.store.get_by_id(&id).await
    }

    /// Delete one memory. Missing ids still report success.
    pub async fn delete_memory(&self, id: &str) -> Result<DeleteOutcome> {
        let id: MemoryId = id.parse()?;
        let success = self.store.delete_by_id(&id).await?;
        Ok(DeleteOutcome { success })
    }

    /// Delete every memory of a project.
    pub async fn clear_project(&self, project_id: &str) -> Result<ClearOutcome> {
        let deleted = self.store.delete_all_for_project(project_id).await?;
        Ok(ClearOutcome { deleted })
    }
}
