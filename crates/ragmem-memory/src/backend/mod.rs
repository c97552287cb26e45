//! Storage and vector-index backends.
//!
//! [`StorageBackend`] is the seam to whatever database hosts the memory
//! table. Two implementations ship with the crate:
//!
//! - [`InMemoryBackend`]: process-local maps, for tests and ephemeral use
//! - [`SqliteBackend`]: a SQLite database through sqlx

mod memory;
mod sqlite;

pub use memory::InMemoryBackend;
pub use sqlite::SqliteBackend;

use crate::embeddings::cosine_similarity;
use crate::schema;
use crate::Result;
use async_trait::async_trait;
use ragmem_core::config::{StorageBackendKind, StorageConfig};
use ragmem_core::paths;
use ragmem_core::{MemoryDocument, MemoryId, MemoryRecord, MemoryType};
use std::cmp::Ordering;
use std::sync::Arc;

/// Storage collaborator: record persistence, equality indexes, vector search.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Persist a document and return its newly assigned id.
    async fn insert(&self, doc: MemoryDocument) -> Result<MemoryId>;

    /// Point lookup.
    async fn get(&self, id: &MemoryId) -> Result<Option<MemoryRecord>>;

    /// Remove a record. Removing a missing id is not an error.
    async fn delete(&self, id: &MemoryId) -> Result<()>;

    /// Records matching an equality index, ordered by `created_at`.
    async fn query_index(&self, query: &IndexQuery) -> Result<Vec<MemoryRecord>>;

    /// Nearest stored vectors, best first.
    async fn vector_search(&self, query: &VectorQuery) -> Result<Vec<VectorMatch>>;
}

/// Equality filter naming one of the schema's indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexFilter {
    /// `by_project`
    Project { project_id: String },
    /// `by_type`
    ProjectType {
        project_id: String,
        memory_type: MemoryType,
    },
    /// `by_session`
    Session { session_id: String },
}

impl IndexFilter {
    /// Filter on project, narrowed to a type when one is given.
    pub fn project(project_id: impl Into<String>, memory_type: Option<MemoryType>) -> Self {
        let project_id = project_id.into();
        match memory_type {
            Some(memory_type) => IndexFilter::ProjectType {
                project_id,
                memory_type,
            },
            None => IndexFilter::Project { project_id },
        }
    }

    /// Name of the backing index.
    pub fn index_name(&self) -> &'static str {
        match self {
            IndexFilter::Project { .. } => schema::BY_PROJECT,
            IndexFilter::ProjectType { .. } => schema::BY_TYPE,
            IndexFilter::Session { .. } => schema::BY_SESSION,
        }
    }

    /// Whether `record` satisfies the filter.
    pub fn matches(&self, record: &MemoryRecord) -> bool {
        match self {
            IndexFilter::Project { project_id } => record.project_id == *project_id,
            IndexFilter::ProjectType {
                project_id,
                memory_type,
            } => record.project_id == *project_id && record.memory_type == *memory_type,
            IndexFilter::Session { session_id } => {
                record.session_id.as_deref() == Some(session_id.as_str())
            }
        }
    }
}

/// Order of `created_at` in index queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// An equality-index query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    pub filter: IndexFilter,
    pub order: SortOrder,
    /// `None` returns every match.
    pub limit: Option<usize>,
}

impl IndexQuery {
    /// Newest-first query with no limit.
    pub fn new(filter: IndexFilter) -> Self {
        Self {
            filter,
            order: SortOrder::Descending,
            limit: None,
        }
    }

    /// Set the sort order.
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Cap the number of rows.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Filter applied by the vector index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorFilter {
    pub project_id: String,
    pub memory_type: Option<MemoryType>,
}

impl VectorFilter {
    /// Whether a record with this project and type passes the filter.
    pub fn matches(&self, project_id: &str, memory_type: MemoryType) -> bool {
        self.project_id == project_id && self.memory_type.map_or(true, |t| t == memory_type)
    }
}

/// A nearest-neighbour query.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorQuery {
    pub vector: Vec<f64>,
    pub limit: usize,
    pub filter: VectorFilter,
}

/// A candidate from the vector index. Higher scores are more similar.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub id: MemoryId,
    pub score: f64,
}

/// Score candidates by cosine similarity and keep the best `limit`.
pub(crate) fn rank_candidates<'a, I>(query: &[f64], candidates: I, limit: usize) -> Vec<VectorMatch>
where
    I: IntoIterator<Item = (&'a MemoryId, &'a [f64])>,
{
    let mut matches: Vec<VectorMatch> = candidates
        .into_iter()
        .map(|(id, embedding)| VectorMatch {
            id: id.clone(),
            score: cosine_similarity(query, embedding),
        })
        .collect();

    // Sort by score descending
    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    matches.truncate(limit);
    matches
}

/// Open the backend selected in `config`.
///
/// SQLite without an explicit path opens the database under the RagMem home
/// directory.
pub async fn open_backend(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>> {
    match config.backend {
        StorageBackendKind::Memory => Ok(Arc::new(InMemoryBackend::new())),
        StorageBackendKind::Sqlite => {
            let path = match &config.path {
                Some(path) => path.clone(),
                None => paths::database_file()?,
            };
            Ok(Arc::new(SqliteBackend::open(&path).await?))
        }
    }
}
