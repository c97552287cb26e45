//! Semantic search functionality.

use crate::backend::{VectorFilter, VectorQuery};
use crate::embeddings::Embedder;
use crate::schema::BY_EMBEDDING;
use crate::store::MemoryStore;
use crate::Result;
use futures::future::try_join_all;
use ragmem_core::{validate_project_id, MemoryRecord, MemoryType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Search query parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// Project to search in.
    pub project_id: String,

    /// Query text.
    pub text: String,

    /// Restrict to one memory type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub memory_type: Option<MemoryType>,

    /// Maximum results to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

impl SearchQuery {
    /// Create a new search query.
    pub fn new(project_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            text: text.into(),
            memory_type: None,
            limit: default_limit(),
        }
    }

    /// Set the result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Restrict to a memory type.
    pub fn with_type(mut self, memory_type: MemoryType) -> Self {
        self.memory_type = Some(memory_type);
        self
    }
}

/// Search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The memory record.
    #[serde(flatten)]
    pub record: MemoryRecord,

    /// Similarity score from the vector index; higher is closer.
    pub score: f64,
}

/// Ranks stored memories against a query.
///
/// The vector index returns ids and scores; the store hydrates them into
/// records. Scores are passed through as the index reports them.
pub struct SimilaritySearch {
    embedder: Arc<Embedder>,
    store: Arc<MemoryStore>,
}

impl SimilaritySearch {
    /// Create a new search engine.
    pub fn new(embedder: Arc<Embedder>, store: Arc<MemoryStore>) -> Self {
        Self { embedder, store }
    }

    /// Search for memories similar to the query text, best match first.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        validate_project_id(&query.project_id)?;

        let vector = self.embedder.embed(&query.text).await;

        let matches = self
            .store
            .backend()
            .vector_search(&VectorQuery {
                vector,
                limit: query.limit,
                filter: VectorFilter {
                    project_id: query.project_id.clone(),
                    memory_type: query.memory_type,
                },
            })
            .await?;

        // Hydrate in parallel; the index order is kept
        let hydrated = try_join_all(matches.iter().map(|m| self.store.get_by_id(&m.id))).await?;

        let candidates = matches.len();
        let results: Vec<SearchResult> = matches
            .into_iter()
            .zip(hydrated)
            .filter_map(|(m, record)| {
                // Deleted between ranking and hydration
                record.map(|record| SearchResult {
                    record,
                    score: m.score,
                })
            })
            .collect();

        debug!(
            index = BY_EMBEDDING,
            project_id = %query.project_id,
            candidates,
            returned = results.len(),
            "Similarity search complete"
        );
        Ok(results)
    }
}
