//! Configuration schema definitions.

use crate::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main RagMem configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Embedding service settings.
    #[serde(default)]
    pub embeddings: EmbeddingConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Default result limits.
    #[serde(default)]
    pub defaults: QueryDefaults,
}

/// Embedding service configuration.
///
/// With `api_key` unset the embedder runs in fallback mode and produces
/// deterministic local vectors instead of calling the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Bearer credential for the embeddings endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    /// Embedding model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Input is cut to this many UTF-16 code units before it is sent.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_input_chars() -> usize {
    8000
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

impl EmbeddingConfig {
    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<SecretString>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Whether a credential is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// Process-local, non-persistent store.
    #[default]
    Memory,
    /// SQLite database via sqlx.
    Sqlite,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which backend to open.
    #[serde(default)]
    pub backend: StorageBackendKind,

    /// Database file for the SQLite backend. Unset means `~/.ragmem/memories.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Default limits applied when a caller passes none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDefaults {
    /// `list_by_project` limit.
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,

    /// `get_recent` limit.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    /// `search` limit.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

fn default_list_limit() -> usize {
    50
}

fn default_recent_limit() -> usize {
    10
}

fn default_search_limit() -> usize {
    5
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            list_limit: default_list_limit(),
            recent_limit: default_recent_limit(),
            search_limit: default_search_limit(),
        }
    }
}
