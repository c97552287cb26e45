//! Environment variable handling.
//!
//! Only configuration loading reads the environment. Library operations
//! receive their settings through [`crate::Config`].

use std::env;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable as a u64 (e.g., for timeouts).
pub fn get_u64(name: &str) -> Option<u64> {
    get_var(name).and_then(|v| v.trim().parse().ok())
}

/// Common environment variable names.
pub mod vars {
    /// API key for the OpenAI embeddings endpoint.
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

    /// Base URL override for the embeddings endpoint.
    pub const RAGMEM_EMBEDDINGS_URL: &str = "RAGMEM_EMBEDDINGS_URL";

    /// Embedding request timeout in seconds.
    pub const RAGMEM_EMBEDDINGS_TIMEOUT: &str = "RAGMEM_EMBEDDINGS_TIMEOUT";

    /// RagMem home directory override.
    pub const RAGMEM_HOME: &str = "RAGMEM_HOME";

    /// RagMem config file override.
    pub const RAGMEM_CONFIG: &str = "RAGMEM_CONFIG";
}
