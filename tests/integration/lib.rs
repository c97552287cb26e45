//! Shared helpers for the integration tests.

use ragmem_core::config::QueryDefaults;
use ragmem_memory::{Embedder, RagMemory, SqliteBackend};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Install a test-writer subscriber once per test binary.
///
/// `RUST_LOG` overrides the default debug filter for the ragmem crates.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ragmem_memory=debug,ragmem_core=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A fallback-embedding memory over a private in-memory SQLite database.
pub async fn sqlite_memory() -> RagMemory {
    init_tracing();
    let backend = SqliteBackend::in_memory()
        .await
        .expect("in-memory sqlite should open");
    RagMemory::new(
        Embedder::fallback_only(),
        Arc::new(backend),
        QueryDefaults::default(),
    )
}
