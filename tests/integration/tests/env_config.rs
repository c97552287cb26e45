//! Environment-driven configuration through the default load path.
//!
//! Kept in its own binary: the test mutates process environment variables.

use ragmem_core::config::{Config, StorageBackendKind};
use ragmem_core::env::vars;
use ragmem_core::{MemoryType, NewMemory, EMBEDDING_DIMENSIONS};
use ragmem_memory::{Embedder, RagMemory};
use std::env;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn remote_vector() -> Vec<f64> {
    let mut v = vec![0.0; EMBEDDING_DIMENSIONS];
    v[7] = 1.0;
    v
}

#[tokio::test]
async fn test_openai_key_in_env_enables_remote_provider() {
    ragmem_integration_tests::init_tracing();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", "Bearer sk-from-env"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{ "index": 0, "embedding": remote_vector() }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    env::set_var(vars::RAGMEM_HOME, home.path());
    env::remove_var(vars::RAGMEM_CONFIG);
    env::set_var(vars::OPENAI_API_KEY, "sk-from-env");
    env::set_var(vars::RAGMEM_EMBEDDINGS_URL, server.uri());

    // No config file yet
    let config = Config::load_or_default();
    assert!(config.embeddings.has_api_key());
    assert!(Embedder::from_config(&config.embeddings).unwrap().has_remote());

    // A file without a key still picks up the environment
    fs::write(
        home.path().join("ragmem.json5"),
        "{ storage: { backend: 'sqlite' } }",
    )
    .unwrap();
    let config = Config::load_or_default();
    assert_eq!(config.storage.backend, StorageBackendKind::Sqlite);
    assert!(config.storage.path.is_none());
    assert_eq!(config.embeddings.base_url, server.uri());

    let rag = RagMemory::from_config(&config).await.unwrap();
    let outcome = rag
        .store_memory(NewMemory::new(
            "proj1",
            MemoryType::Decision,
            "Use retries",
            "Exponential backoff on 5xx",
        ))
        .await
        .unwrap();

    let record = rag
        .get_by_id(outcome.memory_id.as_str())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.embedding, remote_vector());

    // SQLite without a path lands in the home directory
    assert!(home.path().join("memories.db").exists());
}
