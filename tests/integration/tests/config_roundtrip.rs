//! Config file to running memory store.

use ragmem_core::config::{Config, StorageBackendKind};
use ragmem_core::{MemoryType, NewMemory};
use ragmem_memory::RagMemory;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    // Config::load applies the environment
    std::env::remove_var(ragmem_core::env::vars::OPENAI_API_KEY);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ragmem.json5");

    let mut config = Config::default();
    config.storage.backend = StorageBackendKind::Sqlite;
    config.storage.path = Some(dir.path().join("memories.db"));
    config.defaults.search_limit = 8;
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.storage.backend, StorageBackendKind::Sqlite);
    assert_eq!(loaded.storage.path, config.storage.path);
    assert_eq!(loaded.defaults.search_limit, 8);
    assert!(loaded.embeddings.api_key.is_none());
}

#[test]
fn test_config_load_nonexistent() {
    assert!(Config::load(Path::new("/nonexistent/ragmem.json5")).is_err());
}

#[test]
fn test_config_parse_invalid() {
    assert!(Config::parse("not valid json").is_err());
    assert!(Config::parse(r#"{ storage: { backend: "postgres" } }"#).is_err());
}

#[tokio::test]
async fn test_sqlite_file_survives_reopen() {
    ragmem_integration_tests::init_tracing();
    let dir = TempDir::new().unwrap();
    let config = Config::parse(&format!(
        r#"{{ storage: {{ backend: "sqlite", path: {} }} }}"#,
        serde_json::to_string(&dir.path().join("db").join("memories.db")).unwrap()
    ))
    .unwrap();

    let id = {
        let rag = RagMemory::from_config(&config).await.unwrap();
        rag.store_memory(NewMemory::new(
            "proj1",
            MemoryType::Blocker,
            "CI is red",
            "Flaky network test",
        ))
        .await
        .unwrap()
        .memory_id
    };

    let rag = RagMemory::from_config(&config).await.unwrap();
    let record = rag.get_by_id(id.as_str()).await.unwrap().unwrap();
    assert_eq!(record.title, "CI is red");
    assert_eq!(rag.clear_project("proj1").await.unwrap().deleted, 1);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let mut config = Config::default();
    config.embeddings.timeout_secs = 0;
    assert!(RagMemory::from_config(&config).await.is_err());
}
