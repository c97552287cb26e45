//! End-to-end memory scenarios against the SQLite backend.

use ragmem_core::{MemoryMetadata, MemoryType, NewMemory};
use ragmem_integration_tests::sqlite_memory;
use ragmem_memory::fallback_embedding;

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

#[tokio::test]
async fn test_store_without_credential_has_unit_norm() {
    let rag = sqlite_memory().await;

    let outcome = rag
        .store_memory(NewMemory::new(
            "proj1",
            MemoryType::Decision,
            "Use retries",
            "Exponential backoff on 5xx",
        ))
        .await
        .unwrap();
    assert!(outcome.success);

    let record = rag
        .get_by_id(outcome.memory_id.as_str())
        .await
        .unwrap()
        .expect("stored record should be readable");
    assert_eq!(record.embedding.len(), 1536);
    assert!((norm(&record.embedding) - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_insert_then_get_round_trips_every_field() {
    let rag = sqlite_memory().await;
    let memory = NewMemory::new(
        "proj1",
        MemoryType::FileSummary,
        "lib.rs",
        "Public API surface",
    )
    .with_session("session-7")
    .with_tags(["api", "docs", "api"])
    .with_metadata(MemoryMetadata {
        files: Some(vec!["src/lib.rs".to_string(), "src/store.rs".to_string()]),
        importance: Some(0.9),
        expires_at: Some(1_900_000_000_000),
    });

    let outcome = rag.store_memory(memory.clone()).await.unwrap();
    let record = rag
        .get_by_id(outcome.memory_id.as_str())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.id, outcome.memory_id);
    assert_eq!(record.to_new_memory(), memory);
    assert_eq!(record.embedding, fallback_embedding(&memory.embedding_text()));
    assert!(record.created_at > 0);
}

#[tokio::test]
async fn test_list_by_type_returns_decisions_newest_first() {
    let rag = sqlite_memory().await;
    let first = rag
        .store_memory(NewMemory::new("proj1", MemoryType::Decision, "first", "a"))
        .await
        .unwrap();
    rag.store_memory(NewMemory::new("proj1", MemoryType::Blocker, "blocked", "b"))
        .await
        .unwrap();
    let third = rag
        .store_memory(NewMemory::new("proj1", MemoryType::Decision, "third", "c"))
        .await
        .unwrap();

    let decisions = rag
        .list_by_project("proj1", Some("decision"), None)
        .await
        .unwrap();

    let ids: Vec<_> = decisions.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec![third.memory_id, first.memory_id]);
}

#[tokio::test]
async fn test_list_limit_and_partition() {
    let rag = sqlite_memory().await;
    for i in 0..7 {
        rag.store_memory(NewMemory::new(
            "proj1",
            MemoryType::Progress,
            format!("step {i}"),
            "done",
        ))
        .await
        .unwrap();
    }
    rag.store_memory(NewMemory::new("proj2", MemoryType::Progress, "elsewhere", "x"))
        .await
        .unwrap();

    let listed = rag.list_by_project("proj1", None, Some(5)).await.unwrap();
    assert_eq!(listed.len(), 5);
    assert!(listed.iter().all(|r| r.project_id == "proj1"));
    assert!(listed.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    assert_eq!(listed[0].title, "step 6");

    let recent = rag.get_recent("proj1", None).await.unwrap();
    assert_eq!(recent.len(), 7);
}

#[tokio::test]
async fn test_clear_project_counts_and_empties() {
    let rag = sqlite_memory().await;
    for i in 0..3 {
        rag.store_memory(NewMemory::new("proj1", MemoryType::Context, format!("c{i}"), "x"))
            .await
            .unwrap();
    }
    let other = rag
        .store_memory(NewMemory::new("proj2", MemoryType::Context, "keep", "x"))
        .await
        .unwrap();

    let cleared = rag.clear_project("proj1").await.unwrap();
    assert_eq!(cleared.deleted, 3);
    assert!(rag.list_by_project("proj1", None, None).await.unwrap().is_empty());
    assert!(rag
        .get_by_id(other.memory_id.as_str())
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_search_returns_ranked_result() {
    let rag = sqlite_memory().await;
    let stored = rag
        .store_memory(NewMemory::new(
            "proj1",
            MemoryType::Decision,
            "Use retries",
            "Exponential backoff on 5xx",
        ))
        .await
        .unwrap();

    let results = rag.search("proj1", "retry logic", None, Some(1)).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].record.id, stored.memory_id);
    assert!(results[0].score.is_finite());
}

#[tokio::test]
async fn test_search_is_scoped_and_sorted() {
    let rag = sqlite_memory().await;
    let titles = ["alpha", "beta", "gamma", "delta", "epsilon"];
    for title in titles {
        rag.store_memory(NewMemory::new("proj1", MemoryType::CodePattern, title, title))
            .await
            .unwrap();
        rag.store_memory(NewMemory::new("proj2", MemoryType::CodePattern, title, title))
            .await
            .unwrap();
    }
    rag.store_memory(NewMemory::new("proj1", MemoryType::Blocker, "alpha", "alpha"))
        .await
        .unwrap();

    let results = rag
        .search("proj1", "alpha", Some("code_pattern"), Some(3))
        .await
        .unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.record.project_id == "proj1"));
    assert!(results
        .iter()
        .all(|r| r.record.memory_type == MemoryType::CodePattern));
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn test_search_skips_deleted_records() {
    let rag = sqlite_memory().await;
    let gone = rag
        .store_memory(NewMemory::new("proj1", MemoryType::Progress, "gone", "gone"))
        .await
        .unwrap();
    rag.store_memory(NewMemory::new("proj1", MemoryType::Progress, "kept", "kept"))
        .await
        .unwrap();
    rag.delete_memory(gone.memory_id.as_str()).await.unwrap();

    let results = rag.search("proj1", "gone", None, None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_ne!(results[0].record.id, gone.memory_id);
}

#[tokio::test]
async fn test_list_by_session() {
    let rag = sqlite_memory().await;
    rag.store_memory(
        NewMemory::new("proj1", MemoryType::Conversation, "hello", "hi").with_session("s1"),
    )
    .await
    .unwrap();
    rag.store_memory(NewMemory::new("proj1", MemoryType::Conversation, "no session", "x"))
        .await
        .unwrap();

    let records = rag.list_by_session("s1", None).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].session_id.as_deref(), Some("s1"));
}

#[tokio::test]
async fn test_concurrent_inserts_and_searches() {
    let rag = std::sync::Arc::new(sqlite_memory().await);

    let mut handles = Vec::new();
    for i in 0..8 {
        let rag = rag.clone();
        handles.push(tokio::spawn(async move {
            rag.store_memory(NewMemory::new(
                "proj1",
                MemoryType::Context,
                format!("note {i}"),
                "body",
            ))
            .await
            .unwrap();
            rag.search("proj1", "note", None, None).await.unwrap()
        }));
    }
    for handle in handles {
        let results = handle.await.unwrap();
        assert!(!results.is_empty());
    }

    assert_eq!(rag.get_recent("proj1", Some(100)).await.unwrap().len(), 8);
}
