//! Logical schema of the memory table.
//!
//! Names mirror the indexes a hosting database is expected to provide. The
//! SQLite backend realizes them with [`sqlite_schema`]; its vector index is a
//! scan ranked in process.

pub use ragmem_core::EMBEDDING_DIMENSIONS;

/// Table holding memory records.
pub const TABLE: &str = "rag_memories";

/// Equality index on `project_id`.
pub const BY_PROJECT: &str = "by_project";

/// Equality index on `(project_id, type)`.
pub const BY_TYPE: &str = "by_type";

/// Equality index on `session_id`.
pub const BY_SESSION: &str = "by_session";

/// Vector index over `embedding`.
pub const BY_EMBEDDING: &str = "by_embedding";

/// DDL for the SQLite backend, one statement per entry.
///
/// `seq` breaks ties between records inserted in the same millisecond.
pub fn sqlite_schema() -> [String; 4] {
    [
        format!(
            r#"CREATE TABLE IF NOT EXISTS {TABLE} (
        seq         INTEGER PRIMARY KEY AUTOINCREMENT,
        id          TEXT NOT NULL UNIQUE,
        project_id  TEXT NOT NULL,
        session_id  TEXT,
        type        TEXT NOT NULL,
        title       TEXT NOT NULL,
        content     TEXT NOT NULL,
        tags        TEXT NOT NULL,
        embedding   BLOB NOT NULL,
        metadata    TEXT,
        created_at  INTEGER NOT NULL
    )"#
        ),
        format!("CREATE INDEX IF NOT EXISTS {BY_PROJECT} ON {TABLE} (project_id, created_at)"),
        format!("CREATE INDEX IF NOT EXISTS {BY_TYPE} ON {TABLE} (project_id, type, created_at)"),
        format!("CREATE INDEX IF NOT EXISTS {BY_SESSION} ON {TABLE} (session_id, created_at)"),
    ]
}
