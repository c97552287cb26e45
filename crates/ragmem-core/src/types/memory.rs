//! Memory record types.

use super::MemoryId;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of components in every stored embedding.
pub const EMBEDDING_DIMENSIONS: usize = 1536;

/// Kind of note a memory record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Decision,
    CodePattern,
    Progress,
    Blocker,
    Context,
    FileSummary,
    Conversation,
}

impl MemoryType {
    /// Every memory type, in declaration order.
    pub const ALL: [MemoryType; 7] = [
        MemoryType::Decision,
        MemoryType::CodePattern,
        MemoryType::Progress,
        MemoryType::Blocker,
        MemoryType::Context,
        MemoryType::FileSummary,
        MemoryType::Conversation,
    ];

    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Decision => "decision",
            MemoryType::CodePattern => "code_pattern",
            MemoryType::Progress => "progress",
            MemoryType::Blocker => "blocker",
            MemoryType::Context => "context",
            MemoryType::FileSummary => "file_summary",
            MemoryType::Conversation => "conversation",
        }
    }

    /// Parse an optional type name coming from a caller.
    pub fn parse_optional(name: Option<&str>) -> Result<Option<Self>, ValidationError> {
        name.map(str::parse::<MemoryType>).transpose()
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MemoryType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownMemoryType(s.to_string()))
    }
}

/// Optional annotations attached to a memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryMetadata {
    /// Files the memory refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,

    /// Caller-defined importance score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,

    /// Advisory expiry, epoch milliseconds. Not enforced by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Caller-supplied fields of a memory, before an embedding is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMemory {
    pub project_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(rename = "type")]
    pub memory_type: MemoryType,

    pub title: String,

    pub content: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MemoryMetadata>,
}

impl NewMemory {
    /// Create a memory with no session, tags, or metadata.
    pub fn new(
        project_id: impl Into<String>,
        memory_type: MemoryType,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            session_id: None,
            memory_type,
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            metadata: None,
        }
    }

    /// Set the session.
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Append a tag. Order is kept and duplicates are allowed.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Replace the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the metadata.
    pub fn with_metadata(mut self, metadata: MemoryMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Text that gets embedded for this memory.
    pub fn embedding_text(&self) -> String {
        format!("{}\n\n{}", self.title, self.content)
    }

    /// Check the fields that storage relies on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_project_id(&self.project_id)?;
        if let Some(session_id) = &self.session_id {
            if session_id.trim().is_empty() {
                return Err(ValidationError::EmptySessionId);
            }
        }
        Ok(())
    }
}

/// Reject an empty project partition key.
pub fn validate_project_id(project_id: &str) -> Result<(), ValidationError> {
    if project_id.trim().is_empty() {
        Err(ValidationError::EmptyProjectId)
    } else {
        Ok(())
    }
}

/// A validated memory ready to be inserted: fields, embedding, and timestamp.
///
/// Construction enforces a non-empty project and a 1536-component embedding,
/// so backends never see a malformed row.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryDocument {
    memory: NewMemory,
    embedding: Vec<f64>,
    created_at: i64,
}

impl MemoryDocument {
    /// Validate and assemble a document.
    pub fn new(
        memory: NewMemory,
        embedding: Vec<f64>,
        created_at: i64,
    ) -> Result<Self, ValidationError> {
        memory.validate()?;
        if embedding.len() != EMBEDDING_DIMENSIONS {
            return Err(ValidationError::EmbeddingDimension {
                expected: EMBEDDING_DIMENSIONS,
                actual: embedding.len(),
            });
        }
        Ok(Self {
            memory,
            embedding,
            created_at,
        })
    }

    pub fn memory(&self) -> &NewMemory {
        &self.memory
    }

    pub fn embedding(&self) -> &[f64] {
        &self.embedding
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Attach the backend-assigned id.
    pub fn into_record(self, id: MemoryId) -> MemoryRecord {
        let NewMemory {
            project_id,
            session_id,
            memory_type,
            title,
            content,
            tags,
            metadata,
        } = self.memory;

        MemoryRecord {
            id,
            project_id,
            session_id,
            memory_type,
            title,
            content,
            tags,
            embedding: self.embedding,
            metadata,
            created_at: self.created_at,
        }
    }
}

/// A stored memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    pub id: MemoryId,

    pub project_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(rename = "type")]
    pub memory_type: MemoryType,

    pub title: String,

    pub content: String,

    #[serde(default)]
    pub tags: Vec<String>,

    pub embedding: Vec<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MemoryMetadata>,

    /// Insert time, epoch milliseconds.
    pub created_at: i64,
}

impl MemoryRecord {
    /// The caller-supplied part of the record.
    pub fn to_new_memory(&self) -> NewMemory {
        NewMemory {
            project_id: self.project_id.clone(),
            session_id: self.session_id.clone(),
            memory_type: self.memory_type,
            title: self.title.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewMemory {
        NewMemory::new("proj1", MemoryType::Decision, "Use retries", "Exponential backoff on 5xx")
            .with_session("sess-1")
            .with_tags(["http", "retry", "http"])
    }

    #[test]
    fn test_memory_type_round_trips_names() {
        for t in MemoryType::ALL {
            assert_eq!(t.as_str().parse::<MemoryType>().unwrap(), t);
        }
        assert_eq!(
            "code_pattern".parse::<MemoryType>().unwrap(),
            MemoryType::CodePattern
        );
    }

    #[test]
    fn test_memory_type_rejects_unknown() {
        let err = "Decision".parse::<MemoryType>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownMemoryType("Decision".to_string()));
        assert!(MemoryType::parse_optional(Some("todo")).is_err());
        assert_eq!(MemoryType::parse_optional(None).unwrap(), None);
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_value(&sample()).unwrap();
        assert_eq!(json["projectId"], "proj1");
        assert_eq!(json["sessionId"], "sess-1");
        assert_eq!(json["type"], "decision");
        assert_eq!(json["tags"], serde_json::json!(["http", "retry", "http"]));
        assert!(json.get("metadata").is_none());

        let bad = serde_json::json!({
            "projectId": "p",
            "type": "todo",
            "title": "t",
            "content": "c"
        });
        assert!(serde_json::from_value::<NewMemory>(bad).is_err());
    }

    #[test]
    fn test_metadata_camel_case() {
        let meta = MemoryMetadata {
            files: Some(vec!["src/lib.rs".to_string()]),
            importance: Some(0.5),
            expires_at: Some(1_700_000_000_000),
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["expiresAt"], 1_700_000_000_000_i64);
    }

    #[test]
    fn test_embedding_text() {
        assert_eq!(
            sample().embedding_text(),
            "Use retries\n\nExponential backoff on 5xx"
        );
    }

    #[test]
    fn test_document_validates_embedding_length() {
        let err = MemoryDocument::new(sample(), vec![0.0; 3], 1).unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmbeddingDimension {
                expected: EMBEDDING_DIMENSIONS,
                actual: 3
            }
        );
        assert!(MemoryDocument::new(sample(), vec![0.0; EMBEDDING_DIMENSIONS], 1).is_ok());
    }

    #[test]
    fn test_document_validates_project() {
        let mut memory = sample();
        memory.project_id = " ".to_string();
        let err = MemoryDocument::new(memory, vec![0.0; EMBEDDING_DIMENSIONS], 1).unwrap_err();
        assert_eq!(err, ValidationError::EmptyProjectId);
    }

    #[test]
    fn test_into_record_keeps_fields() {
        let doc = MemoryDocument::new(sample(), vec![0.25; EMBEDDING_DIMENSIONS], 42).unwrap();
        let record = doc.into_record(MemoryId::new("m1"));
        assert_eq!(record.id.as_str(), "m1");
        assert_eq!(record.created_at, 42);
        assert_eq!(record.to_new_memory(), sample());
    }
}
