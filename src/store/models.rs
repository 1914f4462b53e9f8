use serde::{Deserialize, Serialize};

/// Typed metadata attached to every stored record.
///
/// The store only accepts and returns records of this shape; there is no
/// loosely-typed metadata path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Path relative to the indexed project root, forward slashes.
    pub file_path: String,
    /// File extension without the leading dot, or "none".
    pub file_type: String,
    /// Zero-based position within the file.
    #[serde(default)]
    pub chunk_index: usize,
    pub project_id: String,
    pub project_name: String,
    pub project_path: String,
    pub source_type: String,
    /// RFC 3339 timestamp, constant across one indexing run.
    pub indexed_at: String,
}

/// A persisted (id, document, metadata) triple.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// One ranked match from a similarity query, with the raw store distance.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub record: StoredRecord,
    pub distance: f64,
}

/// Equality filter over metadata fields. Empty means no filtering.
#[derive(Debug, Default, Clone)]
pub struct RecordFilter<'a> {
    pub project_id: Option<&'a str>,
    pub file_type: Option<&'a str>,
    pub file_path: Option<&'a str>,
}

impl RecordFilter<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.project_id.is_none() && self.file_type.is_none() && self.file_path.is_none()
    }
}
