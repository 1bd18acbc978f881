//! Core data models shared by the pipeline, the stores, and the outer
//! surfaces (CLI, HTTP API).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered code repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub id: String,
    pub name: String,
    /// Root of the most recently persisted repository-level fingerprint.
    pub fingerprint_root: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A file as recorded in the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Repository-relative path using `/` separators.
    pub path: String,
    pub content: String,
    pub size: u64,
    /// Hex SHA-256 of `content`.
    pub sha: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            path: path.into(),
            size: content.len() as u64,
            sha: crate::fingerprint::hash_text(&content),
            content,
        }
    }
}

/// Persisted documentation for one `(repository, file path)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDocument {
    pub repository_id: String,
    pub file_path: String,
    /// Markdown documentation text.
    pub content: String,
    pub fingerprint_root: String,
    /// Ordered chunk hashes; order matches chunk index order.
    pub chunk_hashes: Vec<String>,
    /// Starts at 1, incremented on every successful regeneration.
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Added,
    Modified,
    Removed,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Added => "added",
            ChangeAction::Modified => "modified",
            ChangeAction::Removed => "removed",
        }
    }
}

/// One file-level change in an incremental batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub action: ChangeAction,
    /// Required unless `action` is [`ChangeAction::Removed`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FileChange {
    pub fn added(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            action: ChangeAction::Added,
            content: Some(content.into()),
        }
    }

    pub fn modified(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            action: ChangeAction::Modified,
            content: Some(content.into()),
        }
    }

    pub fn removed(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            action: ChangeAction::Removed,
            content: None,
        }
    }
}

/// Result of a full generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReport {
    pub success: bool,
    pub message: String,
    pub processed_files: usize,
    pub total_time_seconds: f64,
}

/// Result of an incremental update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReport {
    pub success: bool,
    pub updated_files: usize,
    pub total_changes: usize,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint_root: Option<String>,
    /// Added or modified paths left undocumented by a committed batch.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_paths: Vec<String>,
}
