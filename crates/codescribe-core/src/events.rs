//! Progress events emitted while documenting a repository.
//!
//! The pipeline reports through an injected [`EventSink`]. Delivery is
//! best-effort: a sink must never fail or block the pipeline, and nothing
//! depends on an event being observed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Started,
    FileProcessed,
    FileFailed,
    FileRemoved,
    FileSkipped,
    Completed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub kind: EventKind,
    pub repository_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Generated document for processed files, error text for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub processed: usize,
    pub total: usize,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(kind: EventKind, repository_id: &str, processed: usize, total: usize) -> Self {
        Self {
            kind,
            repository_id: repository_id.to_string(),
            path: None,
            detail: None,
            processed,
            total,
            timestamp: Utc::now(),
        }
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Receives progress events. Implementations write to stderr, a channel,
/// or nowhere.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Discards every event.
pub struct NoEvents;

impl EventSink for NoEvents {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Keeps every event in memory, in emission order.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(|e| e.kind).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
