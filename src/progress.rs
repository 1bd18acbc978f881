//! Generation progress reporting.
//!
//! Pipeline [`ProgressEvent`]s are rendered on **stderr** so stdout stays
//! parseable for scripts: either as human-readable lines or as one JSON
//! object per line. Writes are best-effort; a closed stderr never fails a run.

use std::io::Write;
use std::sync::Arc;

use codescribe_core::events::{EventKind, EventSink, NoEvents, ProgressEvent};

/// Human-friendly progress on stderr: `scribe  documented  3 / 12  src/app.py`.
pub struct StderrProgress;

impl EventSink for StderrProgress {
    fn emit(&self, event: ProgressEvent) {
        let line = human_line(&event);
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", line);
        let _ = stderr.flush();
    }
}

fn human_line(event: &ProgressEvent) -> String {
    let counts = format!(
        "{} / {}",
        format_number(event.processed as u64),
        format_number(event.total as u64)
    );
    let path = event.path.as_deref().unwrap_or("");
    match event.kind {
        EventKind::Started => format!("scribe  starting  {} files", format_number(event.total as u64)),
        EventKind::FileProcessed => format!("scribe  documented  {}  {}", counts, path),
        EventKind::FileRemoved => format!("scribe  removed  {}  {}", counts, path),
        EventKind::FileSkipped | EventKind::FileFailed => format!(
            "scribe  skipped  {}  {}: {}",
            counts,
            path,
            event.detail.as_deref().unwrap_or("unknown error")
        ),
        EventKind::Completed => match &event.detail {
            Some(error) => format!("scribe  failed  {}", error),
            None => format!("scribe  done  {}", counts),
        },
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
///
/// Generated document text is left out; failure details are kept.
pub struct JsonProgress;

impl EventSink for JsonProgress {
    fn emit(&self, event: ProgressEvent) {
        if let Ok(line) = serde_json::to_string(&json_event(&event)) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

fn json_event(event: &ProgressEvent) -> serde_json::Value {
    let mut obj = serde_json::json!({
        "event": "progress",
        "kind": event.kind,
        "repository": event.repository_id,
        "processed": event.processed,
        "total": event.total,
        "timestamp": event.timestamp.to_rfc3339(),
    });
    if let Some(path) = &event.path {
        obj["path"] = serde_json::json!(path);
    }
    if event.kind != EventKind::FileProcessed {
        if let Some(detail) = &event.detail {
            obj["error"] = serde_json::json!(detail);
        }
    }
    obj
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn sink(&self) -> Arc<dyn EventSink> {
        match self {
            ProgressMode::Off => Arc::new(NoEvents),
            ProgressMode::Human => Arc::new(StderrProgress),
            ProgressMode::Json => Arc::new(JsonProgress),
        }
    }
}
