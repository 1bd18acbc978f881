//! Reconciliation engine: keeps per-file documentation in step with a
//! repository's content.
//!
//! Two entry points:
//!
//! - [`Reconciler::generate_all`] documents every file in the content
//!   store. Files are independent: one failing file is logged and skipped,
//!   the rest carry on.
//! - [`Reconciler::apply_changes`] applies a batch of file-level changes
//!   inside a single store transaction. Any persistence failure rolls back
//!   the whole batch.
//!
//! Both paths bump document versions (`previous + 1`, starting at 1) and
//! persist a repository-level fingerprint over the chunk hashes they saw.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, ScribeError};
use crate::events::{EventKind, EventSink, NoEvents, ProgressEvent};
use crate::filter::FilterConfig;
use crate::fingerprint::{fingerprint, tree_root, Fingerprint};
use crate::models::{
    ChangeAction, ChangeReport, FileChange, FileDocument, GenerateReport, Repository, SourceFile,
};
use crate::store::{ContentSource, Store};
use crate::synthesize::Synthesizer;

/// Which chunk hashes feed the repository fingerprint after an
/// incremental update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintScope {
    /// Hashes of the files in the applied batch, in batch order.
    #[default]
    Batch,
    /// Hashes of every stored document after the batch, ordered by path.
    Repository,
}

/// A change resolved ahead of the write transaction.
enum Step<'a> {
    Remove {
        path: &'a str,
    },
    Skip {
        path: &'a str,
        kind: EventKind,
        detail: String,
    },
    Write {
        change: &'a FileChange,
        document: String,
        fp: Fingerprint,
    },
}

struct Applied {
    updated: usize,
    root: String,
    skipped: Vec<String>,
}

pub struct Reconciler {
    store: Arc<dyn Store>,
    content: Arc<dyn ContentSource>,
    synthesizer: Synthesizer,
    events: Arc<dyn EventSink>,
    filter: FilterConfig,
    scope: FingerprintScope,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn Store>,
        content: Arc<dyn ContentSource>,
        synthesizer: Synthesizer,
    ) -> Self {
        Self {
            store,
            content,
            synthesizer,
            events: Arc::new(NoEvents),
            filter: FilterConfig::default(),
            scope: FingerprintScope::default(),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_fingerprint_scope(mut self, scope: FingerprintScope) -> Self {
        self.scope = scope;
        self
    }

    /// Document every file of a repository.
    ///
    /// Never returns an error: an unknown repository or a store failure
    /// before processing starts yields `success: false`.
    pub async fn generate_all(&self, repository_id: &str) -> GenerateReport {
        let started = Instant::now();
        match self.try_generate_all(repository_id, started).await {
            Ok(report) => report,
            Err(e) => {
                warn!(repository = repository_id, error = %e, "full generation failed");
                GenerateReport {
                    success: false,
                    message: e.to_string(),
                    processed_files: 0,
                    total_time_seconds: started.elapsed().as_secs_f64(),
                }
            }
        }
    }

    async fn try_generate_all(
        &self,
        repository_id: &str,
        started: Instant,
    ) -> Result<GenerateReport> {
        let repo = self.repository(repository_id).await?;
        let files: Vec<SourceFile> = self
            .content
            .list_files(&repo.id)
            .await?
            .into_iter()
            .filter(|f| self.filter.accepts(&f.path))
            .collect();

        if files.is_empty() {
            info!(repository = %repo.name, "no files to process");
            return Ok(GenerateReport {
                success: true,
                message: "No files to process".to_string(),
                processed_files: 0,
                total_time_seconds: started.elapsed().as_secs_f64(),
            });
        }

        let total = files.len();
        info!(repository = %repo.name, files = total, "generating documentation");
        self.emit(ProgressEvent::new(EventKind::Started, &repo.id, 0, total));

        let mut processed = 0;
        let mut repository_hashes: Vec<String> = Vec::new();

        for file in &files {
            match self.generate_file(&repo.id, file).await {
                Ok(doc) => {
                    processed += 1;
                    repository_hashes.extend(doc.chunk_hashes.iter().cloned());
                    debug!(path = %file.path, version = doc.version, "documented");
                    self.emit(
                        ProgressEvent::new(EventKind::FileProcessed, &repo.id, processed, total)
                            .with_path(&file.path)
                            .with_detail(doc.content),
                    );
                }
                Err(e) => {
                    warn!(path = %file.path, error = %e, "skipping file");
                    self.emit(
                        ProgressEvent::new(EventKind::FileFailed, &repo.id, processed, total)
                            .with_path(&file.path)
                            .with_detail(e.to_string()),
                    );
                }
            }
        }

        if processed > 0 {
            let root = tree_root(&repository_hashes);
            if let Err(e) = self.store.set_repository_fingerprint(&repo.id, &root).await {
                warn!(repository = %repo.name, error = %e, "could not store repository fingerprint");
            }
        }

        let elapsed = started.elapsed().as_secs_f64();
        info!(
            repository = %repo.name,
            processed,
            total,
            seconds = elapsed,
            "full generation finished"
        );
        self.emit(ProgressEvent::new(EventKind::Completed, &repo.id, processed, total));

        Ok(GenerateReport {
            success: true,
            message: format!("Generated documentation for {} of {} files", processed, total),
            processed_files: processed,
            total_time_seconds: elapsed,
        })
    }

    async fn generate_file(&self, repository_id: &str, file: &SourceFile) -> Result<FileDocument> {
        let chunks = self.synthesizer.chunker().split(&file.content);
        let fp = fingerprint(&chunks);
        let content = self
            .synthesizer
            .synthesize_chunks(&file.path, &file.content, &chunks)
            .await?;

        let previous = self
            .store
            .get_document(repository_id, &file.path)
            .await?
            .map(|d| d.version)
            .unwrap_or(0);

        let doc = FileDocument {
            repository_id: repository_id.to_string(),
            file_path: file.path.clone(),
            content,
            fingerprint_root: fp.root,
            chunk_hashes: fp.hashes,
            version: previous + 1,
            updated_at: Utc::now(),
        };
        self.store.upsert_document(&doc).await?;
        Ok(doc)
    }

    /// Apply a batch of file changes atomically.
    ///
    /// Removals count as updates whether or not a document existed.
    /// Additions or modifications without content are skipped with a
    /// warning. A file whose summarizer is unavailable is skipped but its
    /// chunk hashes still feed the batch fingerprint. Skipped paths are
    /// listed in the report. A persistence failure anywhere rolls back
    /// every write of the batch and reports `success: false` with zero
    /// updated files.
    pub async fn apply_changes(&self, repository_id: &str, changes: &[FileChange]) -> ChangeReport {
        let total = changes.len();
        match self.try_apply_changes(repository_id, changes).await {
            Ok(applied) => ChangeReport {
                success: true,
                updated_files: applied.updated,
                total_changes: total,
                message: format!("Applied {} of {} changes", applied.updated, total),
                fingerprint_root: Some(applied.root),
                skipped_paths: applied.skipped,
            },
            Err(e) => {
                warn!(repository = repository_id, error = %e, "incremental update rolled back");
                self.emit(
                    ProgressEvent::new(EventKind::Completed, repository_id, 0, total)
                        .with_detail(e.to_string()),
                );
                ChangeReport {
                    success: false,
                    updated_files: 0,
                    total_changes: total,
                    message: format!("Incremental update failed, no changes applied: {}", e),
                    fingerprint_root: None,
                    skipped_paths: Vec::new(),
                }
            }
        }
    }

    async fn try_apply_changes(&self, repository_id: &str, changes: &[FileChange]) -> Result<Applied> {
        let repo = self.repository(repository_id).await?;
        let total = changes.len();
        info!(repository = %repo.name, changes = total, "applying incremental update");

        // Every summarizer call happens here, before the transaction opens.
        let mut batch_hashes: Vec<String> = Vec::new();
        let mut steps = Vec::with_capacity(total);
        for change in changes {
            steps.push(self.prepare(change, &mut batch_hashes).await);
        }

        // Held back until commit so listeners never see rolled-back work.
        let mut pending = vec![ProgressEvent::new(EventKind::Started, &repo.id, 0, total)];
        let mut updated = 0;
        let mut skipped = Vec::new();

        let mut tx = self.store.begin().await?;

        for step in steps {
            match step {
                Step::Remove { path } => {
                    let existed = tx.delete_document(&repo.id, path).await?;
                    updated += 1;
                    debug!(path, existed, "removed");
                    let mut event =
                        ProgressEvent::new(EventKind::FileRemoved, &repo.id, updated, total)
                            .with_path(path);
                    if !existed {
                        event = event.with_detail("no stored document");
                    }
                    pending.push(event);
                }
                Step::Skip { path, kind, detail } => {
                    skipped.push(path.to_string());
                    pending.push(
                        ProgressEvent::new(kind, &repo.id, updated, total)
                            .with_path(path)
                            .with_detail(detail),
                    );
                }
                Step::Write {
                    change,
                    document,
                    fp,
                } => {
                    let previous = tx.document_version(&repo.id, &change.path).await?;
                    let doc = FileDocument {
                        repository_id: repo.id.clone(),
                        file_path: change.path.clone(),
                        content: document,
                        fingerprint_root: fp.root,
                        chunk_hashes: fp.hashes,
                        version: previous.unwrap_or(0) + 1,
                        updated_at: Utc::now(),
                    };
                    tx.upsert_document(&doc).await?;
                    updated += 1;
                    debug!(path = %change.path, version = doc.version, action = change.action.as_str(), "documented");
                    pending.push(
                        ProgressEvent::new(EventKind::FileProcessed, &repo.id, updated, total)
                            .with_path(&change.path)
                            .with_detail(doc.content),
                    );
                }
            }
        }

        let root = match self.scope {
            FingerprintScope::Batch => tree_root(&batch_hashes),
            FingerprintScope::Repository => {
                let stored: Vec<String> = tx
                    .chunk_hashes_by_path(&repo.id)
                    .await?
                    .into_iter()
                    .flat_map(|(_, hashes)| hashes)
                    .collect();
                tree_root(&stored)
            }
        };
        tx.set_repository_fingerprint(&repo.id, &root).await?;
        tx.commit().await?;

        info!(repository = %repo.name, updated, total, root = %root, "incremental update committed");
        pending.push(ProgressEvent::new(EventKind::Completed, &repo.id, updated, total));
        for event in pending {
            self.emit(event);
        }

        Ok(Applied {
            updated,
            root,
            skipped,
        })
    }

    /// Chunk, hash and summarize one change. Never touches the store.
    async fn prepare<'a>(&self, change: &'a FileChange, batch_hashes: &mut Vec<String>) -> Step<'a> {
        let content = match (change.action, change.content.as_deref()) {
            (ChangeAction::Removed, _) => return Step::Remove { path: &change.path },
            (_, Some(content)) => content,
            (_, None) => {
                let e = ScribeError::MissingContent(change.path.clone());
                warn!(action = change.action.as_str(), "{}", e);
                return Step::Skip {
                    path: &change.path,
                    kind: EventKind::FileSkipped,
                    detail: e.to_string(),
                };
            }
        };

        let chunks = self.synthesizer.chunker().split(content);
        let fp = fingerprint(&chunks);
        batch_hashes.extend(fp.hashes.iter().cloned());

        match self
            .synthesizer
            .synthesize_chunks(&change.path, content, &chunks)
            .await
        {
            Ok(document) => Step::Write {
                change,
                document,
                fp,
            },
            Err(e) => {
                warn!(path = %change.path, error = %e, "skipping file");
                Step::Skip {
                    path: &change.path,
                    kind: EventKind::FileFailed,
                    detail: e.to_string(),
                }
            }
        }
    }

    async fn repository(&self, repository_id: &str) -> Result<Repository> {
        self.store
            .get_repository(repository_id)
            .await?
            .ok_or_else(|| ScribeError::NotFound(repository_id.to_string()))
    }

    fn emit(&self, event: ProgressEvent) {
        self.events.emit(event);
    }
}
