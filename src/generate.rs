//! Documentation runs from the CLI: full generation, applying a change
//! file, and syncing a directory against the content store.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use codescribe_core::changes::{diff_snapshot, settled_snapshot};
use codescribe_core::events::EventSink;
use codescribe_core::models::{ChangeReport, FileChange, GenerateReport, Repository};
use codescribe_core::reconcile::Reconciler;
use codescribe_core::store::{ContentSource, Store};
use codescribe_core::summarize::Summarizer;
use codescribe_core::synthesize::Synthesizer;

use crate::config::Config;
use crate::import::scan_directory;
use crate::sqlite_store::SqliteStore;
use crate::summarizer::create_summarizer;

/// Wire a [`Reconciler`] over the SQLite store with the configured
/// chunking, synthesis, filter and fingerprint settings.
pub fn build_reconciler(
    config: &Config,
    store: &SqliteStore,
    summarizer: Arc<dyn Summarizer>,
    events: Arc<dyn EventSink>,
) -> Result<Reconciler> {
    let synthesizer =
        Synthesizer::new(config.chunker()?, summarizer).with_config(&config.synthesis.synthesis);
    let store = Arc::new(store.clone());
    Ok(Reconciler::new(store.clone(), store, synthesizer)
        .with_events(events)
        .with_filter(config.filter.clone())
        .with_fingerprint_scope(config.synthesis.fingerprint_scope))
}

pub async fn find_repository(store: &SqliteStore, id_or_name: &str) -> Result<Repository> {
    store
        .find_repository(id_or_name)
        .await?
        .with_context(|| format!("repository not found: {}", id_or_name))
}

/// A change file: either a bare JSON array of changes or `{ "changes": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ChangeFile {
    Bare(Vec<FileChange>),
    Wrapped { changes: Vec<FileChange> },
}

pub fn parse_changes(json: &str) -> Result<Vec<FileChange>> {
    let parsed: ChangeFile = serde_json::from_str(json).context("Invalid change file")?;
    Ok(match parsed {
        ChangeFile::Bare(changes) | ChangeFile::Wrapped { changes } => changes,
    })
}

pub async fn run_generate(config: &Config, repo: &str, events: Arc<dyn EventSink>) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let repo = find_repository(&store, repo).await?;
    let summarizer = create_summarizer(&config.summarizer)?;
    let reconciler = build_reconciler(config, &store, summarizer, events)?;

    let report = reconciler.generate_all(&repo.id).await;
    print_generate_report(&repo, &report);
    store.close().await;

    if !report.success {
        bail!("{}", report.message);
    }
    Ok(())
}

pub async fn run_apply(
    config: &Config,
    repo: &str,
    changes_path: &Path,
    events: Arc<dyn EventSink>,
) -> Result<()> {
    let json = std::fs::read_to_string(changes_path)
        .with_context(|| format!("Failed to read change file: {}", changes_path.display()))?;
    let changes = parse_changes(&json)?;

    let store = SqliteStore::open(config).await?;
    let repo = find_repository(&store, repo).await?;
    let summarizer = create_summarizer(&config.summarizer)?;
    let reconciler = build_reconciler(config, &store, summarizer, events)?;

    let report = reconciler.apply_changes(&repo.id, &changes).await;
    print_change_report(&repo, &report);
    store.close().await;

    if !report.success {
        bail!("{}", report.message);
    }
    Ok(())
}

/// Diff a directory against the stored content, apply the difference, and
/// refresh the content store once the update has committed.
///
/// Files the update skipped keep their previous content-store entry, so the
/// next sync offers them again.
pub async fn run_sync(
    config: &Config,
    repo: &str,
    dir: &Path,
    events: Arc<dyn EventSink>,
) -> Result<()> {
    let current = scan_directory(dir, &config.filter)?;
    let store = SqliteStore::open(config).await?;
    let repo = find_repository(&store, repo).await?;

    let previous = store.list_files(&repo.id).await?;
    let changes = diff_snapshot(&previous, &current);
    if changes.is_empty() {
        println!("sync {}: no changes", repo.name);
        store.close().await;
        return Ok(());
    }

    let summarizer = create_summarizer(&config.summarizer)?;
    let reconciler = build_reconciler(config, &store, summarizer, events)?;
    let report = reconciler.apply_changes(&repo.id, &changes).await;
    print_change_report(&repo, &report);

    if !report.success {
        store.close().await;
        bail!("{}", report.message);
    }

    let settled = settled_snapshot(&previous, &current, &report.skipped_paths);
    store.replace_files(&repo.id, &settled).await?;
    store.close().await;
    Ok(())
}

fn print_generate_report(repo: &Repository, report: &GenerateReport) {
    println!("generate {}", repo.name);
    println!("  success:    {}", report.success);
    println!("  processed:  {}", report.processed_files);
    println!("  seconds:    {:.2}", report.total_time_seconds);
    println!("  message:    {}", report.message);
}

fn print_change_report(repo: &Repository, report: &ChangeReport) {
    println!("apply {}", repo.name);
    println!("  success:      {}", report.success);
    println!("  updated:      {} / {}", report.updated_files, report.total_changes);
    if let Some(root) = &report.fingerprint_root {
        println!("  fingerprint:  {}", root);
    }
    if !report.skipped_paths.is_empty() {
        println!("  skipped:      {}", report.skipped_paths.join(", "));
    }
    println!("  message:      {}", report.message);
}
