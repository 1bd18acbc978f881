//! Directory import into the content store.
//!
//! Walks a directory, keeps the files the [`FilterConfig`] accepts, and
//! records them (path, content, size, SHA-256) as the repository's current
//! file set. Ignored directories are pruned without being descended into;
//! files that are not valid UTF-8 are skipped.

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use codescribe_core::filter::FilterConfig;
use codescribe_core::models::SourceFile;
use codescribe_core::store::{ContentSource, Store};

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// Scan `root` and return accepted files sorted by relative path.
///
/// Paths are relative to `root` and always use `/` separators.
pub fn scan_directory(root: &Path, filter: &FilterConfig) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        bail!("Import root is not a directory: {}", root.display());
    }

    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_ignored_dir(entry, filter));

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let rel_str = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if !filter.accepts(&rel_str) {
            continue;
        }

        let bytes = std::fs::read(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        match String::from_utf8(bytes) {
            Ok(content) => files.push(SourceFile::new(rel_str, content)),
            Err(_) => debug!(path = %rel_str, "skipping non-UTF-8 file"),
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn is_ignored_dir(entry: &DirEntry, filter: &FilterConfig) -> bool {
    entry.file_type().is_dir()
        && filter.is_ignored(&entry.file_name().to_string_lossy())
}

/// Register (or refresh) a repository from a directory.
pub async fn run_import(config: &Config, name: &str, dir: &Path) -> Result<()> {
    let files = scan_directory(dir, &config.filter)?;
    let store = SqliteStore::open(config).await?;

    let repo = store.create_repository(name).await?;
    store.replace_files(&repo.id, &files).await?;
    info!(repository = %repo.name, files = files.len(), "content store refreshed");

    let total_bytes: u64 = files.iter().map(|f| f.size).sum();
    println!("import {}", repo.name);
    println!("  id:     {}", repo.id);
    println!("  root:   {}", dir.display());
    println!("  files:  {}", files.len());
    println!("  bytes:  {}", total_bytes);

    store.close().await;
    Ok(())
}
