//! Document retrieval by repository and file path.
//!
//! Used by both the `scribe get` CLI command and
//! `GET /repositories/{repo}/documents?path=` HTTP endpoint.

use anyhow::{Context, Result};

use codescribe_core::models::FileDocument;
use codescribe_core::store::Store;

use crate::config::Config;
use crate::generate::find_repository;
use crate::sqlite_store::SqliteStore;

/// Fetch one file's documentation.
pub async fn get_document(store: &SqliteStore, repo: &str, path: &str) -> Result<FileDocument> {
    let repository = find_repository(store, repo).await?;
    store
        .get_document(&repository.id, path)
        .await?
        .with_context(|| format!("document not found: {} in {}", path, repository.name))
}

/// CLI entry point: print metadata then the Markdown body to stdout.
pub async fn run_get(config: &Config, repo: &str, path: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let result = get_document(&store, repo, path).await;
    store.close().await;
    let doc = result?;

    println!("--- Document ---");
    println!("path:         {}", doc.file_path);
    println!("version:      {}", doc.version);
    println!("fingerprint:  {}", doc.fingerprint_root);
    println!("chunks:       {}", doc.chunk_hashes.len());
    println!("updated_at:   {}", doc.updated_at.format("%Y-%m-%dT%H:%M:%SZ"));
    println!();
    println!("{}", doc.content);

    Ok(())
}
