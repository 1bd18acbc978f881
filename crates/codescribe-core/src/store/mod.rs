//! Storage abstraction for codescribe.
//!
//! Two collaborators sit behind traits so the pipeline can run against
//! SQLite, memory, or anything else:
//!
//! - [`ContentSource`]: the content store holding each repository's raw
//!   files.
//! - [`Store`]: the persistence adapter that owns repositories, per-file
//!   documentation, and repository fingerprints.
//!
//! Incremental updates run inside a [`StoreTransaction`]. Dropping a
//! transaction without calling [`commit`](StoreTransaction::commit) rolls
//! back everything written through it.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{FileDocument, Repository, SourceFile};

/// The content store: current files of each repository.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// All files currently recorded for a repository.
    async fn list_files(&self, repository_id: &str) -> Result<Vec<SourceFile>>;

    /// Replace the recorded file set of a repository.
    async fn replace_files(&self, repository_id: &str, files: &[SourceFile]) -> Result<()>;
}

/// Durable state keyed by `(repository, file path)`.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`create_repository`](Store::create_repository) | Register a repository (or return the existing one) |
/// | [`find_repository`](Store::find_repository) | Look up a repository by id or name |
/// | [`get_document`](Store::get_document) | Read one file's documentation |
/// | [`upsert_document`](Store::upsert_document) | Insert or replace one file's documentation |
/// | [`set_repository_fingerprint`](Store::set_repository_fingerprint) | Store the repository-level root |
/// | [`begin`](Store::begin) | Open a transaction for an incremental batch |
#[async_trait]
pub trait Store: Send + Sync {
    /// Register a repository by name; returns the existing record if the
    /// name is taken.
    async fn create_repository(&self, name: &str) -> Result<Repository>;

    async fn get_repository(&self, id: &str) -> Result<Option<Repository>>;

    /// Look up a repository by id, falling back to its name.
    async fn find_repository(&self, id_or_name: &str) -> Result<Option<Repository>>;

    async fn list_repositories(&self) -> Result<Vec<Repository>>;

    async fn get_document(&self, repository_id: &str, path: &str) -> Result<Option<FileDocument>>;

    /// All documents of a repository, ordered by path.
    async fn list_documents(&self, repository_id: &str) -> Result<Vec<FileDocument>>;

    async fn upsert_document(&self, doc: &FileDocument) -> Result<()>;

    async fn set_repository_fingerprint(&self, repository_id: &str, root: &str) -> Result<()>;

    /// Open a transaction scoped to one incremental batch.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// Writes staged for one atomic incremental batch.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Stored version of a document, if it exists.
    async fn document_version(&mut self, repository_id: &str, path: &str) -> Result<Option<i64>>;

    async fn upsert_document(&mut self, doc: &FileDocument) -> Result<()>;

    /// Delete a document; returns whether a row existed.
    async fn delete_document(&mut self, repository_id: &str, path: &str) -> Result<bool>;

    /// `(path, chunk_hashes)` of every document as seen by this
    /// transaction, ordered by path.
    async fn chunk_hashes_by_path(&mut self, repository_id: &str)
        -> Result<Vec<(String, Vec<String>)>>;

    async fn set_repository_fingerprint(&mut self, repository_id: &str, root: &str) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
