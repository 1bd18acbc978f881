//! In-memory [`Store`] and [`ContentSource`] for tests and embedding.
//!
//! All state lives in `BTreeMap`s behind a `std::sync::RwLock`. A
//! transaction reads from a private snapshot and logs its writes; commit
//! replays that log onto the live state, so only the keys it wrote change
//! and concurrent transactions resolve last-write-wins per key.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::{FileDocument, Repository, SourceFile};

use super::{ContentSource, Store, StoreTransaction};

#[derive(Debug, Clone, Default)]
struct State {
    repositories: BTreeMap<String, Repository>,
    /// Keyed by `(repository_id, file_path)`.
    documents: BTreeMap<(String, String), FileDocument>,
    files: BTreeMap<String, Vec<SourceFile>>,
}

enum Write {
    Upsert(FileDocument),
    Delete { repository_id: String, path: String },
    Fingerprint { repository_id: String, root: String },
}

impl State {
    fn set_fingerprint(&mut self, repository_id: &str, root: &str) -> Result<()> {
        let repo = self
            .repositories
            .get_mut(repository_id)
            .ok_or_else(|| anyhow!("repository not found: {}", repository_id))?;
        repo.fingerprint_root = Some(root.to_string());
        repo.updated_at = Utc::now();
        Ok(())
    }

    fn apply(&mut self, write: Write) -> Result<()> {
        match write {
            Write::Upsert(doc) => {
                self.documents
                    .insert((doc.repository_id.clone(), doc.file_path.clone()), doc);
            }
            Write::Delete {
                repository_id,
                path,
            } => {
                self.documents.remove(&(repository_id, path));
            }
            Write::Fingerprint {
                repository_id,
                root,
            } => self.set_fingerprint(&repository_id, &root)?,
        }
        Ok(())
    }

    fn documents_of(&self, repository_id: &str) -> impl Iterator<Item = &FileDocument> {
        let repository_id = repository_id.to_string();
        self.documents
            .iter()
            .filter(move |((repo, _), _)| *repo == repository_id)
            .map(|(_, doc)| doc)
    }
}

/// In-memory store; cheap to clone, clones share state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| anyhow!("in-memory store lock poisoned"))
    }
}

#[async_trait]
impl ContentSource for InMemoryStore {
    async fn list_files(&self, repository_id: &str) -> Result<Vec<SourceFile>> {
        Ok(self.read()?.files.get(repository_id).cloned().unwrap_or_default())
    }

    async fn replace_files(&self, repository_id: &str, files: &[SourceFile]) -> Result<()> {
        self.write()?
            .files
            .insert(repository_id.to_string(), files.to_vec());
        Ok(())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_repository(&self, name: &str) -> Result<Repository> {
        let mut state = self.write()?;
        if let Some(existing) = state.repositories.values().find(|r| r.name == name) {
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let repo = Repository {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            fingerprint_root: None,
            created_at: now,
            updated_at: now,
        };
        state.repositories.insert(repo.id.clone(), repo.clone());
        Ok(repo)
    }

    async fn get_repository(&self, id: &str) -> Result<Option<Repository>> {
        Ok(self.read()?.repositories.get(id).cloned())
    }

    async fn find_repository(&self, id_or_name: &str) -> Result<Option<Repository>> {
        let state = self.read()?;
        Ok(state
            .repositories
            .get(id_or_name)
            .or_else(|| state.repositories.values().find(|r| r.name == id_or_name))
            .cloned())
    }

    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        let mut repos: Vec<Repository> = self.read()?.repositories.values().cloned().collect();
        repos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(repos)
    }

    async fn get_document(&self, repository_id: &str, path: &str) -> Result<Option<FileDocument>> {
        Ok(self
            .read()?
            .documents
            .get(&(repository_id.to_string(), path.to_string()))
            .cloned())
    }

    async fn list_documents(&self, repository_id: &str) -> Result<Vec<FileDocument>> {
        Ok(self.read()?.documents_of(repository_id).cloned().collect())
    }

    async fn upsert_document(&self, doc: &FileDocument) -> Result<()> {
        self.write()?.documents.insert(
            (doc.repository_id.clone(), doc.file_path.clone()),
            doc.clone(),
        );
        Ok(())
    }

    async fn set_repository_fingerprint(&self, repository_id: &str, root: &str) -> Result<()> {
        self.write()?.set_fingerprint(repository_id, root)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let staged = self.read()?.clone();
        Ok(Box::new(InMemoryTransaction {
            shared: self.state.clone(),
            staged,
            writes: Vec::new(),
        }))
    }
}

/// Transaction over an [`InMemoryStore`]: snapshot reads, logged writes.
pub struct InMemoryTransaction {
    shared: Arc<RwLock<State>>,
    staged: State,
    writes: Vec<Write>,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn document_version(&mut self, repository_id: &str, path: &str) -> Result<Option<i64>> {
        Ok(self
            .staged
            .documents
            .get(&(repository_id.to_string(), path.to_string()))
            .map(|doc| doc.version))
    }

    async fn upsert_document(&mut self, doc: &FileDocument) -> Result<()> {
        self.staged.documents.insert(
            (doc.repository_id.clone(), doc.file_path.clone()),
            doc.clone(),
        );
        self.writes.push(Write::Upsert(doc.clone()));
        Ok(())
    }

    async fn delete_document(&mut self, repository_id: &str, path: &str) -> Result<bool> {
        let existed = self
            .staged
            .documents
            .remove(&(repository_id.to_string(), path.to_string()))
            .is_some();
        self.writes.push(Write::Delete {
            repository_id: repository_id.to_string(),
            path: path.to_string(),
        });
        Ok(existed)
    }

    async fn chunk_hashes_by_path(
        &mut self,
        repository_id: &str,
    ) -> Result<Vec<(String, Vec<String>)>> {
        Ok(self
            .staged
            .documents_of(repository_id)
            .map(|doc| (doc.file_path.clone(), doc.chunk_hashes.clone()))
            .collect())
    }

    async fn set_repository_fingerprint(&mut self, repository_id: &str, root: &str) -> Result<()> {
        self.staged.set_fingerprint(repository_id, root)?;
        self.writes.push(Write::Fingerprint {
            repository_id: repository_id.to_string(),
            root: root.to_string(),
        });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTransaction { shared, writes, .. } = *self;
        let mut state = shared
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        let mut next = state.clone();
        for write in writes {
            next.apply(write)?;
        }
        *state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(repo: &str, path: &str, version: i64) -> FileDocument {
        FileDocument {
            repository_id: repo.to_string(),
            file_path: path.to_string(),
            content: format!("# Documentation for {}\n", path),
            fingerprint_root: "root".to_string(),
            chunk_hashes: vec!["h".to_string()],
            version,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_repository_is_idempotent_by_name() {
        let store = InMemoryStore::new();
        let a = store.create_repository("demo").await.unwrap();
        let b = store.create_repository("demo").await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(store.list_repositories().await.unwrap().len(), 1);
        assert_eq!(store.find_repository("demo").await.unwrap().unwrap().id, a.id);
        assert_eq!(store.find_repository(&a.id).await.unwrap().unwrap().name, "demo");
        assert!(store.find_repository("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_transaction_is_visible() {
        let store = InMemoryStore::new();
        let repo = store.create_repository("demo").await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.upsert_document(&doc(&repo.id, "a.py", 1)).await.unwrap();
        tx.set_repository_fingerprint(&repo.id, "abc").await.unwrap();
        assert!(store.get_document(&repo.id, "a.py").await.unwrap().is_none());
        tx.commit().await.unwrap();

        assert_eq!(store.get_document(&repo.id, "a.py").await.unwrap().unwrap().version, 1);
        let repo = store.get_repository(&repo.id).await.unwrap().unwrap();
        assert_eq!(repo.fingerprint_root.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = InMemoryStore::new();
        let repo = store.create_repository("demo").await.unwrap();
        store.upsert_document(&doc(&repo.id, "keep.py", 3)).await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            assert!(tx.delete_document(&repo.id, "keep.py").await.unwrap());
            tx.upsert_document(&doc(&repo.id, "new.py", 1)).await.unwrap();
        }

        assert!(store.get_document(&repo.id, "keep.py").await.unwrap().is_some());
        assert!(store.get_document(&repo.id, "new.py").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn chunk_hashes_ordered_by_path() {
        let store = InMemoryStore::new();
        let repo = store.create_repository("demo").await.unwrap();
        store.upsert_document(&doc(&repo.id, "b.py", 1)).await.unwrap();
        store.upsert_document(&doc(&repo.id, "a.py", 1)).await.unwrap();
        store.upsert_document(&doc("elsewhere", "c.py", 1)).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let paths: Vec<String> = tx
            .chunk_hashes_by_path(&repo.id)
            .await
            .unwrap()
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        assert_eq!(paths, vec!["a.py", "b.py"]);
    }

    #[tokio::test]
    async fn content_source_round_trip() {
        let store = InMemoryStore::new();
        store
            .replace_files("r1", &[SourceFile::new("a.py", "print(1)")])
            .await
            .unwrap();
        let files = store.list_files("r1").await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].size, 8);
        assert!(store.list_files("r2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_leaves_other_repositories_alone() {
        let store = InMemoryStore::new();
        let a = store.create_repository("a").await.unwrap();
        let b = store.create_repository("b").await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.upsert_document(&doc(&a.id, "a.py", 1)).await.unwrap();
        tx.set_repository_fingerprint(&a.id, "root-a").await.unwrap();

        store.upsert_document(&doc(&b.id, "b.py", 1)).await.unwrap();
        store.set_repository_fingerprint(&b.id, "root-b").await.unwrap();
        tx.commit().await.unwrap();

        assert!(store.get_document(&b.id, "b.py").await.unwrap().is_some());
        let b = store.get_repository(&b.id).await.unwrap().unwrap();
        assert_eq!(b.fingerprint_root.as_deref(), Some("root-b"));
        assert!(store.get_document(&a.id, "a.py").await.unwrap().is_some());
        let a = store.get_repository(&a.id).await.unwrap().unwrap();
        assert_eq!(a.fingerprint_root.as_deref(), Some("root-a"));
    }

    #[tokio::test]
    async fn commit_keeps_untouched_paths_of_same_repository() {
        let store = InMemoryStore::new();
        let repo = store.create_repository("demo").await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.delete_document(&repo.id, "old.py").await.unwrap();
        store.upsert_document(&doc(&repo.id, "other.py", 2)).await.unwrap();
        tx.commit().await.unwrap();

        let other = store.get_document(&repo.id, "other.py").await.unwrap().unwrap();
        assert_eq!(other.version, 2);
    }
}
