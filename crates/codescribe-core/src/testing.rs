//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::SummarizeError;
use crate::models::{FileDocument, Repository};
use crate::store::memory::InMemoryStore;
use crate::store::{Store, StoreTransaction};
use crate::summarize::Summarizer;

/// Summarizer that answers every call with a canned fragment, except for
/// scripted call indices that reply with a given text or fail.
#[derive(Default)]
pub struct ScriptedSummarizer {
    replies: HashMap<usize, Result<String, SummarizeError>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_call(mut self, call: usize, error: SummarizeError) -> Self {
        self.replies.insert(call, Err(error));
        self
    }

    pub fn reply_call(mut self, call: usize, text: &str) -> Self {
        self.replies.insert(call, Ok(text.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn summarize(&self, prompt: &str) -> Result<String, SummarizeError> {
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };
        match self.replies.get(&call) {
            Some(reply) => reply.clone(),
            None => Ok(format!("Fragment for call {}.", call)),
        }
    }
}

/// Store wrapper whose transactions fail when upserting one given path.
/// Everything else is delegated to the wrapped [`InMemoryStore`].
pub struct FailingStore {
    inner: InMemoryStore,
    fail_path: String,
    begun: Arc<AtomicUsize>,
}

impl FailingStore {
    pub fn new(inner: InMemoryStore, fail_path: &str) -> Self {
        Self {
            inner,
            fail_path: fail_path.to_string(),
            begun: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counts transactions opened through this store.
    pub fn begun(&self) -> Arc<AtomicUsize> {
        self.begun.clone()
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn create_repository(&self, name: &str) -> anyhow::Result<Repository> {
        self.inner.create_repository(name).await
    }

    async fn get_repository(&self, id: &str) -> anyhow::Result<Option<Repository>> {
        self.inner.get_repository(id).await
    }

    async fn find_repository(&self, id_or_name: &str) -> anyhow::Result<Option<Repository>> {
        self.inner.find_repository(id_or_name).await
    }

    async fn list_repositories(&self) -> anyhow::Result<Vec<Repository>> {
        self.inner.list_repositories().await
    }

    async fn get_document(
        &self,
        repository_id: &str,
        path: &str,
    ) -> anyhow::Result<Option<FileDocument>> {
        self.inner.get_document(repository_id, path).await
    }

    async fn list_documents(&self, repository_id: &str) -> anyhow::Result<Vec<FileDocument>> {
        self.inner.list_documents(repository_id).await
    }

    async fn upsert_document(&self, doc: &FileDocument) -> anyhow::Result<()> {
        if doc.file_path == self.fail_path {
            anyhow::bail!("disk full while writing {}", doc.file_path);
        }
        self.inner.upsert_document(doc).await
    }

    async fn set_repository_fingerprint(&self, repository_id: &str, root: &str) -> anyhow::Result<()> {
        self.inner.set_repository_fingerprint(repository_id, root).await
    }

    async fn begin(&self) -> anyhow::Result<Box<dyn StoreTransaction>> {
        self.begun.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FailingTransaction {
            inner: self.inner.begin().await?,
            fail_path: self.fail_path.clone(),
        }))
    }
}

struct FailingTransaction {
    inner: Box<dyn StoreTransaction>,
    fail_path: String,
}

#[async_trait]
impl StoreTransaction for FailingTransaction {
    async fn document_version(
        &mut self,
        repository_id: &str,
        path: &str,
    ) -> anyhow::Result<Option<i64>> {
        self.inner.document_version(repository_id, path).await
    }

    async fn upsert_document(&mut self, doc: &FileDocument) -> anyhow::Result<()> {
        if doc.file_path == self.fail_path {
            anyhow::bail!("disk full while writing {}", doc.file_path);
        }
        self.inner.upsert_document(doc).await
    }

    async fn delete_document(&mut self, repository_id: &str, path: &str) -> anyhow::Result<bool> {
        self.inner.delete_document(repository_id, path).await
    }

    async fn chunk_hashes_by_path(
        &mut self,
        repository_id: &str,
    ) -> anyhow::Result<Vec<(String, Vec<String>)>> {
        self.inner.chunk_hashes_by_path(repository_id).await
    }

    async fn set_repository_fingerprint(
        &mut self,
        repository_id: &str,
        root: &str,
    ) -> anyhow::Result<()> {
        self.inner.set_repository_fingerprint(repository_id, root).await
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        self.inner.commit().await
    }
}
