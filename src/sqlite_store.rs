//! SQLite implementation of the core [`Store`] and [`ContentSource`] traits.
//!
//! Timestamps are stored as Unix seconds, chunk hashes as a JSON array.
//! A [`SqliteTransaction`] wraps a `sqlx` transaction: dropping it without
//! [`commit`](StoreTransaction::commit) rolls back.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use codescribe_core::models::{FileDocument, Repository, SourceFile};
use codescribe_core::store::{ContentSource, Store, StoreTransaction};

use crate::config::Config;
use crate::db;

const REPOSITORY_COLUMNS: &str = "id, name, fingerprint_root, created_at, updated_at";
const DOCUMENT_COLUMNS: &str =
    "repository_id, file_path, content, fingerprint_root, chunk_hashes, version, updated_at";

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the database named in `config`. Run `scribe init` first.
    pub async fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn repository_where(&self, column: &str, value: &str) -> Result<Option<Repository>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM repositories WHERE {} = ?",
            REPOSITORY_COLUMNS, column
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(repository_from_row))
    }
}

fn from_ts(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

fn repository_from_row(row: &SqliteRow) -> Repository {
    Repository {
        id: row.get("id"),
        name: row.get("name"),
        fingerprint_root: row.get("fingerprint_root"),
        created_at: from_ts(row.get("created_at")),
        updated_at: from_ts(row.get("updated_at")),
    }
}

fn document_from_row(row: &SqliteRow) -> Result<FileDocument> {
    let file_path: String = row.get("file_path");
    let hashes_json: String = row.get("chunk_hashes");
    let chunk_hashes: Vec<String> = serde_json::from_str(&hashes_json)
        .with_context(|| format!("corrupt chunk_hashes for {}", file_path))?;
    Ok(FileDocument {
        repository_id: row.get("repository_id"),
        file_path,
        content: row.get("content"),
        fingerprint_root: row.get("fingerprint_root"),
        chunk_hashes,
        version: row.get("version"),
        updated_at: from_ts(row.get("updated_at")),
    })
}

async fn upsert_document_with<'e, E>(executor: E, doc: &FileDocument) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let hashes_json = serde_json::to_string(&doc.chunk_hashes)?;
    sqlx::query(
        r#"
        INSERT INTO file_documents
            (id, repository_id, file_path, content, fingerprint_root, chunk_hashes, version, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(repository_id, file_path) DO UPDATE SET
            content = excluded.content,
            fingerprint_root = excluded.fingerprint_root,
            chunk_hashes = excluded.chunk_hashes,
            version = excluded.version,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&doc.repository_id)
    .bind(&doc.file_path)
    .bind(&doc.content)
    .bind(&doc.fingerprint_root)
    .bind(&hashes_json)
    .bind(doc.version)
    .bind(doc.updated_at.timestamp())
    .execute(executor)
    .await?;
    Ok(())
}

async fn set_fingerprint_with<'e, E>(executor: E, repository_id: &str, root: &str) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE repositories SET fingerprint_root = ?, updated_at = ? WHERE id = ?",
    )
    .bind(root)
    .bind(Utc::now().timestamp())
    .bind(repository_id)
    .execute(executor)
    .await?;
    if result.rows_affected() == 0 {
        bail!("repository not found: {}", repository_id);
    }
    Ok(())
}

#[async_trait]
impl ContentSource for SqliteStore {
    async fn list_files(&self, repository_id: &str) -> Result<Vec<SourceFile>> {
        let rows = sqlx::query(
            "SELECT path, content, size, sha FROM repository_files WHERE repository_id = ? ORDER BY path",
        )
        .bind(repository_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| SourceFile {
                path: row.get("path"),
                content: row.get("content"),
                size: row.get::<i64, _>("size") as u64,
                sha: row.get("sha"),
            })
            .collect())
    }

    async fn replace_files(&self, repository_id: &str, files: &[SourceFile]) -> Result<()> {
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM repository_files WHERE repository_id = ?")
            .bind(repository_id)
            .execute(&mut *tx)
            .await?;

        for file in files {
            sqlx::query(
                "INSERT INTO repository_files (repository_id, path, content, size, sha, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(repository_id)
            .bind(&file.path)
            .bind(&file.content)
            .bind(file.size as i64)
            .bind(&file.sha)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn create_repository(&self, name: &str) -> Result<Repository> {
        let now = Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO repositories (id, name, fingerprint_root, created_at, updated_at) VALUES (?, ?, NULL, ?, ?) ON CONFLICT(name) DO NOTHING",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.repository_where("name", name)
            .await?
            .with_context(|| format!("repository {} vanished after insert", name))
    }

    async fn get_repository(&self, id: &str) -> Result<Option<Repository>> {
        self.repository_where("id", id).await
    }

    async fn find_repository(&self, id_or_name: &str) -> Result<Option<Repository>> {
        match self.repository_where("id", id_or_name).await? {
            Some(repo) => Ok(Some(repo)),
            None => self.repository_where("name", id_or_name).await,
        }
    }

    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM repositories ORDER BY name",
            REPOSITORY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(repository_from_row).collect())
    }

    async fn get_document(&self, repository_id: &str, path: &str) -> Result<Option<FileDocument>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM file_documents WHERE repository_id = ? AND file_path = ?",
            DOCUMENT_COLUMNS
        ))
        .bind(repository_id)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(document_from_row).transpose()
    }

    async fn list_documents(&self, repository_id: &str) -> Result<Vec<FileDocument>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM file_documents WHERE repository_id = ? ORDER BY file_path",
            DOCUMENT_COLUMNS
        ))
        .bind(repository_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(document_from_row).collect()
    }

    async fn upsert_document(&self, doc: &FileDocument) -> Result<()> {
        upsert_document_with(&self.pool, doc).await
    }

    async fn set_repository_fingerprint(&self, repository_id: &str, root: &str) -> Result<()> {
        set_fingerprint_with(&self.pool, repository_id, root).await
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteTransaction { tx }))
    }
}

pub struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl StoreTransaction for SqliteTransaction {
    async fn document_version(&mut self, repository_id: &str, path: &str) -> Result<Option<i64>> {
        let version: Option<i64> = sqlx::query_scalar(
            "SELECT version FROM file_documents WHERE repository_id = ? AND file_path = ?",
        )
        .bind(repository_id)
        .bind(path)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(version)
    }

    async fn upsert_document(&mut self, doc: &FileDocument) -> Result<()> {
        upsert_document_with(&mut *self.tx, doc).await
    }

    async fn delete_document(&mut self, repository_id: &str, path: &str) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM file_documents WHERE repository_id = ? AND file_path = ?")
                .bind(repository_id)
                .bind(path)
                .execute(&mut *self.tx)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn chunk_hashes_by_path(
        &mut self,
        repository_id: &str,
    ) -> Result<Vec<(String, Vec<String>)>> {
        let rows = sqlx::query(
            "SELECT file_path, chunk_hashes FROM file_documents WHERE repository_id = ? ORDER BY file_path",
        )
        .bind(repository_id)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter()
            .map(|row| {
                let path: String = row.get("file_path");
                let json: String = row.get("chunk_hashes");
                let hashes: Vec<String> = serde_json::from_str(&json)
                    .with_context(|| format!("corrupt chunk_hashes for {}", path))?;
                Ok((path, hashes))
            })
            .collect()
    }

    async fn set_repository_fingerprint(&mut self, repository_id: &str, root: &str) -> Result<()> {
        set_fingerprint_with(&mut *self.tx, repository_id, root).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
