//! Idempotent schema setup for the SQLite store.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create every table and index if missing.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS repositories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            fingerprint_root TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Content store: the current files of each repository.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS repository_files (
            repository_id TEXT NOT NULL,
            path TEXT NOT NULL,
            content TEXT NOT NULL,
            size INTEGER NOT NULL,
            sha TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (repository_id, path),
            FOREIGN KEY (repository_id) REFERENCES repositories(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS file_documents (
            id TEXT PRIMARY KEY,
            repository_id TEXT NOT NULL,
            file_path TEXT NOT NULL,
            content TEXT NOT NULL,
            fingerprint_root TEXT NOT NULL,
            chunk_hashes TEXT NOT NULL DEFAULT '[]',
            version INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE(repository_id, file_path),
            FOREIGN KEY (repository_id) REFERENCES repositories(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_file_documents_repository ON file_documents(repository_id, file_path)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
