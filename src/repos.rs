//! Repository overview.
//!
//! Lists registered repositories with their content-store and document
//! counts so `scribe repos` shows at a glance what has been documented.

use anyhow::Result;
use serde::Serialize;
use sqlx::Row;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySummary {
    pub id: String,
    pub name: String,
    pub fingerprint_root: Option<String>,
    pub files: i64,
    pub documents: i64,
    pub updated_at: i64,
}

pub async fn list_repositories(store: &SqliteStore) -> Result<Vec<RepositorySummary>> {
    let rows = sqlx::query(
        r#"
        SELECT
            r.id,
            r.name,
            r.fingerprint_root,
            r.updated_at,
            (SELECT COUNT(*) FROM repository_files f WHERE f.repository_id = r.id) AS files,
            (SELECT COUNT(*) FROM file_documents d WHERE d.repository_id = r.id) AS documents
        FROM repositories r
        ORDER BY r.name
        "#,
    )
    .fetch_all(store.pool())
    .await?;

    Ok(rows
        .iter()
        .map(|row| RepositorySummary {
            id: row.get("id"),
            name: row.get("name"),
            fingerprint_root: row.get("fingerprint_root"),
            files: row.get("files"),
            documents: row.get("documents"),
            updated_at: row.get("updated_at"),
        })
        .collect())
}

pub async fn run_repos(config: &Config) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let repos = list_repositories(&store).await?;
    store.close().await;

    if repos.is_empty() {
        println!("No repositories. Run `scribe import <name> <dir>` first.");
        return Ok(());
    }

    println!(
        "  {:<24} {:>7} {:>9}  {:<16}  UPDATED",
        "NAME", "FILES", "DOCUMENTS", "FINGERPRINT"
    );
    for repo in &repos {
        let fingerprint = repo
            .fingerprint_root
            .as_deref()
            .map(|root| root.chars().take(16).collect::<String>())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<24} {:>7} {:>9}  {:<16}  {}",
            repo.name,
            repo.files,
            repo.documents,
            fingerprint,
            format_ts(repo.updated_at)
        );
    }

    Ok(())
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
