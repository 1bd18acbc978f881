//! HTTP API against a live router on an ephemeral port.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;

use codescribe::config::parse_config;
use codescribe::db::connect_path;
use codescribe::generate::build_reconciler;
use codescribe::migrate::migrate_pool;
use codescribe::server::{build_router, AppState};
use codescribe::sqlite_store::SqliteStore;
use codescribe_core::error::SummarizeError;
use codescribe_core::events::NoEvents;
use codescribe_core::models::SourceFile;
use codescribe_core::store::{ContentSource, Store};
use codescribe_core::summarize::Summarizer;

struct EchoSummarizer;

#[async_trait]
impl Summarizer for EchoSummarizer {
    fn model_name(&self) -> &str {
        "echo"
    }

    async fn summarize(&self, _prompt: &str) -> Result<String, SummarizeError> {
        Ok("Explains the code.".to_string())
    }
}

async fn start() -> (TempDir, String) {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("scribe.sqlite");
    let config = parse_config(&format!("[db]\npath = \"{}\"\n", db_path.display())).unwrap();

    let pool = connect_path(&db_path).await.unwrap();
    migrate_pool(&pool).await.unwrap();
    let store = SqliteStore::new(pool);

    let repo = store.create_repository("demo").await.unwrap();
    store
        .replace_files(
            &repo.id,
            &[
                SourceFile::new("src/app.py", "def main():\n    return run_the_application()\n"),
                SourceFile::new("src/tiny.py", "x = 1\n"),
            ],
        )
        .await
        .unwrap();

    let reconciler =
        build_reconciler(&config, &store, Arc::new(EchoSummarizer), Arc::new(NoEvents)).unwrap();
    let app = build_router(AppState::new(store, reconciler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (tmp, base)
}

#[tokio::test]
async fn health_reports_ok() {
    let (_tmp, base) = start().await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn generate_then_read_documents() {
    let (_tmp, base) = start().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/repositories/demo/generate", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let report: Value = resp.json().await.unwrap();
    assert_eq!(report["success"], true);
    assert_eq!(report["processedFiles"], 2);

    let index: Value = client
        .get(format!("{}/repositories/demo/documents", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(index["documents"].as_array().unwrap().len(), 2);
    assert!(index["fingerprintRoot"].is_string());

    let doc: Value = client
        .get(format!("{}/repositories/demo/documents?path=src/app.py", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(doc["version"], 1);
    assert!(doc["content"]
        .as_str()
        .unwrap()
        .contains("Explains the code."));

    let repos: Value = client
        .get(format!("{}/repositories", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(repos["repositories"][0]["documents"], 2);
}

#[tokio::test]
async fn changes_endpoint_applies_batch() {
    let (_tmp, base) = start().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/repositories/demo/changes", base))
        .json(&json!({
            "changes": [
                { "path": "src/new.py", "action": "added", "content": "y = 2\n" },
                { "path": "src/gone.py", "action": "removed" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let report: Value = resp.json().await.unwrap();
    assert_eq!(report["updatedFiles"], 2);
    assert_eq!(report["totalChanges"], 2);
    assert!(report["fingerprintRoot"].is_string());
}

#[tokio::test]
async fn unknown_repository_and_document_are_404() {
    let (_tmp, base) = start().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/repositories/nope/generate", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");

    let resp = client
        .get(format!("{}/repositories/demo/documents?path=missing.py", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
