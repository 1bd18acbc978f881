//! HTTP API server.
//!
//! Exposes documentation runs and stored documents as a JSON HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/repositories` | Registered repositories with counts |
//! | `POST` | `/repositories/{repo}/generate` | Full generation; returns a `GenerateReport` |
//! | `POST` | `/repositories/{repo}/changes` | Apply `{ "changes": [...] }`; returns a `ChangeReport` |
//! | `GET`  | `/repositories/{repo}/documents` | Document index, or one document with `?path=` |
//!
//! `{repo}` is a repository id or name. Reports use camelCase keys. A report
//! with `success: false` is returned with status 500.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "repository not found: demo" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use codescribe_core::events::NoEvents;
use codescribe_core::models::{FileChange, Repository};
use codescribe_core::reconcile::Reconciler;
use codescribe_core::store::Store;

use crate::config::Config;
use crate::generate::build_reconciler;
use crate::repos::list_repositories;
use crate::sqlite_store::SqliteStore;
use crate::summarizer::create_summarizer;

/// Shared state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    store: SqliteStore,
    reconciler: Arc<Reconciler>,
}

impl AppState {
    pub fn new(store: SqliteStore, reconciler: Reconciler) -> Self {
        Self {
            store,
            reconciler: Arc::new(reconciler),
        }
    }

    /// Open the store and build the reconciler (and its summarizer) once.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = SqliteStore::open(config).await?;
        let summarizer = create_summarizer(&config.summarizer)?;
        let reconciler = build_reconciler(config, &store, summarizer, Arc::new(NoEvents))?;
        Ok(Self::new(store, reconciler))
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/repositories", get(handle_list_repositories))
        .route("/repositories/{repo}/generate", post(handle_generate))
        .route("/repositories/{repo}/changes", post(handle_changes))
        .route("/repositories/{repo}/documents", get(handle_documents))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the server on `[server].bind` and run until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = AppState::from_config(config).await?;
    let app = build_router(state);

    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(bind = %bind_addr, summarizer = %config.summarizer.provider, "server listening");
    println!("scribe server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal".to_string(),
            message: format!("{:#}", err),
        }
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

async fn resolve_repository(state: &AppState, repo: &str) -> Result<Repository, AppError> {
    state
        .store
        .find_repository(repo)
        .await?
        .ok_or_else(|| not_found(format!("repository not found: {}", repo)))
}

fn report_status(success: bool) -> StatusCode {
    if success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /repositories ============

async fn handle_list_repositories(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let repositories = list_repositories(&state.store).await?;
    Ok(Json(serde_json::json!({ "repositories": repositories })))
}

// ============ POST /repositories/{repo}/generate ============

async fn handle_generate(
    State(state): State<AppState>,
    Path(repo): Path<String>,
) -> Result<Response, AppError> {
    let repository = resolve_repository(&state, &repo).await?;
    let report = state.reconciler.generate_all(&repository.id).await;
    Ok((report_status(report.success), Json(report)).into_response())
}

// ============ POST /repositories/{repo}/changes ============

#[derive(Deserialize)]
struct ChangesRequest {
    changes: Vec<FileChange>,
}

async fn handle_changes(
    State(state): State<AppState>,
    Path(repo): Path<String>,
    Json(request): Json<ChangesRequest>,
) -> Result<Response, AppError> {
    let repository = resolve_repository(&state, &repo).await?;
    let report = state
        .reconciler
        .apply_changes(&repository.id, &request.changes)
        .await;
    Ok((report_status(report.success), Json(report)).into_response())
}

// ============ GET /repositories/{repo}/documents ============

#[derive(Deserialize)]
struct DocumentQuery {
    path: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentEntry {
    file_path: String,
    version: i64,
    fingerprint_root: String,
    chunks: usize,
    updated_at: String,
}

async fn handle_documents(
    State(state): State<AppState>,
    Path(repo): Path<String>,
    Query(query): Query<DocumentQuery>,
) -> Result<Response, AppError> {
    let repository = resolve_repository(&state, &repo).await?;

    match query.path {
        Some(path) if path.trim().is_empty() => Err(bad_request("path must not be empty")),
        Some(path) => {
            let doc = state
                .store
                .get_document(&repository.id, &path)
                .await?
                .ok_or_else(|| not_found(format!("document not found: {}", path)))?;
            Ok(Json(doc).into_response())
        }
        None => {
            let documents: Vec<DocumentEntry> = state
                .store
                .list_documents(&repository.id)
                .await?
                .into_iter()
                .map(|doc| DocumentEntry {
                    chunks: doc.chunk_hashes.len(),
                    updated_at: doc.updated_at.to_rfc3339(),
                    file_path: doc.file_path,
                    version: doc.version,
                    fingerprint_root: doc.fingerprint_root,
                })
                .collect();
            Ok(Json(serde_json::json!({
                "repository": repository.name,
                "fingerprintRoot": repository.fingerprint_root,
                "documents": documents,
            }))
            .into_response())
        }
    }
}
