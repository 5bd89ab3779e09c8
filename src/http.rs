//! HTTP surface for operators. Requires the `http` feature.
//!
//! ## Routes
//!
//! - `GET /health` - `{ "ok": true }`
//! - `GET /sync/status` - pending count, last tick report, sample of open entries
//! - `POST /sync/now` - run one tick; `409` if a tick is already running
//!
//! ## Example
//!
//! ```ignore
//! let worker = Arc::new(TickWorker::new(store, directory, locks, clock, &config));
//! let _scheduler = SyncWorkerThread::spawn(Arc::clone(&worker), config.tick_interval);
//! tribu_sync::http::serve(worker, "0.0.0.0:3000").await?;
//! ```

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::lock::LockManager;
use crate::model::ModelStore;
use crate::remote::DirectoryService;
use crate::sync::{TickOutcome, TickWorker};

/// Build an axum `Router` around a shared tick worker.
pub fn router<S, D, L>(worker: Arc<TickWorker<S, D, L>>) -> Router
where
    S: ModelStore + 'static,
    D: DirectoryService + 'static,
    L: LockManager + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/sync/status", get(status_handler::<S, D, L>))
        .route("/sync/now", post(sync_now_handler::<S, D, L>))
        .with_state(worker)
}

/// Serve the router at the given address (e.g. `"0.0.0.0:3000"`).
pub async fn serve<S, D, L>(
    worker: Arc<TickWorker<S, D, L>>,
    addr: &str,
) -> Result<(), std::io::Error>
where
    S: ModelStore + 'static,
    D: DirectoryService + 'static,
    L: LockManager + 'static,
{
    let app = router(worker);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn status_handler<S, D, L>(State(worker): State<Arc<TickWorker<S, D, L>>>) -> impl IntoResponse
where
    S: ModelStore + 'static,
    D: DirectoryService + 'static,
    L: LockManager + 'static,
{
    match worker.status() {
        Ok(status) => (StatusCode::OK, Json(json!(status))).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// Ticks block on the directory, so they run on the blocking pool.
async fn sync_now_handler<S, D, L>(
    State(worker): State<Arc<TickWorker<S, D, L>>>,
) -> impl IntoResponse
where
    S: ModelStore + 'static,
    D: DirectoryService + 'static,
    L: LockManager + 'static,
{
    match tokio::task::spawn_blocking(move || worker.tick()).await {
        Ok(TickOutcome::Completed(report)) => (StatusCode::OK, Json(json!(report))).into_response(),
        Ok(TickOutcome::Busy) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "a sync tick is already running" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
