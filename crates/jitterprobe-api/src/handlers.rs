//! Status endpoint handlers.
//!
//! Everything here is read-only: handlers read the scheduler's entry set and
//! the status board and return JSON.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::Serialize;

use jitterprobe_core::Entry;

use crate::ApiState;
use crate::board::KeyStatus;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// Daemon status block of the index page.
#[derive(Debug, Serialize)]
pub struct DaemonStatus {
    pub initialized: bool,
    pub time: DateTime<Utc>,
}

/// Body of `GET /`.
#[derive(Debug, Serialize)]
pub struct IndexView {
    pub status: DaemonStatus,
    pub config: Vec<Entry>,
    pub entries: Vec<KeyStatus>,
}

/// One in-flight probe cycle.
#[derive(Debug, Serialize)]
pub struct RunningView {
    pub key: String,
    pub spawned_at: DateTime<Utc>,
    pub configured: bool,
}

/// Body of `GET /api/v1/scheduler`.
#[derive(Debug, Serialize)]
pub struct SchedulerView {
    pub running: Vec<RunningView>,
    pub tasks_spawned: u64,
}

async fn active_results(state: &ApiState, entries: &[Entry]) -> Vec<KeyStatus> {
    let keys: Vec<String> = entries.iter().map(|e| e.key.clone()).collect();
    state.board.snapshot_for(&keys).await
}

/// GET /
pub async fn index(State(state): State<ApiState>) -> impl IntoResponse {
    let config = state.scheduler.entries().await;
    let entries = active_results(&state, &config).await;
    Json(IndexView {
        status: DaemonStatus {
            initialized: state.board.is_initialized(),
            time: Utc::now(),
        },
        config,
        entries,
    })
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// GET /api/v1/entries
pub async fn list_entries(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.scheduler.entries().await)
}

/// GET /api/v1/results
pub async fn list_results(State(state): State<ApiState>) -> impl IntoResponse {
    let config = state.scheduler.entries().await;
    ApiResponse::ok(active_results(&state, &config).await)
}

/// GET /api/v1/results/{key}
pub async fn get_result(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    match state.board.get(&key).await {
        Some(status) => ApiResponse::ok(status).into_response(),
        None => error_response("no result for entry", StatusCode::NOT_FOUND).into_response(),
    }
}

/// GET /api/v1/scheduler
pub async fn scheduler_status(State(state): State<ApiState>) -> impl IntoResponse {
    let running = state
        .scheduler
        .running_tasks()
        .await
        .into_iter()
        .map(|t| RunningView {
            key: t.key,
            spawned_at: t.spawned_at,
            configured: t.configured,
        })
        .collect();
    ApiResponse::ok(SchedulerView {
        running,
        tasks_spawned: state.scheduler.tasks_spawned(),
    })
}

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let config = state.scheduler.entries().await;
    let statuses = active_results(&state, &config).await;
    let running = state.scheduler.running_keys().await.len();

    let body = crate::prometheus::render_prometheus(&statuses, running, state.scheduler.tasks_spawned());
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
