//! jitterprobe-api — status board and HTTP status endpoint.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Overall status, configured entries, and their latest results |
//! | GET | `/api/v1/entries` | Configured entries |
//! | GET | `/api/v1/results` | Latest result per configured entry |
//! | GET | `/api/v1/results/{key}` | Latest result for one entry |
//! | GET | `/api/v1/scheduler` | In-flight probe cycles |
//! | GET | `/healthz` | Liveness |
//! | GET | `/metrics` | Prometheus exposition |

pub mod board;
pub mod handlers;
pub mod prometheus;

use axum::Router;
use axum::routing::get;
use jitterprobe_scheduler::Scheduler;

pub use board::{KeyStatus, StatusBoard};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub scheduler: Scheduler,
    pub board: StatusBoard,
}

/// Build the complete status router.
pub fn build_router(scheduler: Scheduler, board: StatusBoard) -> Router {
    let state = ApiState { scheduler, board };

    let api_routes = Router::new()
        .route("/entries", get(handlers::list_entries))
        .route("/results", get(handlers::list_results))
        .route("/results/{key}", get(handlers::get_result))
        .route("/scheduler", get(handlers::scheduler_status))
        .with_state(state.clone());

    Router::new()
        .route("/", get(handlers::index))
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::prometheus_metrics))
        .with_state(state)
        .nest("/api/v1", api_routes)
}
