//! Axum router for the board API.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};

use crate::board::aggregator::BoardQuery;
use crate::board::handlers::{
    self, BoardRequest, ControllerResponse, JOB_ID_PARAM, QUEUE_NAME_PARAM, QUEUE_STATUS_PARAM,
};
use crate::board::registry::QueueRegistry;

#[derive(Clone)]
struct UiState {
    registry: Arc<QueueRegistry>,
}

/// Creates the board API router. Mount it on any path.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use queue_board::adapter::RedisAdapter;
/// use queue_board::board::{board_api, QueueRegistry};
/// use axum::Router;
///
/// # async fn example() -> anyhow::Result<()> {
/// let emails = RedisAdapter::builder()
///     .redis_url("redis://127.0.0.1:6379")
///     .queue_name("emails")
///     .build()
///     .await?;
///
/// let registry = QueueRegistry::new().with_queue("emails", Arc::new(emails));
///
/// let app: Router = Router::new().nest("/api", board_api(Arc::new(registry)));
/// # Ok(())
/// # }
/// ```
pub fn board_api(registry: Arc<QueueRegistry>) -> Router {
    let state = UiState { registry };

    Router::new()
        .route("/queues", get(list_queues))
        .route("/queues/:queue_name/retry", put(retry_all))
        .route("/queues/:queue_name/clean/:queue_status", put(clean_all))
        .route("/queues/:queue_name/pause", put(pause_queue))
        .route("/queues/:queue_name/resume", put(resume_queue))
        .route("/queues/:queue_name/workers", get(queue_workers))
        .route("/queues/:queue_name/:job_id", get(job_detail))
        .route("/queues/:queue_name/:job_id/retry", put(retry_job))
        .route("/queues/:queue_name/:job_id/promote", put(promote_job))
        .route("/queues/:queue_name/:job_id/clean", put(clean_job))
        .route("/queues/:queue_name/:job_id/logs", get(job_logs))
        .with_state(state)
}

impl IntoResponse for ControllerResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}

fn queue_request(state: &UiState, queue_name: String) -> BoardRequest<'_> {
    BoardRequest::new(&state.registry).param(QUEUE_NAME_PARAM, queue_name)
}

fn job_request(state: &UiState, (queue_name, job_id): (String, String)) -> BoardRequest<'_> {
    queue_request(state, queue_name).param(JOB_ID_PARAM, job_id)
}

async fn list_queues(
    State(state): State<UiState>,
    Query(query): Query<BoardQuery>,
) -> ControllerResponse {
    let req = BoardRequest::new(&state.registry).query(query);
    handlers::queues_handler(&req).await
}

async fn retry_all(
    State(state): State<UiState>,
    Path(queue_name): Path<String>,
) -> ControllerResponse {
    handlers::retry_all(&queue_request(&state, queue_name)).await
}

async fn clean_all(
    State(state): State<UiState>,
    Path((queue_name, queue_status)): Path<(String, String)>,
) -> ControllerResponse {
    let req = queue_request(&state, queue_name).param(QUEUE_STATUS_PARAM, queue_status);
    handlers::clean_all(&req).await
}

async fn pause_queue(
    State(state): State<UiState>,
    Path(queue_name): Path<String>,
) -> ControllerResponse {
    handlers::pause_queue(&queue_request(&state, queue_name)).await
}

async fn resume_queue(
    State(state): State<UiState>,
    Path(queue_name): Path<String>,
) -> ControllerResponse {
    handlers::resume_queue(&queue_request(&state, queue_name)).await
}

async fn queue_workers(
    State(state): State<UiState>,
    Path(queue_name): Path<String>,
) -> ControllerResponse {
    handlers::queue_workers(&queue_request(&state, queue_name)).await
}

async fn retry_job(
    State(state): State<UiState>,
    Path(path): Path<(String, String)>,
) -> ControllerResponse {
    handlers::retry_job(&job_request(&state, path)).await
}

async fn promote_job(
    State(state): State<UiState>,
    Path(path): Path<(String, String)>,
) -> ControllerResponse {
    handlers::promote_job(&job_request(&state, path)).await
}

async fn clean_job(
    State(state): State<UiState>,
    Path(path): Path<(String, String)>,
) -> ControllerResponse {
    handlers::clean_job(&job_request(&state, path)).await
}

async fn job_detail(
    State(state): State<UiState>,
    Path(path): Path<(String, String)>,
) -> ControllerResponse {
    handlers::job_detail(&job_request(&state, path)).await
}

async fn job_logs(
    State(state): State<UiState>,
    Path(path): Path<(String, String)>,
) -> ControllerResponse {
    handlers::job_logs(&job_request(&state, path)).await
}
