//! Framework-agnostic request handlers.
//!
//! An HTTP binding builds a [`BoardRequest`] from its own request type,
//! calls one of these functions and writes the [`ControllerResponse`] back.
//! The axum binding in [`crate::board::ui`] is one such caller.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::board::actions::{self, CleanTarget, QueueAction};
use crate::board::aggregator::{build_board, BoardQuery};
use crate::board::error::BoardError;
use crate::board::registry::QueueRegistry;

pub const QUEUE_NAME_PARAM: &str = "queueName";
pub const JOB_ID_PARAM: &str = "jobId";
pub const QUEUE_STATUS_PARAM: &str = "queueStatus";

/// An inbound request, decoupled from any HTTP framework.
#[derive(Debug, Clone)]
pub struct BoardRequest<'a> {
    pub queues: &'a QueueRegistry,
    pub query: BoardQuery,
    /// Path parameters (`queueName`, `jobId`, `queueStatus`)
    pub params: HashMap<String, String>,
}

impl<'a> BoardRequest<'a> {
    pub fn new(queues: &'a QueueRegistry) -> Self {
        Self {
            queues,
            query: BoardQuery::default(),
            params: HashMap::new(),
        }
    }

    pub fn query(mut self, query: BoardQuery) -> Self {
        self.query = query;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    fn require(&self, key: &str) -> Result<&str, BoardError> {
        self.params
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| BoardError::NotFound(format!("missing path parameter {}", key)))
    }
}

/// Status code (200 when absent) and JSON body of a handled request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub body: Value,
}

impl ControllerResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: None, body }
    }

    pub fn empty() -> Self {
        Self::ok(Value::Object(Map::new()))
    }

    /// The error's status code with its message passed through verbatim.
    pub fn from_error(err: &BoardError) -> Self {
        Self {
            status: Some(err.http_status()),
            body: json!({ "error": err.to_string() }),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status.unwrap_or(200)
    }
}

fn respond<T: Serialize>(result: Result<T, BoardError>) -> ControllerResponse {
    match result.and_then(|value| {
        serde_json::to_value(value).map_err(|e| BoardError::Backend(e.to_string()))
    }) {
        Ok(body) => ControllerResponse::ok(body),
        Err(err) => ControllerResponse::from_error(&err),
    }
}

fn respond_empty(result: Result<(), BoardError>) -> ControllerResponse {
    match result {
        Ok(()) => ControllerResponse::empty(),
        Err(err) => ControllerResponse::from_error(&err),
    }
}

async fn run_action<F>(req: &BoardRequest<'_>, action: F) -> ControllerResponse
where
    F: FnOnce(&BoardRequest<'_>) -> Result<QueueAction, BoardError>,
{
    let result = async {
        let queue_name = req.require(QUEUE_NAME_PARAM)?;
        let action = action(req)?;
        actions::dispatch(req.queues, queue_name, action).await
    }
    .await;
    respond_empty(result)
}

/// `{stats, queues}` for every registered queue.
///
/// Failures are reported as a generic 500; the cause is logged.
pub async fn queues_handler(req: &BoardRequest<'_>) -> ControllerResponse {
    match build_board(req.queues, &req.query).await {
        Ok(board) => respond(Ok(board)),
        Err(e) => {
            warn!(error = %e, "failed to build queue listing");
            ControllerResponse {
                status: Some(500),
                body: json!({ "error": "Failed to load queues" }),
            }
        }
    }
}

pub async fn retry_job(req: &BoardRequest<'_>) -> ControllerResponse {
    run_action(req, |req| {
        Ok(QueueAction::RetryJob(req.require(JOB_ID_PARAM)?.to_string()))
    })
    .await
}

pub async fn promote_job(req: &BoardRequest<'_>) -> ControllerResponse {
    run_action(req, |req| {
        Ok(QueueAction::PromoteJob(req.require(JOB_ID_PARAM)?.to_string()))
    })
    .await
}

pub async fn clean_job(req: &BoardRequest<'_>) -> ControllerResponse {
    run_action(req, |req| {
        Ok(QueueAction::CleanJob(req.require(JOB_ID_PARAM)?.to_string()))
    })
    .await
}

pub async fn retry_all(req: &BoardRequest<'_>) -> ControllerResponse {
    run_action(req, |_| Ok(QueueAction::RetryAllFailed)).await
}

/// Bulk clean of the status named by the `queueStatus` parameter.
pub async fn clean_all(req: &BoardRequest<'_>) -> ControllerResponse {
    run_action(req, |req| {
        let target: CleanTarget = req.require(QUEUE_STATUS_PARAM)?.parse()?;
        Ok(QueueAction::CleanAll(target))
    })
    .await
}

pub async fn pause_queue(req: &BoardRequest<'_>) -> ControllerResponse {
    run_action(req, |_| Ok(QueueAction::Pause)).await
}

pub async fn resume_queue(req: &BoardRequest<'_>) -> ControllerResponse {
    run_action(req, |_| Ok(QueueAction::Resume)).await
}

/// A single job of a queue, formatted like the listing's jobs.
pub async fn job_detail(req: &BoardRequest<'_>) -> ControllerResponse {
    let result = async {
        let queue_name = req.require(QUEUE_NAME_PARAM)?;
        let job_id = req.require(JOB_ID_PARAM)?;
        actions::job_detail(req.queues, queue_name, job_id).await
    }
    .await;
    respond(result)
}

pub async fn job_logs(req: &BoardRequest<'_>) -> ControllerResponse {
    let result = async {
        let queue_name = req.require(QUEUE_NAME_PARAM)?;
        let job_id = req.require(JOB_ID_PARAM)?;
        actions::job_logs(req.queues, queue_name, job_id).await
    }
    .await;
    respond(result)
}

pub async fn queue_workers(req: &BoardRequest<'_>) -> ControllerResponse {
    let result = async {
        let queue_name = req.require(QUEUE_NAME_PARAM)?;
        actions::queue_workers(req.queues, queue_name).await
    }
    .await;
    respond(result)
}
