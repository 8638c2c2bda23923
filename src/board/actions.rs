//! Control actions, routed to an adapter by queue name.
//!
//! Guards run before the adapter is called: a read-only queue rejects every
//! command, and a queue with retries disabled rejects retry-class commands.
//! Reads (logs, workers) are allowed on read-only queues.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::{QueueAdapter, WorkerInfo};
use crate::board::error::BoardError;
use crate::board::format::format_job;
use crate::board::models::AppJob;
use crate::board::registry::QueueRegistry;

/// Status set emptied by a bulk clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanTarget {
    Delayed,
    Failed,
    Completed,
}

impl CleanTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleanTarget::Delayed => "delayed",
            CleanTarget::Failed => "failed",
            CleanTarget::Completed => "completed",
        }
    }
}

impl FromStr for CleanTarget {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delayed" => Ok(CleanTarget::Delayed),
            "failed" => Ok(CleanTarget::Failed),
            "completed" => Ok(CleanTarget::Completed),
            other => Err(BoardError::NotFound(format!(
                "queue status {} cannot be cleaned",
                other
            ))),
        }
    }
}

/// A command the board can forward to a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueAction {
    RetryJob(String),
    PromoteJob(String),
    CleanJob(String),
    RetryAllFailed,
    CleanAll(CleanTarget),
    Pause,
    Resume,
}

impl QueueAction {
    /// Retry-class actions are hidden when the queue disallows retries.
    pub fn is_retry(&self) -> bool {
        matches!(self, QueueAction::RetryJob(_) | QueueAction::RetryAllFailed)
    }

    fn job_id(&self) -> Option<&str> {
        match self {
            QueueAction::RetryJob(id) | QueueAction::PromoteJob(id) | QueueAction::CleanJob(id) => {
                Some(id)
            }
            _ => None,
        }
    }
}

impl fmt::Display for QueueAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueAction::RetryJob(_) => f.write_str("retry_job"),
            QueueAction::PromoteJob(_) => f.write_str("promote_job"),
            QueueAction::CleanJob(_) => f.write_str("clean_job"),
            QueueAction::RetryAllFailed => f.write_str("retry_all_failed"),
            QueueAction::CleanAll(target) => write!(f, "clean_all_{}", target.as_str()),
            QueueAction::Pause => f.write_str("pause"),
            QueueAction::Resume => f.write_str("resume"),
        }
    }
}

/// Look up a queue's adapter by name.
pub fn resolve_queue<'a>(
    registry: &'a QueueRegistry,
    queue_name: &str,
) -> Result<&'a Arc<dyn QueueAdapter>, BoardError> {
    registry
        .get(queue_name)
        .ok_or_else(|| BoardError::queue_not_found(queue_name))
}

/// Forward `action` to the named queue's adapter.
pub async fn dispatch(
    registry: &QueueRegistry,
    queue_name: &str,
    action: QueueAction,
) -> Result<(), BoardError> {
    let adapter = resolve_queue(registry, queue_name)?;

    if adapter.read_only_mode() {
        warn!(queue = %queue_name, action = %action, "command rejected, queue is read-only");
        return Err(BoardError::ReadOnlyViolation(queue_name.to_string()));
    }
    if action.is_retry() && !adapter.allow_retries() {
        warn!(queue = %queue_name, action = %action, "command rejected, retries disabled");
        return Err(BoardError::RetriesDisabled(queue_name.to_string()));
    }

    let result = match &action {
        QueueAction::RetryJob(id) => adapter.retry_job(id).await,
        QueueAction::PromoteJob(id) => adapter.promote_job(id).await,
        QueueAction::CleanJob(id) => adapter.clean_job(id).await,
        QueueAction::RetryAllFailed => adapter.retry_all_failed().await,
        QueueAction::CleanAll(CleanTarget::Delayed) => adapter.clean_all_delayed().await,
        QueueAction::CleanAll(CleanTarget::Failed) => adapter.clean_all_failed().await,
        QueueAction::CleanAll(CleanTarget::Completed) => adapter.clean_all_completed().await,
        QueueAction::Pause => adapter.pause().await,
        QueueAction::Resume => adapter.resume().await,
    };

    match result {
        Ok(()) => {
            info!(
                queue = %queue_name,
                action = %action,
                job_id = action.job_id().unwrap_or("-"),
                "command forwarded"
            );
            Ok(())
        }
        Err(e) => {
            warn!(queue = %queue_name, action = %action, error = %e, "command failed");
            Err(e.into())
        }
    }
}

/// One job of the named queue, formatted for display.
pub async fn job_detail(
    registry: &QueueRegistry,
    queue_name: &str,
    job_id: &str,
) -> Result<AppJob, BoardError> {
    let adapter = resolve_queue(registry, queue_name)?;
    match adapter.get_job(job_id).await? {
        Some(record) => Ok(format_job(&record, adapter.as_ref())),
        None => Err(BoardError::NotFound(format!("job {} not found", job_id))),
    }
}

pub async fn job_logs(
    registry: &QueueRegistry,
    queue_name: &str,
    job_id: &str,
) -> Result<Vec<String>, BoardError> {
    let adapter = resolve_queue(registry, queue_name)?;
    Ok(adapter.get_job_logs(job_id).await?)
}

pub async fn queue_workers(
    registry: &QueueRegistry,
    queue_name: &str,
) -> Result<Vec<WorkerInfo>, BoardError> {
    let adapter = resolve_queue(registry, queue_name)?;
    Ok(adapter.list_workers().await?)
}
