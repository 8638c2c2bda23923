use thiserror::Error;

use crate::adapter::AdapterError;

/// Errors surfaced by the board to its HTTP binding.
#[derive(Error, Debug)]
pub enum BoardError {
    /// Connection to the queue engine is lost
    #[error("{0}")]
    BackendUnavailable(String),

    /// Unknown queue name or job id
    #[error("{0}")]
    NotFound(String),

    /// Command attempted on a read-only queue
    #[error("queue {0} is in read-only mode")]
    ReadOnlyViolation(String),

    /// Retry-class command attempted on a queue with retries disabled
    #[error("retries are disabled for queue {0}")]
    RetriesDisabled(String),

    /// The queue's backend cannot carry out the command
    #[error("{0}")]
    Unsupported(String),

    /// Any other backend failure, message passed through from the adapter
    #[error("{0}")]
    Backend(String),
}

impl BoardError {
    pub fn queue_not_found(queue_name: &str) -> Self {
        BoardError::NotFound(format!("queue {} not found", queue_name))
    }

    /// HTTP status code this error is surfaced as.
    pub fn http_status(&self) -> u16 {
        match self {
            BoardError::BackendUnavailable(_) | BoardError::Backend(_) => 500,
            BoardError::NotFound(_) => 404,
            BoardError::ReadOnlyViolation(_)
            | BoardError::RetriesDisabled(_)
            | BoardError::Unsupported(_) => 405,
        }
    }
}

impl From<AdapterError> for BoardError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Unavailable(msg) => BoardError::BackendUnavailable(msg),
            AdapterError::NotFound(msg) => BoardError::NotFound(msg),
            AdapterError::Unsupported(msg) => BoardError::Unsupported(msg),
            other => BoardError::Backend(other.to_string()),
        }
    }
}
