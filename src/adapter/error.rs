//! Backend-agnostic error types for queue adapters.
//!
//! Every adapter maps its driver errors onto these variants so the board can
//! treat a Redis outage and a Postgres outage the same way.

use thiserror::Error;

/// Errors that can occur inside an adapter.
///
/// # Examples
///
/// ```rust
/// use queue_board::adapter::AdapterError;
///
/// fn describe(err: &AdapterError) -> &'static str {
///     match err {
///         AdapterError::Unavailable(_) => "backend down",
///         AdapterError::NotFound(_) => "no such job",
///         _ => "backend error",
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Connection to the queue engine is lost or cannot be established
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Requested job does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Backend reported an error for an otherwise valid request
    #[error("internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend has no way to carry out the requested operation
    #[error("{0}")]
    Unsupported(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A stored job could not be decoded into a [`JobRecord`](super::JobRecord)
    #[error("malformed job record {id}: {reason}")]
    MalformedJobRecord { id: String, reason: String },
}

impl AdapterError {
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        AdapterError::MalformedJobRecord {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the connection to the backend is the problem.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AdapterError::Unavailable(_))
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Serialization(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for AdapterError {
    fn from(err: redis::RedisError) -> Self {
        AdapterError::Unavailable(err.to_string())
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for AdapterError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AdapterError::NotFound("row not found".into()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AdapterError::Unavailable(err.to_string())
            }
            other => AdapterError::Internal(other.to_string()),
        }
    }
}
