//! The contract every queue backend binding implements.
//!
//! The board never talks to Redis or SQL directly. It talks to a
//! [`QueueAdapter`], and each backend supplies one concrete implementation
//! chosen at configuration time.
//!
//! # Example: implementing a custom adapter
//!
//! ```rust,ignore
//! use queue_board::adapter::{AdapterError, AdapterOptions, JobRecord, QueueAdapter};
//! use queue_board::status::{JobCounts, JobStatus};
//! use async_trait::async_trait;
//!
//! pub struct MyAdapter { options: AdapterOptions }
//!
//! #[async_trait]
//! impl QueueAdapter for MyAdapter {
//!     fn options(&self) -> &AdapterOptions { &self.options }
//!     // counts, job pages, pause state and commands...
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::AdapterError;
use crate::status::{JobCounts, JobStatus};

// ============================================================================
// Job records
// ============================================================================

/// A job as stored by the backend, decoded into a common Rust shape.
///
/// Field values still carry backend encodings (a Redis job keeps its
/// return value as JSON text, for instance); [`QueueAdapter::format`]
/// normalizes them for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Backend identifier, absent for jobs that were never assigned one
    pub id: Option<String>,
    /// Display name as stored by the backend
    pub name: String,
    /// When the job was enqueued (epoch milliseconds)
    pub run_at: i64,
    /// When a worker locked the job (epoch milliseconds)
    pub lock_at: Option<i64>,
    /// Worker holding (or last holding) the lock
    pub lock_by: Option<String>,
    /// When the job finished, successfully or not (epoch milliseconds)
    pub done_at: Option<i64>,
    /// Progress as reported by the job, a number or an object
    pub progress: Value,
    /// Attempts made so far
    pub attempts: u32,
    /// Last error message
    pub last_error: Option<String>,
    /// Stack trace lines of the last failure
    pub stacktrace: Vec<String>,
    /// Backend options the job was enqueued with
    pub opts: JobOptions,
    /// Job payload
    pub payload: Value,
    /// Return value, in the backend's encoding
    pub return_value: Value,
}

impl JobRecord {
    /// A record with only the mandatory fields set.
    pub fn new(name: impl Into<String>, run_at: i64) -> Self {
        Self {
            id: None,
            name: name.into(),
            run_at,
            lock_at: None,
            lock_by: None,
            done_at: None,
            progress: Value::from(0),
            attempts: 0,
            last_error: None,
            stacktrace: Vec::new(),
            opts: JobOptions::default(),
            payload: Value::Null,
            return_value: Value::Null,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Enqueue options a backend keeps with a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOptions {
    /// Delay before the job becomes runnable, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
    /// Repeat policy, backend specific
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<Value>,
    /// Any other option the backend stored
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A worker consuming from a queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerInfo {
    /// Worker identifier
    pub id: String,
    /// Job type (queue) the worker consumes
    pub job_type: String,
    /// Storage the worker pulls from
    pub source: String,
    /// Middleware layers the worker was started with
    pub layers: String,
    /// Last heartbeat
    pub last_seen: Option<DateTime<Utc>>,
}

// ============================================================================
// Formatting
// ============================================================================

/// Job fields an adapter can reformat for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatterField {
    #[serde(rename = "data")]
    Data,
    #[serde(rename = "returnValue")]
    ReturnValue,
    #[serde(rename = "name")]
    Name,
}

/// A display formatter for one job field.
pub type FormatterFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// User-registered formatters, at most one per [`FormatterField`].
#[derive(Clone, Default)]
pub struct Formatters {
    data: Option<FormatterFn>,
    return_value: Option<FormatterFn>,
    name: Option<FormatterFn>,
}

impl Formatters {
    pub fn set<F>(&mut self, field: FormatterField, formatter: F)
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        *self.slot(field) = Some(Arc::new(formatter));
    }

    pub fn get(&self, field: FormatterField) -> Option<&FormatterFn> {
        match field {
            FormatterField::Data => self.data.as_ref(),
            FormatterField::ReturnValue => self.return_value.as_ref(),
            FormatterField::Name => self.name.as_ref(),
        }
    }

    /// Run the registered formatter for `field`, if any.
    pub fn apply(&self, field: FormatterField, data: &Value) -> Option<Value> {
        self.get(field).map(|formatter| formatter(data))
    }

    fn slot(&mut self, field: FormatterField) -> &mut Option<FormatterFn> {
        match field {
            FormatterField::Data => &mut self.data,
            FormatterField::ReturnValue => &mut self.return_value,
            FormatterField::Name => &mut self.name,
        }
    }
}

impl fmt::Debug for Formatters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formatters")
            .field("data", &self.data.is_some())
            .field("return_value", &self.return_value.is_some())
            .field("name", &self.name.is_some())
            .finish()
    }
}

// ============================================================================
// Adapter options
// ============================================================================

/// Static adapter configuration, fixed for the adapter's lifetime.
#[derive(Debug, Clone)]
pub struct AdapterOptions {
    /// Disables every command operation; enforced by the board before the
    /// adapter is called
    pub read_only_mode: bool,
    /// Hides retry-class commands when false
    pub allow_retries: bool,
    /// Backend namespace (Redis key prefix, SQL schema)
    pub prefix: String,
    /// Per-field display formatters
    pub formatters: Formatters,
}

impl AdapterOptions {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            read_only_mode: false,
            allow_retries: true,
            prefix: prefix.into(),
            formatters: Formatters::default(),
        }
    }

    pub fn read_only(mut self, read_only_mode: bool) -> Self {
        self.read_only_mode = read_only_mode;
        self
    }

    pub fn allow_retries(mut self, allow_retries: bool) -> Self {
        self.allow_retries = allow_retries;
        self
    }

    pub fn formatter<F>(mut self, field: FormatterField, formatter: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.formatters.set(field, formatter);
        self
    }
}

// ============================================================================
// QueueAdapter
// ============================================================================

/// A binding to one queue on one backend engine.
///
/// # Implementation Notes
///
/// - Implementations own their connection (or pool) and carry their own
///   timeout policy; the board never cancels a call
/// - Driver errors are mapped to [`AdapterError`] variants, with lost
///   connections reported as [`AdapterError::Unavailable`]
/// - Commands are idempotent: a job or queue already in the requested
///   state is left alone and the call succeeds
#[async_trait]
pub trait QueueAdapter: Send + Sync {
    /// Static configuration of this adapter.
    fn options(&self) -> &AdapterOptions;

    fn read_only_mode(&self) -> bool {
        self.options().read_only_mode
    }

    fn allow_retries(&self) -> bool {
        self.options().allow_retries
    }

    fn prefix(&self) -> &str {
        &self.options().prefix
    }

    /// Count jobs in each of `statuses`.
    ///
    /// Statuses with no jobs (and statuses not requested) count as zero.
    async fn get_job_counts(&self, statuses: &[JobStatus]) -> Result<JobCounts, AdapterError>;

    /// Current pause flag of the queue.
    async fn is_paused(&self) -> Result<bool, AdapterError>;

    /// Fetch jobs in any of `statuses`, windowed to `[start, end]` inclusive.
    ///
    /// Each status contributes its own `[start, end]` window, most recently
    /// changed first, and the windows are concatenated in the order of
    /// `statuses`. Windows past the end of the data return fewer (or no)
    /// entries. `None` marks a slot whose job vanished or could not be
    /// decoded.
    async fn get_jobs(
        &self,
        statuses: &[JobStatus],
        start: usize,
        end: usize,
    ) -> Result<Vec<Option<JobRecord>>, AdapterError>;

    /// Fetch one job by id, `None` if the queue has no such job.
    async fn get_job(&self, job_id: &str) -> Result<Option<JobRecord>, AdapterError>;

    /// Project one job field for display.
    ///
    /// Uses the formatter registered for `field`, otherwise `fallback`,
    /// otherwise `data` unchanged. Must not fail.
    fn format(&self, field: FormatterField, data: &Value, fallback: Option<&Value>) -> Value {
        self.options()
            .formatters
            .apply(field, data)
            .unwrap_or_else(|| fallback.unwrap_or(data).clone())
    }

    /// Raw diagnostic text of the backend (Redis `INFO` format).
    ///
    /// Backends that cannot report this return an empty string.
    async fn get_backend_info(&self) -> Result<String, AdapterError> {
        Ok(String::new())
    }

    /// Log lines a job wrote while running.
    async fn get_job_logs(&self, _job_id: &str) -> Result<Vec<String>, AdapterError> {
        Ok(Vec::new())
    }

    /// Workers currently registered for this queue.
    async fn list_workers(&self) -> Result<Vec<WorkerInfo>, AdapterError> {
        Ok(Vec::new())
    }

    /// Move a failed or killed job back to pending.
    async fn retry_job(&self, job_id: &str) -> Result<(), AdapterError>;

    /// Make a scheduled job runnable now.
    async fn promote_job(&self, job_id: &str) -> Result<(), AdapterError>;

    /// Remove a job from the queue entirely.
    async fn clean_job(&self, job_id: &str) -> Result<(), AdapterError>;

    async fn retry_all_failed(&self) -> Result<(), AdapterError>;

    async fn clean_all_completed(&self) -> Result<(), AdapterError>;

    async fn clean_all_failed(&self) -> Result<(), AdapterError>;

    async fn clean_all_delayed(&self) -> Result<(), AdapterError>;

    /// Stop workers from taking new jobs.
    ///
    /// Backends without a pause flag the workers honour return
    /// [`AdapterError::Unsupported`].
    async fn pause(&self) -> Result<(), AdapterError>;

    async fn resume(&self) -> Result<(), AdapterError>;
}
