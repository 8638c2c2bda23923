//! Redis adapter for list-based queues.
//!
//! Jobs live in one hash per job and move between per-status lists and
//! sorted sets as the queue engine processes them:
//!
//! | Status      | Key                          | Type   |
//! |-------------|------------------------------|--------|
//! | `Pending`   | `{prefix}:{queue}:wait`      | list   |
//! | `Running`   | `{prefix}:{queue}:active`    | list   |
//! | `Scheduled` | `{prefix}:{queue}:delayed`   | zset   |
//! | `Done`      | `{prefix}:{queue}:completed` | zset   |
//! | `Failed`    | `{prefix}:{queue}:failed`    | zset   |
//! | `Killed`    | `{prefix}:{queue}:killed`    | zset   |
//!
//! The pause flag is the `paused` field of `{prefix}:{queue}:meta` and job
//! logs are kept in `{prefix}:{queue}:{id}:logs`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use queue_board::adapter::RedisAdapter;
//!
//! let emails = RedisAdapter::builder()
//!     .redis_url("redis://localhost:6379")
//!     .queue_name("emails")
//!     .read_only(true)
//!     .build()
//!     .await?;
//! ```
//!
//! Several queues on one Redis instance should share a pool:
//! build it once with [`create_redis_pool`] and pass it to
//! [`RedisAdapter::new`] for each queue.

mod commands;
mod inspection;
mod pool;

use async_trait::async_trait;
use bb8_redis::{bb8::Pool, RedisConnectionManager};
use serde_json::Value;

pub use pool::{create_redis_pool, create_redis_pool_with_config, RedisPoolConfig};

use super::error::AdapterError;
use super::traits::*;
use crate::status::{JobCounts, JobStatus};

/// How a status is stored on the Redis side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusStore {
    /// Plain list, newest pushed on the left
    List,
    /// Sorted set scored by the time the job entered the status
    SortedSet,
}

/// Redis-backed [`QueueAdapter`] for one named queue.
#[derive(Clone)]
pub struct RedisAdapter {
    pool: Pool<RedisConnectionManager>,
    queue_name: String,
    options: AdapterOptions,
}

impl RedisAdapter {
    pub const DEFAULT_PREFIX: &'static str = "bull";

    /// Create an adapter over an existing pool.
    pub fn new(
        pool: Pool<RedisConnectionManager>,
        queue_name: impl Into<String>,
        options: AdapterOptions,
    ) -> Self {
        Self {
            pool,
            queue_name: queue_name.into(),
            options,
        }
    }

    pub fn builder() -> RedisAdapterBuilder {
        RedisAdapterBuilder::new()
    }

    pub fn pool(&self) -> &Pool<RedisConnectionManager> {
        &self.pool
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    // Key helpers
    fn key(&self, suffix: &str) -> String {
        format!("{}:{}:{}", self.options.prefix, self.queue_name, suffix)
    }

    fn job_key_prefix(&self) -> String {
        format!("{}:{}:", self.options.prefix, self.queue_name)
    }

    fn job_key(&self, job_id: &str) -> String {
        self.key(job_id)
    }

    fn logs_key(&self, job_id: &str) -> String {
        format!("{}:logs", self.job_key(job_id))
    }

    fn meta_key(&self) -> String {
        self.key("meta")
    }

    fn status_key(&self, status: JobStatus) -> String {
        self.key(status_suffix(status))
    }
}

pub(crate) fn status_suffix(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "wait",
        JobStatus::Running => "active",
        JobStatus::Scheduled => "delayed",
        JobStatus::Done => "completed",
        JobStatus::Failed => "failed",
        JobStatus::Killed => "killed",
    }
}

pub(crate) fn status_store(status: JobStatus) -> StatusStore {
    match status {
        JobStatus::Pending | JobStatus::Running => StatusStore::List,
        JobStatus::Scheduled | JobStatus::Done | JobStatus::Failed | JobStatus::Killed => {
            StatusStore::SortedSet
        }
    }
}

/// Builder for a [`RedisAdapter`] that owns its own pool.
pub struct RedisAdapterBuilder {
    redis_url: Option<String>,
    queue_name: Option<String>,
    pool_config: Option<RedisPoolConfig>,
    options: AdapterOptions,
}

impl RedisAdapterBuilder {
    pub fn new() -> Self {
        Self {
            redis_url: None,
            queue_name: None,
            pool_config: None,
            options: AdapterOptions::new(RedisAdapter::DEFAULT_PREFIX),
        }
    }

    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    pub fn queue_name(mut self, name: impl Into<String>) -> Self {
        self.queue_name = Some(name.into());
        self
    }

    /// Key prefix the queue engine was configured with.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.prefix = prefix.into();
        self
    }

    pub fn pool_config(mut self, config: RedisPoolConfig) -> Self {
        self.pool_config = Some(config);
        self
    }

    pub fn read_only(mut self, read_only_mode: bool) -> Self {
        self.options.read_only_mode = read_only_mode;
        self
    }

    pub fn allow_retries(mut self, allow_retries: bool) -> Self {
        self.options.allow_retries = allow_retries;
        self
    }

    pub fn formatter<F>(mut self, field: FormatterField, formatter: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.options.formatters.set(field, formatter);
        self
    }

    pub async fn build(self) -> Result<RedisAdapter, AdapterError> {
        let queue_name = self
            .queue_name
            .ok_or_else(|| AdapterError::Configuration("queue_name is required".into()))?;
        let redis_url = self
            .redis_url
            .unwrap_or_else(|| "redis://127.0.0.1:6379".to_string());
        let pool =
            create_redis_pool_with_config(&redis_url, self.pool_config.unwrap_or_default())
                .await?;

        Ok(RedisAdapter::new(pool, queue_name, self.options))
    }
}

impl Default for RedisAdapterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// QueueAdapter Implementation
// ============================================================================

#[async_trait]
impl QueueAdapter for RedisAdapter {
    fn options(&self) -> &AdapterOptions {
        &self.options
    }

    async fn get_job_counts(&self, statuses: &[JobStatus]) -> Result<JobCounts, AdapterError> {
        inspection::job_counts(self, statuses).await
    }

    async fn is_paused(&self) -> Result<bool, AdapterError> {
        inspection::is_paused(self).await
    }

    async fn get_jobs(
        &self,
        statuses: &[JobStatus],
        start: usize,
        end: usize,
    ) -> Result<Vec<Option<JobRecord>>, AdapterError> {
        inspection::jobs(self, statuses, start, end).await
    }

    async fn get_job(&self, job_id: &str) -> Result<Option<JobRecord>, AdapterError> {
        inspection::job(self, job_id).await
    }

    fn format(&self, field: FormatterField, data: &Value, fallback: Option<&Value>) -> Value {
        self.options
            .formatters
            .apply(field, data)
            .unwrap_or_else(|| inspection::format_field(field, data, fallback))
    }

    async fn get_backend_info(&self) -> Result<String, AdapterError> {
        inspection::backend_info(self).await
    }

    async fn get_job_logs(&self, job_id: &str) -> Result<Vec<String>, AdapterError> {
        inspection::job_logs(self, job_id).await
    }

    async fn retry_job(&self, job_id: &str) -> Result<(), AdapterError> {
        commands::retry_job(self, job_id).await
    }

    async fn promote_job(&self, job_id: &str) -> Result<(), AdapterError> {
        commands::promote_job(self, job_id).await
    }

    async fn clean_job(&self, job_id: &str) -> Result<(), AdapterError> {
        commands::clean_job(self, job_id).await
    }

    async fn retry_all_failed(&self) -> Result<(), AdapterError> {
        commands::retry_all_failed(self).await
    }

    async fn clean_all_completed(&self) -> Result<(), AdapterError> {
        commands::clean_all(self, JobStatus::Done).await
    }

    async fn clean_all_failed(&self) -> Result<(), AdapterError> {
        commands::clean_all(self, JobStatus::Failed).await
    }

    async fn clean_all_delayed(&self) -> Result<(), AdapterError> {
        commands::clean_all(self, JobStatus::Scheduled).await
    }

    async fn pause(&self) -> Result<(), AdapterError> {
        commands::set_paused(self, true).await
    }

    async fn resume(&self) -> Result<(), AdapterError> {
        commands::set_paused(self, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_has_its_own_key() {
        let mut suffixes: Vec<_> = JobStatus::ALL.iter().map(|s| status_suffix(*s)).collect();
        suffixes.sort_unstable();
        suffixes.dedup();
        assert_eq!(suffixes.len(), JobStatus::ALL.len());
    }

    #[test]
    fn only_waiting_and_active_are_lists() {
        let lists: Vec<_> = JobStatus::ALL
            .into_iter()
            .filter(|s| status_store(*s) == StatusStore::List)
            .collect();
        assert_eq!(lists, vec![JobStatus::Running, JobStatus::Pending]);
    }
}
