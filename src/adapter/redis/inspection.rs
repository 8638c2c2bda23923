//! Read operations for the Redis adapter: counts, job pages, pause state,
//! logs and server info.

use std::collections::HashMap;

use bb8_redis::bb8::PooledConnection;
use bb8_redis::RedisConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use tracing::warn;

use super::{status_store, RedisAdapter, StatusStore};
use crate::adapter::error::AdapterError;
use crate::adapter::traits::*;
use crate::status::{JobCounts, JobStatus};

/// Name the queue engine stores for jobs enqueued without one.
const DEFAULT_JOB_NAME: &str = "__default__";

pub(super) async fn get_conn(
    adapter: &RedisAdapter,
) -> Result<PooledConnection<'_, RedisConnectionManager>, AdapterError> {
    adapter
        .pool()
        .get()
        .await
        .map_err(|e| AdapterError::Unavailable(format!("Failed to get Redis connection: {}", e)))
}

pub async fn job_counts(
    adapter: &RedisAdapter,
    statuses: &[JobStatus],
) -> Result<JobCounts, AdapterError> {
    let mut counts = JobCounts::default();
    if statuses.is_empty() {
        return Ok(counts);
    }

    let mut conn = get_conn(adapter).await?;
    let mut pipe = redis::pipe();
    for status in statuses {
        let key = adapter.status_key(*status);
        match status_store(*status) {
            StatusStore::List => pipe.llen(key),
            StatusStore::SortedSet => pipe.zcard(key),
        };
    }
    let sizes: Vec<u64> = pipe.query_async(&mut *conn).await?;

    for (status, size) in statuses.iter().zip(sizes) {
        counts.set(*status, size);
    }
    Ok(counts)
}

pub async fn is_paused(adapter: &RedisAdapter) -> Result<bool, AdapterError> {
    let mut conn = get_conn(adapter).await?;
    let paused: bool = conn.hexists(adapter.meta_key(), "paused").await?;
    Ok(paused)
}

pub async fn jobs(
    adapter: &RedisAdapter,
    statuses: &[JobStatus],
    start: usize,
    end: usize,
) -> Result<Vec<Option<JobRecord>>, AdapterError> {
    let Some((start, stop)) = range_window(start, end) else {
        return Ok(Vec::new());
    };

    let mut conn = get_conn(adapter).await?;
    let mut ids = Vec::new();

    for status in statuses {
        let key = adapter.status_key(*status);
        // Lists are pushed on the left and sorted sets are scored by time,
        // so both read newest first.
        let page: Vec<String> = match status_store(*status) {
            StatusStore::List => conn.lrange(&key, start, stop).await?,
            StatusStore::SortedSet => conn.zrevrange(&key, start, stop).await?,
        };
        ids.extend(page);
    }

    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut pipe = redis::pipe();
    for id in &ids {
        pipe.hgetall(adapter.job_key(id));
    }
    let hashes: Vec<HashMap<String, String>> = pipe.query_async(&mut *conn).await?;

    Ok(ids
        .iter()
        .zip(hashes)
        .map(|(id, fields)| decode_slot(adapter, id, &fields))
        .collect())
}

pub async fn job(adapter: &RedisAdapter, job_id: &str) -> Result<Option<JobRecord>, AdapterError> {
    let mut conn = get_conn(adapter).await?;
    let fields: HashMap<String, String> = conn.hgetall(adapter.job_key(job_id)).await?;
    Ok(decode_slot(adapter, job_id, &fields))
}

/// `[start, end]` as Redis range arguments.
///
/// A window starting beyond what a range index can address is empty; Redis
/// would read a negative start as counting from the tail.
fn range_window(start: usize, end: usize) -> Option<(isize, isize)> {
    if end < start {
        return None;
    }
    let start = isize::try_from(start).ok()?;
    let stop = isize::try_from(end).unwrap_or(isize::MAX);
    Some((start, stop))
}

fn decode_slot(
    adapter: &RedisAdapter,
    job_id: &str,
    fields: &HashMap<String, String>,
) -> Option<JobRecord> {
    if fields.is_empty() {
        // Removed between the range read and the hash read.
        return None;
    }

    match decode_job(job_id, fields) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(
                queue = %adapter.queue_name(),
                job_id = %job_id,
                error = %e,
                "dropping job record that could not be decoded"
            );
            None
        }
    }
}

pub async fn job_logs(adapter: &RedisAdapter, job_id: &str) -> Result<Vec<String>, AdapterError> {
    let mut conn = get_conn(adapter).await?;
    let logs: Vec<String> = conn.lrange(adapter.logs_key(job_id), 0, -1).await?;
    Ok(logs)
}

pub async fn backend_info(adapter: &RedisAdapter) -> Result<String, AdapterError> {
    let mut conn = get_conn(adapter).await?;
    let info: String = redis::cmd("INFO").query_async(&mut *conn).await?;
    Ok(info)
}

/// Decode a job hash into a [`JobRecord`].
///
/// `data` and `returnvalue` are kept as the JSON text the engine wrote;
/// [`format_field`] turns them back into JSON for display.
pub(crate) fn decode_job(
    job_id: &str,
    fields: &HashMap<String, String>,
) -> Result<JobRecord, AdapterError> {
    let run_at = fields
        .get("timestamp")
        .ok_or_else(|| AdapterError::malformed(job_id, "missing timestamp"))?
        .parse::<f64>()
        .map_err(|e| AdapterError::malformed(job_id, format!("invalid timestamp: {}", e)))?
        as i64;

    let opts = match fields.get("opts") {
        Some(raw) => serde_json::from_str::<JobOptions>(raw)
            .map_err(|e| AdapterError::malformed(job_id, format!("invalid opts: {}", e)))?,
        None => JobOptions::default(),
    };

    let mut record = JobRecord::new(
        fields
            .get("name")
            .cloned()
            .unwrap_or_else(|| DEFAULT_JOB_NAME.to_string()),
        run_at,
    )
    .with_id(job_id);

    record.lock_at = parse_millis(fields.get("processedOn"));
    record.done_at = parse_millis(fields.get("finishedOn"));
    record.lock_by = fields.get("lockedBy").cloned();
    record.attempts = fields
        .get("attemptsMade")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    record.progress = fields
        .get("progress")
        .map(|raw| serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone())))
        .unwrap_or_else(|| Value::from(0));
    record.last_error = fields.get("failedReason").filter(|r| !r.is_empty()).cloned();
    record.stacktrace = fields
        .get("stacktrace")
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default();
    record.opts = opts;
    record.payload = fields
        .get("data")
        .map(|raw| Value::String(raw.clone()))
        .unwrap_or(Value::Null);
    record.return_value = fields
        .get("returnvalue")
        .map(|raw| Value::String(raw.clone()))
        .unwrap_or(Value::Null);

    Ok(record)
}

fn parse_millis(raw: Option<&String>) -> Option<i64> {
    raw.and_then(|v| v.parse::<f64>().ok()).map(|v| v as i64)
}

/// Redis-specific display projection of one job field.
pub(crate) fn format_field(field: FormatterField, data: &Value, fallback: Option<&Value>) -> Value {
    match field {
        FormatterField::Data | FormatterField::ReturnValue => match data {
            Value::String(text) => serde_json::from_str(text).unwrap_or_else(|_| data.clone()),
            _ => fallback.unwrap_or(data).clone(),
        },
        FormatterField::Name => {
            let stored = data.get("name").and_then(Value::as_str);
            match stored {
                Some(DEFAULT_JOB_NAME) | Some("") => match data.get("id").and_then(Value::as_str) {
                    Some(id) => Value::String(format!("#{}", id)),
                    None => Value::String("default".to_string()),
                },
                Some(name) => Value::String(name.to_string()),
                None => fallback.cloned().unwrap_or(Value::Null),
            }
        }
    }
}
