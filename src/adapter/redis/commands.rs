//! Command operations for the Redis adapter.
//!
//! Moves between statuses run as Lua scripts so a job is never visible in
//! two statuses, or in none, while it moves.

use redis::AsyncCommands;
use tracing::info;

use super::inspection::get_conn;
use super::{status_store, status_suffix, RedisAdapter, StatusStore};
use crate::adapter::error::AdapterError;
use crate::status::JobStatus;

/// Returned by the move scripts when the job hash does not exist.
const MISSING_JOB: i64 = -1;

// Re-queued jobs drop the fields describing their previous run.
// KEYS: job hash, failed, killed, wait. ARGV: job id.
const RETRY_JOB_LUA: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then return -1 end
local moved = redis.call('ZREM', KEYS[2], ARGV[1]) + redis.call('ZREM', KEYS[3], ARGV[1])
if moved > 0 then
  redis.call('HDEL', KEYS[1], 'processedOn', 'finishedOn', 'failedReason', 'stacktrace', 'lockedBy')
  redis.call('LPUSH', KEYS[4], ARGV[1])
end
return moved
"#;

// KEYS: job hash, delayed, wait. ARGV: job id.
const PROMOTE_JOB_LUA: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then return -1 end
local moved = redis.call('ZREM', KEYS[2], ARGV[1])
if moved > 0 then
  redis.call('LPUSH', KEYS[3], ARGV[1])
end
return moved
"#;

// KEYS: failed, wait. ARGV: job key prefix.
const RETRY_ALL_FAILED_LUA: &str = r#"
local ids = redis.call('ZRANGE', KEYS[1], 0, -1)
for _, id in ipairs(ids) do
  redis.call('HDEL', ARGV[1] .. id, 'processedOn', 'finishedOn', 'failedReason', 'stacktrace', 'lockedBy')
  redis.call('LPUSH', KEYS[2], id)
end
redis.call('DEL', KEYS[1])
return #ids
"#;

// KEYS: status zset. ARGV: job key prefix.
const CLEAN_SET_LUA: &str = r#"
local ids = redis.call('ZRANGE', KEYS[1], 0, -1)
for _, id in ipairs(ids) do
  redis.call('DEL', ARGV[1] .. id, ARGV[1] .. id .. ':logs')
end
redis.call('DEL', KEYS[1])
return #ids
"#;

pub async fn retry_job(adapter: &RedisAdapter, job_id: &str) -> Result<(), AdapterError> {
    let mut conn = get_conn(adapter).await?;
    let moved: i64 = redis::cmd("EVAL")
        .arg(RETRY_JOB_LUA)
        .arg(4)
        .arg(adapter.job_key(job_id))
        .arg(adapter.status_key(JobStatus::Failed))
        .arg(adapter.status_key(JobStatus::Killed))
        .arg(adapter.status_key(JobStatus::Pending))
        .arg(job_id)
        .query_async(&mut *conn)
        .await?;

    report_move(adapter, job_id, moved, "retried")
}

pub async fn promote_job(adapter: &RedisAdapter, job_id: &str) -> Result<(), AdapterError> {
    let mut conn = get_conn(adapter).await?;
    let moved: i64 = redis::cmd("EVAL")
        .arg(PROMOTE_JOB_LUA)
        .arg(3)
        .arg(adapter.job_key(job_id))
        .arg(adapter.status_key(JobStatus::Scheduled))
        .arg(adapter.status_key(JobStatus::Pending))
        .arg(job_id)
        .query_async(&mut *conn)
        .await?;

    report_move(adapter, job_id, moved, "promoted")
}

fn report_move(
    adapter: &RedisAdapter,
    job_id: &str,
    moved: i64,
    action: &str,
) -> Result<(), AdapterError> {
    match moved {
        MISSING_JOB => Err(AdapterError::NotFound(format!(
            "job {} in queue {}",
            job_id,
            adapter.queue_name()
        ))),
        0 => {
            // Already out of the source status; duplicate clicks land here.
            tracing::debug!(queue = %adapter.queue_name(), job_id = %job_id, action, "nothing to move");
            Ok(())
        }
        _ => {
            info!(queue = %adapter.queue_name(), job_id = %job_id, action, "job moved to wait");
            Ok(())
        }
    }
}

pub async fn clean_job(adapter: &RedisAdapter, job_id: &str) -> Result<(), AdapterError> {
    let mut conn = get_conn(adapter).await?;
    let mut pipe = redis::pipe();
    pipe.atomic();
    for status in JobStatus::ALL {
        let key = adapter.status_key(status);
        match status_store(status) {
            StatusStore::List => pipe.lrem(key, 0, job_id).ignore(),
            StatusStore::SortedSet => pipe.zrem(key, job_id).ignore(),
        };
    }
    pipe.del(adapter.job_key(job_id)).ignore();
    pipe.del(adapter.logs_key(job_id)).ignore();
    pipe.query_async::<_, ()>(&mut *conn).await?;

    info!(queue = %adapter.queue_name(), job_id = %job_id, "job cleaned");
    Ok(())
}

pub async fn retry_all_failed(adapter: &RedisAdapter) -> Result<(), AdapterError> {
    let mut conn = get_conn(adapter).await?;
    let retried: i64 = redis::cmd("EVAL")
        .arg(RETRY_ALL_FAILED_LUA)
        .arg(2)
        .arg(adapter.status_key(JobStatus::Failed))
        .arg(adapter.status_key(JobStatus::Pending))
        .arg(adapter.job_key_prefix())
        .query_async(&mut *conn)
        .await?;

    info!(queue = %adapter.queue_name(), retried, "retried all failed jobs");
    Ok(())
}

/// Remove every job in a sorted-set status along with its hash and logs.
pub async fn clean_all(adapter: &RedisAdapter, status: JobStatus) -> Result<(), AdapterError> {
    let mut conn = get_conn(adapter).await?;
    let removed: i64 = redis::cmd("EVAL")
        .arg(CLEAN_SET_LUA)
        .arg(1)
        .arg(adapter.status_key(status))
        .arg(adapter.job_key_prefix())
        .query_async(&mut *conn)
        .await?;

    info!(
        queue = %adapter.queue_name(),
        status = status_suffix(status),
        removed,
        "cleaned jobs"
    );
    Ok(())
}

pub async fn set_paused(adapter: &RedisAdapter, paused: bool) -> Result<(), AdapterError> {
    let mut conn = get_conn(adapter).await?;
    if paused {
        conn.hset::<_, _, _, ()>(adapter.meta_key(), "paused", 1).await?;
    } else {
        conn.hdel::<_, _, ()>(adapter.meta_key(), "paused").await?;
    }

    info!(queue = %adapter.queue_name(), paused, "queue pause flag updated");
    Ok(())
}
