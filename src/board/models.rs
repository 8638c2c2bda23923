//! View models returned by the board.
//!
//! - [`AppJob`]: backend-agnostic projection of one job
//! - [`AppQueue`]: one queue with its counts, current page and flags
//! - [`Pagination`]: page window and page count for the current filter
//! - [`BackendHealthMetrics`]: a fixed set of backend server metrics
//! - [`QueuesResponse`]: body of the listing endpoint

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::status::JobCounts;

// ============================================================================
// AppJob
// ============================================================================

/// A job as shown on the board.
///
/// Recomputed on every fetch. `lock_at` and `done_at` appear only once the
/// backend has reached that point of the job's lifecycle; `delay` is only
/// meaningful for scheduled jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppJob {
    pub id: Option<String>,
    pub name: String,
    /// Enqueue time (epoch milliseconds)
    pub run_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_at: Option<i64>,
    /// Worker holding the job's lock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_at: Option<i64>,
    pub progress: Value,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stacktrace: Vec<String>,
    pub opts: Value,
    pub payload: Value,
    #[serde(rename = "returnValue")]
    pub return_value: Value,
}

// ============================================================================
// Pagination
// ============================================================================

/// Inclusive index window requested from a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page_count: u64,
    pub range: PageRange,
}

// ============================================================================
// AppQueue
// ============================================================================

/// One queue as shown on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppQueue {
    pub name: String,
    pub counts: JobCounts,
    /// Empty unless this is the active queue
    pub jobs: Vec<AppJob>,
    pub pagination: Pagination,
    pub read_only_mode: bool,
    pub allow_retries: bool,
    pub is_paused: bool,
}

// ============================================================================
// BackendHealthMetrics
// ============================================================================

/// Server metrics of the backend shared by every queue on the board.
///
/// Metrics the backend did not report are left out; a backend that reports
/// nothing serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendHealthMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redis_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_fragmentation_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_clients: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_clients: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_system_memory: Option<String>,
}

impl BackendHealthMetrics {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Body of the queue listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueuesResponse {
    pub stats: BackendHealthMetrics,
    pub queues: Vec<AppQueue>,
}
