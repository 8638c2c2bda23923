//! Job lifecycle vocabulary shared by every adapter and the aggregation layer.
//!
//! - [`JobStatus`]: the closed set of real states a job can be in
//! - [`StatusFilter`]: what a caller asks to see, either one real status or
//!   the synthetic "latest" view over all of them
//! - [`JobCounts`]: per-status job counts for one queue

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A job's real lifecycle state.
///
/// Every job is in exactly one of these at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Running,
    Done,
    Scheduled,
    Failed,
    Killed,
    Pending,
}

impl JobStatus {
    /// All real statuses, in the order the combined view lists them.
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Running,
        JobStatus::Done,
        JobStatus::Scheduled,
        JobStatus::Failed,
        JobStatus::Killed,
        JobStatus::Pending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "Running",
            JobStatus::Done => "Done",
            JobStatus::Scheduled => "Scheduled",
            JobStatus::Failed => "Failed",
            JobStatus::Killed => "Killed",
            JobStatus::Pending => "Pending",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// The status selection a caller requested.
///
/// `Latest` is a query selector only. It is never stored on a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    Latest,
    Only(JobStatus),
}

impl StatusFilter {
    pub const LATEST: &'static str = "latest";

    /// The real statuses covered by this selection.
    pub fn statuses(&self) -> &[JobStatus] {
        match self {
            StatusFilter::Latest => &JobStatus::ALL,
            StatusFilter::Only(status) => std::slice::from_ref(status),
        }
    }

    pub fn is_latest(&self) -> bool {
        matches!(self, StatusFilter::Latest)
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::Latest => f.write_str(Self::LATEST),
            StatusFilter::Only(status) => status.fmt(f),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(Self::LATEST) {
            return Ok(StatusFilter::Latest);
        }
        s.parse().map(StatusFilter::Only)
    }
}

impl From<JobStatus> for StatusFilter {
    fn from(status: JobStatus) -> Self {
        StatusFilter::Only(status)
    }
}

/// Number of jobs in each real status for one queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobCounts {
    pub running: u64,
    pub done: u64,
    pub scheduled: u64,
    pub failed: u64,
    pub killed: u64,
    pub pending: u64,
}

impl JobCounts {
    pub fn get(&self, status: JobStatus) -> u64 {
        match status {
            JobStatus::Running => self.running,
            JobStatus::Done => self.done,
            JobStatus::Scheduled => self.scheduled,
            JobStatus::Failed => self.failed,
            JobStatus::Killed => self.killed,
            JobStatus::Pending => self.pending,
        }
    }

    pub fn set(&mut self, status: JobStatus, count: u64) {
        let slot = match status {
            JobStatus::Running => &mut self.running,
            JobStatus::Done => &mut self.done,
            JobStatus::Scheduled => &mut self.scheduled,
            JobStatus::Failed => &mut self.failed,
            JobStatus::Killed => &mut self.killed,
            JobStatus::Pending => &mut self.pending,
        };
        *slot = count;
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, status: JobStatus, count: u64) -> Self {
        self.set(status, count);
        self
    }

    pub fn total(&self) -> u64 {
        JobStatus::ALL.iter().map(|status| self.get(*status)).sum()
    }
}
