#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use queue_board::adapter::{AdapterError, AdapterOptions, FormatterField, JobRecord, QueueAdapter};
use queue_board::status::{JobCounts, JobStatus};
use queue_board::QueueRegistry;
use serde_json::Value;

/// In-memory adapter that records what the board asked of it.
pub struct FakeAdapter {
    options: AdapterOptions,
    jobs: HashMap<JobStatus, Vec<Option<JobRecord>>>,
    info: String,
    logs: Vec<String>,
    paused: AtomicBool,
    pausable: bool,
    unavailable: AtomicBool,
    count_calls: AtomicUsize,
    job_requests: Mutex<Vec<(Vec<JobStatus>, usize, usize)>>,
    commands: Mutex<Vec<String>>,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self {
            options: AdapterOptions::new("test"),
            jobs: HashMap::new(),
            info: String::new(),
            logs: Vec::new(),
            paused: AtomicBool::new(false),
            pausable: true,
            unavailable: AtomicBool::new(false),
            count_calls: AtomicUsize::new(0),
            job_requests: Mutex::new(Vec::new()),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn read_only(mut self) -> Self {
        self.options.read_only_mode = true;
        self
    }

    pub fn without_retries(mut self) -> Self {
        self.options.allow_retries = false;
        self
    }

    pub fn paused(self) -> Self {
        self.paused.store(true, Ordering::SeqCst);
        self
    }

    /// Pause and resume fail the way a backend without a pause flag does.
    pub fn without_pause(mut self) -> Self {
        self.pausable = false;
        self
    }

    pub fn unavailable(self) -> Self {
        self.unavailable.store(true, Ordering::SeqCst);
        self
    }

    pub fn formatter<F>(mut self, field: FormatterField, formatter: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.options.formatters.set(field, formatter);
        self
    }

    pub fn info(mut self, info: &str) -> Self {
        self.info = info.to_string();
        self
    }

    pub fn logs(mut self, lines: &[&str]) -> Self {
        self.logs = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Add `n` jobs in `status`, ids `{status}-0` .. `{status}-{n-1}`.
    pub fn jobs(mut self, status: JobStatus, n: usize) -> Self {
        let slots = self.jobs.entry(status).or_default();
        for i in 0..n {
            let id = format!("{}-{}", status.as_str().to_lowercase(), i);
            slots.push(Some(job(&id, "send-welcome")));
        }
        self
    }

    /// Add one slot, `None` for a vanished job.
    pub fn slot(mut self, status: JobStatus, record: Option<JobRecord>) -> Self {
        self.jobs.entry(status).or_default().push(record);
        self
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    pub fn job_requests(&self) -> Vec<(Vec<JobStatus>, usize, usize)> {
        self.job_requests.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn is_paused_now(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), AdapterError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AdapterError::Unavailable("connection refused".into()));
        }
        Ok(())
    }

    fn record(&self, command: String) -> Result<(), AdapterError> {
        self.check()?;
        self.commands.lock().unwrap().push(command);
        Ok(())
    }

    fn find_job(&self, job_id: &str) -> Option<&JobRecord> {
        self.jobs
            .values()
            .flatten()
            .flatten()
            .find(|record| record.id.as_deref() == Some(job_id))
    }

    fn has_job(&self, job_id: &str) -> bool {
        self.find_job(job_id).is_some()
    }

    fn check_pausable(&self) -> Result<(), AdapterError> {
        if !self.pausable {
            return Err(AdapterError::Unsupported(
                "queue cannot be paused: workers have no pause flag".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl QueueAdapter for FakeAdapter {
    fn options(&self) -> &AdapterOptions {
        &self.options
    }

    async fn get_job_counts(&self, statuses: &[JobStatus]) -> Result<JobCounts, AdapterError> {
        self.check()?;
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        Ok(statuses.iter().fold(JobCounts::default(), |counts, status| {
            let n = self.jobs.get(status).map(Vec::len).unwrap_or(0);
            counts.with(*status, n as u64)
        }))
    }

    async fn is_paused(&self) -> Result<bool, AdapterError> {
        self.check()?;
        Ok(self.is_paused_now())
    }

    async fn get_jobs(
        &self,
        statuses: &[JobStatus],
        start: usize,
        end: usize,
    ) -> Result<Vec<Option<JobRecord>>, AdapterError> {
        self.check()?;
        self.job_requests
            .lock()
            .unwrap()
            .push((statuses.to_vec(), start, end));

        Ok(statuses
            .iter()
            .filter_map(|status| self.jobs.get(status))
            .flat_map(|slots| {
                let len = end.saturating_sub(start).saturating_add(1);
                slots.iter().skip(start).take(len).cloned()
            })
            .collect())
    }

    async fn get_job(&self, job_id: &str) -> Result<Option<JobRecord>, AdapterError> {
        self.check()?;
        Ok(self.find_job(job_id).cloned())
    }

    async fn get_backend_info(&self) -> Result<String, AdapterError> {
        self.check()?;
        Ok(self.info.clone())
    }

    async fn get_job_logs(&self, _job_id: &str) -> Result<Vec<String>, AdapterError> {
        self.check()?;
        Ok(self.logs.clone())
    }

    async fn retry_job(&self, job_id: &str) -> Result<(), AdapterError> {
        self.check()?;
        if !self.has_job(job_id) {
            return Err(AdapterError::NotFound(format!("job {} not found", job_id)));
        }
        self.record(format!("retry_job:{}", job_id))
    }

    async fn promote_job(&self, job_id: &str) -> Result<(), AdapterError> {
        self.record(format!("promote_job:{}", job_id))
    }

    async fn clean_job(&self, job_id: &str) -> Result<(), AdapterError> {
        self.record(format!("clean_job:{}", job_id))
    }

    async fn retry_all_failed(&self) -> Result<(), AdapterError> {
        self.record("retry_all_failed".into())
    }

    async fn clean_all_completed(&self) -> Result<(), AdapterError> {
        self.record("clean_all_completed".into())
    }

    async fn clean_all_failed(&self) -> Result<(), AdapterError> {
        self.record("clean_all_failed".into())
    }

    async fn clean_all_delayed(&self) -> Result<(), AdapterError> {
        self.record("clean_all_delayed".into())
    }

    async fn pause(&self) -> Result<(), AdapterError> {
        self.check_pausable()?;
        self.record("pause".into())?;
        self.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn resume(&self) -> Result<(), AdapterError> {
        self.check_pausable()?;
        self.record("resume".into())?;
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }
}

pub fn job(id: &str, name: &str) -> JobRecord {
    JobRecord::new(name, 1_700_000_000_000).with_id(id)
}

pub fn registry(queues: &[(&str, &Arc<FakeAdapter>)]) -> QueueRegistry {
    queues
        .iter()
        .fold(QueueRegistry::new(), |registry, (name, adapter)| {
            registry.with_queue(*name, Arc::clone(adapter) as Arc<dyn QueueAdapter>)
        })
}
