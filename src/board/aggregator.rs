//! Turns the registered adapters into one board response.
//!
//! Every queue reports its counts and pause flag on every request, since they
//! drive the navigation badges. Only the active queue fetches job bodies.
//! Queues are fetched concurrently and any single failure fails the whole
//! response.

use futures::future::try_join_all;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::adapter::{AdapterError, QueueAdapter};
use crate::board::format::format_job;
use crate::board::models::{AppJob, AppQueue, BackendHealthMetrics, QueuesResponse};
use crate::board::pagination::compute_pagination;
use crate::board::registry::QueueRegistry;
use crate::board::stats::parse_backend_info;
use crate::status::{JobStatus, StatusFilter};

/// What the caller is looking at.
///
/// Deserialized from the query string (`?activeQueue=emails&status=Failed&page=2`).
/// Values are kept raw and interpreted leniently by the accessors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardQuery {
    pub active_queue: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
}

impl BoardQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_queue(mut self, name: impl Into<String>) -> Self {
        self.active_queue = Some(name.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page.to_string());
        self
    }

    /// Requested status filter; missing or unknown values mean latest.
    pub fn status_filter(&self) -> StatusFilter {
        let Some(raw) = self.status.as_deref() else {
            return StatusFilter::Latest;
        };
        raw.parse().unwrap_or_else(|e| {
            warn!(status = %raw, error = %e, "unknown status filter, showing latest");
            StatusFilter::Latest
        })
    }

    /// Requested page, at least 1.
    pub fn current_page(&self) -> u64 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
    }

    /// Percent-decoded name of the active queue.
    pub fn active_queue_name(&self) -> Option<String> {
        self.active_queue.as_deref().map(decode_queue_name)
    }
}

/// Decode `%XX` escapes in a queue name taken from a URL.
///
/// `+` is left alone. Malformed escapes are kept literally; if the decoded
/// bytes are not UTF-8 the raw input is returned.
pub fn decode_queue_name(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                decoded.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8(decoded).unwrap_or_else(|_| raw.to_string())
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Build the view of every registered queue, in registration order.
pub async fn build_queue_views(
    registry: &QueueRegistry,
    query: &BoardQuery,
) -> Result<Vec<AppQueue>, AdapterError> {
    let active = query.active_queue_name();
    let filter = query.status_filter();
    let page = query.current_page();

    try_join_all(registry.iter().map(|(name, adapter)| {
        let is_active = active.as_deref() == Some(name);
        build_queue_view(name, adapter.as_ref(), is_active, filter, page)
    }))
    .await
}

async fn build_queue_view(
    name: &str,
    adapter: &dyn QueueAdapter,
    is_active: bool,
    filter: StatusFilter,
    page: u64,
) -> Result<AppQueue, AdapterError> {
    let filter = if is_active { filter } else { StatusFilter::Latest };

    let (counts, is_paused) = tokio::try_join!(
        adapter.get_job_counts(&JobStatus::ALL),
        adapter.is_paused()
    )?;

    let pagination = compute_pagination(filter, &counts, page);

    let jobs: Vec<AppJob> = if is_active {
        adapter
            .get_jobs(filter.statuses(), pagination.range.start, pagination.range.end)
            .await?
            .into_iter()
            .flatten()
            .map(|record| format_job(&record, adapter))
            .collect()
    } else {
        Vec::new()
    };

    debug!(
        queue = %name,
        active = is_active,
        status = %filter,
        jobs = jobs.len(),
        "queue view built"
    );

    Ok(AppQueue {
        name: name.to_string(),
        counts,
        jobs,
        pagination,
        read_only_mode: adapter.read_only_mode(),
        allow_retries: adapter.allow_retries(),
        is_paused,
    })
}

/// Server metrics of the board's backend.
///
/// Precondition: every registered queue lives on the same backend instance.
/// Metrics are read from the first registered queue only; with queues on
/// different instances the others are simply not represented. An empty
/// registry yields empty metrics.
pub async fn fetch_health_metrics(
    registry: &QueueRegistry,
) -> Result<BackendHealthMetrics, AdapterError> {
    match registry.first() {
        Some((_, adapter)) => {
            let info = adapter.get_backend_info().await?;
            Ok(parse_backend_info(&info))
        }
        None => Ok(BackendHealthMetrics::default()),
    }
}

/// Metrics and queue views for one request, fetched concurrently.
pub async fn build_board(
    registry: &QueueRegistry,
    query: &BoardQuery,
) -> Result<QueuesResponse, AdapterError> {
    let (stats, queues) = tokio::try_join!(
        fetch_health_metrics(registry),
        build_queue_views(registry, query)
    )?;
    Ok(QueuesResponse { stats, queues })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_percent_escapes() {
        assert_eq!(decode_queue_name("emails"), "emails");
        assert_eq!(decode_queue_name("mail%3Aoutbound"), "mail:outbound");
        assert_eq!(decode_queue_name("caf%C3%A9"), "café");
        assert_eq!(decode_queue_name("a+b"), "a+b");
        assert_eq!(decode_queue_name("100%"), "100%");
        assert_eq!(decode_queue_name("%zz"), "%zz");
        assert_eq!(decode_queue_name("%FF"), "%FF");
    }

    #[test]
    fn page_is_lenient() {
        assert_eq!(BoardQuery::new().current_page(), 1);
        assert_eq!(BoardQuery::new().page(3).current_page(), 3);
        assert_eq!(BoardQuery::new().page(0).current_page(), 1);

        let garbage = BoardQuery {
            page: Some("two".into()),
            ..BoardQuery::default()
        };
        assert_eq!(garbage.current_page(), 1);
    }

    #[test]
    fn unknown_status_means_latest() {
        assert_eq!(BoardQuery::new().status_filter(), StatusFilter::Latest);
        assert_eq!(
            BoardQuery::new().status("failed").status_filter(),
            StatusFilter::Only(JobStatus::Failed)
        );
        assert_eq!(
            BoardQuery::new().status("archived").status_filter(),
            StatusFilter::Latest
        );
    }

    #[test]
    fn query_deserializes_from_camel_case() {
        let query: BoardQuery = serde_json::from_value(serde_json::json!({
            "activeQueue": "emails",
            "status": "Failed",
            "page": "2"
        }))
        .unwrap();

        assert_eq!(query.active_queue_name().as_deref(), Some("emails"));
        assert_eq!(query.current_page(), 2);
    }
}
