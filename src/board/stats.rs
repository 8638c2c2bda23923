//! Backend health metrics from `INFO` text.

use std::collections::HashMap;

use crate::board::models::BackendHealthMetrics;

/// Parse `INFO`-style diagnostic text into [`BackendHealthMetrics`].
///
/// The text is `key:value` lines grouped under `# Section` headers. Unknown
/// keys are ignored and empty text yields empty metrics.
pub fn parse_backend_info(info: &str) -> BackendHealthMetrics {
    let fields: HashMap<&str, &str> = info
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .collect();

    let field = |key: &str| fields.get(key).map(|value| value.to_string());

    BackendHealthMetrics {
        redis_version: field("redis_version"),
        used_memory: field("used_memory"),
        mem_fragmentation_ratio: field("mem_fragmentation_ratio"),
        connected_clients: field("connected_clients"),
        blocked_clients: field("blocked_clients"),
        total_system_memory: field("total_system_memory").or_else(|| field("maxmemory")),
    }
}
