use serde_json::{Map, Value};

use crate::adapter::{FormatterField, JobRecord, QueueAdapter};
use crate::board::models::AppJob;

/// Project a backend job record onto the board's [`AppJob`] shape.
///
/// Timestamps, attempts and `opts.delay` are copied as they are. `name`,
/// `payload` and `returnValue` go through the adapter's
/// [`format`](QueueAdapter::format) hook, which never fails, so neither
/// does this.
pub fn format_job(record: &JobRecord, adapter: &dyn QueueAdapter) -> AppJob {
    let raw = serde_json::to_value(record).unwrap_or(Value::Null);
    let fallback_name = Value::String(record.name.clone());

    let name = match adapter.format(FormatterField::Name, &raw, Some(&fallback_name)) {
        Value::String(name) => name,
        Value::Null => record.name.clone(),
        other => other.to_string(),
    };

    AppJob {
        id: record.id.clone(),
        name,
        run_at: record.run_at,
        lock_at: record.lock_at,
        lock_by: record.lock_by.clone(),
        done_at: record.done_at,
        progress: record.progress.clone(),
        attempts: record.attempts,
        delay: record.opts.delay,
        last_error: record.last_error.clone(),
        stacktrace: record.stacktrace.clone(),
        opts: serde_json::to_value(&record.opts).unwrap_or_else(|_| Value::Object(Map::new())),
        payload: adapter.format(FormatterField::Data, &record.payload, None),
        return_value: adapter.format(FormatterField::ReturnValue, &record.return_value, None),
    }
}
