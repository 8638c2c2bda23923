//! Cross-backend aggregation layer.
//!
//! This module provides:
//! - [`QueueRegistry`]: the ordered set of queues shown on the board
//! - [`build_board`], [`build_queue_views`], [`fetch_health_metrics`]: the
//!   listing, assembled from every adapter
//! - [`format_job`] and [`compute_pagination`]: per-job projection and page
//!   windows
//! - [`actions`]: control commands routed by queue name
//! - [`handlers`]: framework-agnostic request handlers
//! - [`board_api`]: an axum router over the handlers (feature `axum-ui`)

pub mod actions;
mod aggregator;
mod error;
mod format;
pub mod handlers;
mod models;
mod pagination;
mod registry;
mod stats;
pub mod ui;

pub use actions::{CleanTarget, QueueAction};
pub use aggregator::{
    build_board, build_queue_views, decode_queue_name, fetch_health_metrics, BoardQuery,
};
pub use error::BoardError;
pub use format::format_job;
pub use handlers::{BoardRequest, ControllerResponse};
pub use models::{
    AppJob, AppQueue, BackendHealthMetrics, PageRange, Pagination, QueuesResponse,
};
pub use pagination::{compute_pagination, pagination_total, PAGE_SIZE};
pub use registry::QueueRegistry;
pub use stats::parse_backend_info;

#[cfg(feature = "axum-ui")]
pub use ui::board_api;
