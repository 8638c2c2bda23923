//! # queue-board
//!
//! Read/control dashboard layer for background job queues.
//!
//! An operator sees, across any number of named queues, how many jobs are in
//! each lifecycle state, pages through job lists and issues control actions
//! (retry, promote, clean, pause, resume) without talking to the backend
//! directly.
//!
//! # Architecture
//!
//! - [`status`]: the closed set of job states and the synthetic "latest" view
//! - [`adapter`]: the [`QueueAdapter`](adapter::QueueAdapter) contract and its
//!   Redis and Postgres bindings
//! - [`board`]: aggregation of many adapters into one response, control
//!   actions and HTTP handlers
//! - [`config`]: configuration loading and adapter construction
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use queue_board::{board_api, BoardConfig};
//!
//! let config = BoardConfig::from_env()?;
//! let registry = config.connect().await?;
//! let app = axum::Router::new().nest("/api", board_api(Arc::new(registry)));
//! ```
//!
//! # Feature Flags
//!
//! - `redis` (default): Redis adapter
//! - `postgres`: worker-pool adapter over Postgres
//! - `axum-ui` (default): axum router for the board API

pub mod adapter;
pub mod board;
pub mod config;
pub mod status;

pub use adapter::{AdapterError, AdapterOptions, FormatterField, JobRecord, QueueAdapter};
pub use board::{
    build_board, AppJob, AppQueue, BackendHealthMetrics, BoardError, BoardQuery, QueueRegistry,
    QueuesResponse,
};
pub use config::{BoardConfig, ConfigError, QueueConfig};
pub use status::{JobCounts, JobStatus, StatusFilter};

#[cfg(feature = "redis")]
pub use adapter::RedisAdapter;

#[cfg(feature = "postgres")]
pub use adapter::PostgresAdapter;

#[cfg(feature = "axum-ui")]
pub use board::board_api;
