//! Queue adapters: one binding per backend engine.
//!
//! - [`RedisAdapter`] (feature `redis`): list-based queues stored in Redis
//! - [`PostgresAdapter`] (feature `postgres`): worker-pool jobs stored in a
//!   SQL table
//!
//! Both implement [`QueueAdapter`], which is all the board depends on.

mod error;
mod traits;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "redis")]
pub mod redis;

pub use error::AdapterError;
pub use traits::{
    AdapterOptions, FormatterField, FormatterFn, Formatters, JobOptions, JobRecord, QueueAdapter,
    WorkerInfo,
};

#[cfg(feature = "postgres")]
pub use self::postgres::PostgresAdapter;
#[cfg(feature = "redis")]
pub use self::redis::{
    create_redis_pool, create_redis_pool_with_config, RedisAdapter, RedisAdapterBuilder,
    RedisPoolConfig,
};
