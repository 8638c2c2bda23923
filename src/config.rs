//! Board configuration.
//!
//! A board is described by the queues it shows and the backend each queue
//! lives on. Configuration is read from a JSON document:
//!
//! ```json
//! {
//!   "queues": [
//!     { "name": "emails", "backend": { "kind": "redis", "url": "redis://127.0.0.1:6379" } },
//!     { "name": "reports", "read_only_mode": true,
//!       "backend": { "kind": "redis", "url": "redis://127.0.0.1:6379" } },
//!     { "name": "billing::Invoice", "prefix": "apalis",
//!       "backend": { "kind": "postgres", "url": "postgres://localhost/jobs" } }
//!   ],
//!   "redis_pool": { "max_size": 8 }
//! }
//! ```
//!
//! or, for a Redis-only board, from environment variables (see
//! [`BoardConfig::from_env`]).

#[cfg(any(feature = "redis", feature = "postgres"))]
use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::adapter::{AdapterError, AdapterOptions, QueueAdapter};
use crate::board::QueueRegistry;

#[cfg(feature = "redis")]
use bb8_redis::{bb8::Pool, RedisConnectionManager};
#[cfg(feature = "postgres")]
use sqlx::PgPool;

#[cfg(feature = "postgres")]
use crate::adapter::postgres::{connect_pool, PostgresAdapter};
#[cfg(feature = "redis")]
use crate::adapter::{create_redis_pool_with_config, RedisAdapter, RedisPoolConfig};

pub const CONFIG_PATH_ENV: &str = "QUEUE_BOARD_CONFIG";
pub const REDIS_URL_ENV: &str = "REDIS_URL";
pub const QUEUES_ENV: &str = "QUEUE_BOARD_QUEUES";
pub const READ_ONLY_ENV: &str = "QUEUE_BOARD_READ_ONLY";
pub const ALLOW_RETRIES_ENV: &str = "QUEUE_BOARD_ALLOW_RETRIES";
pub const PREFIX_ENV: &str = "QUEUE_BOARD_PREFIX";

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Backend a queue lives on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    Redis {
        url: String,
    },
    Postgres {
        url: String,
        #[serde(default = "default_pg_pool_size")]
        pool_size: u32,
    },
}

fn default_pg_pool_size() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

/// One queue shown on the board.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueueConfig {
    /// Queue name as the backend knows it (job type for worker pools)
    pub name: String,
    pub backend: BackendConfig,
    #[serde(default)]
    pub read_only_mode: bool,
    #[serde(default = "default_true")]
    pub allow_retries: bool,
    /// Key prefix (Redis) or schema (Postgres); backend default when absent
    #[serde(default)]
    pub prefix: Option<String>,
}

impl QueueConfig {
    pub fn redis(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            backend: BackendConfig::Redis { url: url.into() },
            read_only_mode: false,
            allow_retries: true,
            prefix: None,
        }
    }

    fn adapter_options(&self, default_prefix: &str) -> AdapterOptions {
        AdapterOptions::new(self.prefix.as_deref().unwrap_or(default_prefix))
            .read_only(self.read_only_mode)
            .allow_retries(self.allow_retries)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardConfig {
    pub queues: Vec<QueueConfig>,
    #[cfg(feature = "redis")]
    #[serde(default)]
    pub redis_pool: RedisPoolConfig,
}

impl BoardConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: BoardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from the process environment.
    ///
    /// If `QUEUE_BOARD_CONFIG` is set it names a JSON file. Otherwise a
    /// Redis-only board is built from `QUEUE_BOARD_QUEUES` (comma separated,
    /// required), `REDIS_URL`, `QUEUE_BOARD_PREFIX`, `QUEUE_BOARD_READ_ONLY`
    /// and `QUEUE_BOARD_ALLOW_RETRIES`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(CONFIG_PATH_ENV) {
            return Self::from_file(path);
        }

        let names = lookup(QUEUES_ENV)
            .ok_or_else(|| ConfigError::Missing(format!("{} is not set", QUEUES_ENV)))?;
        let url = lookup(REDIS_URL_ENV).unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());
        let prefix = lookup(PREFIX_ENV).filter(|p| !p.is_empty());
        let read_only_mode = parse_flag(READ_ONLY_ENV, lookup(READ_ONLY_ENV), false)?;
        let allow_retries = parse_flag(ALLOW_RETRIES_ENV, lookup(ALLOW_RETRIES_ENV), true)?;

        let queues: Vec<QueueConfig> = names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| QueueConfig {
                read_only_mode,
                allow_retries,
                prefix: prefix.clone(),
                ..QueueConfig::redis(name, url.clone())
            })
            .collect();

        if queues.is_empty() {
            return Err(ConfigError::Missing(format!("{} lists no queues", QUEUES_ENV)));
        }

        let config = BoardConfig {
            queues,
            ..BoardConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for queue in &self.queues {
            if queue.name.trim().is_empty() {
                return Err(ConfigError::Invalid("queue name cannot be empty".into()));
            }
            if !seen.insert(queue.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "queue {} is configured twice",
                    queue.name
                )));
            }
            if let BackendConfig::Postgres { pool_size: 0, .. } = queue.backend {
                return Err(ConfigError::Invalid(format!(
                    "queue {}: pool_size must be > 0",
                    queue.name
                )));
            }
        }
        Ok(())
    }

    /// Connect every configured queue and register it in order.
    ///
    /// Queues on the same backend URL share one connection pool.
    pub async fn connect(&self) -> Result<QueueRegistry, AdapterError> {
        #[cfg(feature = "redis")]
        let mut redis_pools: HashMap<String, Pool<RedisConnectionManager>> = HashMap::new();
        #[cfg(feature = "postgres")]
        let mut pg_pools: HashMap<String, PgPool> = HashMap::new();

        let mut registry = QueueRegistry::new();

        for queue in &self.queues {
            let adapter: Arc<dyn QueueAdapter> = match &queue.backend {
                #[cfg(feature = "redis")]
                BackendConfig::Redis { url } => {
                    let pool = match redis_pools.get(url) {
                        Some(pool) => pool.clone(),
                        None => {
                            let pool = create_redis_pool_with_config(url, self.redis_pool).await?;
                            redis_pools.insert(url.clone(), pool.clone());
                            pool
                        }
                    };
                    Arc::new(RedisAdapter::new(
                        pool,
                        queue.name.clone(),
                        queue.adapter_options(RedisAdapter::DEFAULT_PREFIX),
                    ))
                }
                #[cfg(feature = "postgres")]
                BackendConfig::Postgres { url, pool_size } => {
                    let pool = match pg_pools.get(url) {
                        Some(pool) => pool.clone(),
                        None => {
                            let pool = connect_pool(url, *pool_size).await?;
                            pg_pools.insert(url.clone(), pool.clone());
                            pool
                        }
                    };
                    Arc::new(
                        PostgresAdapter::new(
                            pool,
                            queue.name.clone(),
                            queue.adapter_options(PostgresAdapter::DEFAULT_SCHEMA),
                        )
                        .await?,
                    )
                }
                #[allow(unreachable_patterns)]
                other => {
                    return Err(AdapterError::Configuration(format!(
                        "queue {}: backend {} is not enabled in this build",
                        queue.name,
                        backend_kind(other)
                    )))
                }
            };

            info!(
                queue = %queue.name,
                backend = backend_kind(&queue.backend),
                read_only = queue.read_only_mode,
                "queue registered"
            );
            registry.add(queue.name.clone(), adapter);
        }

        Ok(registry)
    }
}

fn backend_kind(backend: &BackendConfig) -> &'static str {
    match backend {
        BackendConfig::Redis { .. } => "redis",
        BackendConfig::Postgres { .. } => "postgres",
    }
}

fn parse_flag(key: &str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid(format!(
            "{} must be a boolean, got {}",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn parses_mixed_backends() {
        let config = BoardConfig::from_json(
            r#"{
                "queues": [
                    { "name": "emails", "backend": { "kind": "redis", "url": "redis://r:6379" } },
                    { "name": "billing::Invoice", "read_only_mode": true, "prefix": "jobs",
                      "backend": { "kind": "postgres", "url": "postgres://db/jobs" } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.queues.len(), 2);
        assert!(config.queues[0].allow_retries);
        assert!(!config.queues[0].read_only_mode);
        assert_eq!(
            config.queues[1].backend,
            BackendConfig::Postgres {
                url: "postgres://db/jobs".into(),
                pool_size: 5
            }
        );
        assert!(config.queues[1].read_only_mode);
        assert_eq!(config.queues[1].prefix.as_deref(), Some("jobs"));
    }

    #[test]
    fn rejects_duplicate_queue_names() {
        let err = BoardConfig::from_json(
            r#"{"queues": [
                { "name": "emails", "backend": { "kind": "redis", "url": "redis://a" } },
                { "name": "emails", "backend": { "kind": "redis", "url": "redis://b" } }
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_backend_kind() {
        let err = BoardConfig::from_json(
            r#"{"queues": [{ "name": "q", "backend": { "kind": "sqs", "url": "x" } }]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn builds_redis_board_from_env() {
        let config = BoardConfig::from_lookup(lookup(&[
            (QUEUES_ENV, "emails, reports,,"),
            (REDIS_URL_ENV, "redis://cache:6379"),
            (READ_ONLY_ENV, "true"),
            (PREFIX_ENV, "myapp"),
        ]))
        .unwrap();

        let names: Vec<_> = config.queues.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, ["emails", "reports"]);
        for queue in &config.queues {
            assert!(queue.read_only_mode);
            assert!(queue.allow_retries);
            assert_eq!(queue.prefix.as_deref(), Some("myapp"));
            assert_eq!(
                queue.backend,
                BackendConfig::Redis {
                    url: "redis://cache:6379".into()
                }
            );
        }
    }

    #[test]
    fn env_requires_queue_list() {
        let err = BoardConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));

        let err = BoardConfig::from_lookup(lookup(&[(QUEUES_ENV, " , ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn env_flags_must_be_boolean() {
        let err = BoardConfig::from_lookup(lookup(&[
            (QUEUES_ENV, "emails"),
            (ALLOW_RETRIES_ENV, "sometimes"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn queue_options_fall_back_to_backend_prefix() {
        let queue = QueueConfig::redis("emails", DEFAULT_REDIS_URL);
        let options = queue.adapter_options("bull");
        assert_eq!(options.prefix, "bull");
        assert!(options.allow_retries);
    }
}
