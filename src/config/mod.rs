//! Typed configuration from environment variables or a TOML file.
//!
//! Loads once at startup, fails fast on values that do not parse.
//! Missing values fall back to defaults (5 workers, 10 items).

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_ITEMS: usize = 10;
pub const DEFAULT_THREAD_PREFIX: &str = "workfan-worker";

/// Settings consumed by [`WorkerPool::with_config`](crate::pool::WorkerPool::with_config).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of worker threads. Zero means queued work only runs on the caller's thread.
    pub workers: usize,
    /// Threads are named `{prefix}-{index}`.
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            thread_name_prefix: DEFAULT_THREAD_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pool: PoolConfig,
    /// How many items (or subscribers) the demo scenarios submit.
    pub items: usize,
    pub log_level: String,
    /// OTLP/HTTP base endpoint. `None` keeps telemetry local.
    pub otel_endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            items: DEFAULT_ITEMS,
            log_level: "info".to_string(),
            otel_endpoint: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Reads `WORKFAN_WORKERS`, `WORKFAN_ITEMS`, `WORKFAN_THREAD_PREFIX`,
    /// `LOG_LEVEL` and `OTEL_ENDPOINT`. In local dev, call
    /// `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            pool: PoolConfig {
                workers: count_var("WORKFAN_WORKERS")?.unwrap_or(defaults.pool.workers),
                thread_name_prefix: std::env::var("WORKFAN_THREAD_PREFIX")
                    .unwrap_or(defaults.pool.thread_name_prefix),
            },
            items: count_var("WORKFAN_ITEMS")?.unwrap_or(defaults.items),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok().filter(|v| !v.is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file. Absent keys take their defaults.
    ///
    /// ```toml
    /// items = 10
    /// log_level = "debug"
    /// otel_endpoint = "http://localhost:4318"
    ///
    /// [pool]
    /// workers = 5
    /// thread_name_prefix = "fan"
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read config {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("bad config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.pool.thread_name_prefix.is_empty() {
            return Err(Error::Config("pool.thread_name_prefix must not be empty".into()));
        }
        Ok(())
    }
}

fn count_var(name: &str) -> Result<Option<usize>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{name} must be a non-negative integer, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}
