//! Configuration for the search index subsystem.
//!
//! All sections have serde defaults so an empty (or absent) TOML file
//! yields a working configuration. Retry/backoff and worker limits here
//! are the knobs the job transport consumes; they are configuration, not
//! policy invented by the queue.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

impl Config {
    /// Load configuration from a TOML file, or defaults if `path` is None.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .map_err(|err| SearchError::Config(format!("read config {}: {err}", path.display())))?;
        toml::from_str(&raw)
            .map_err(|err| SearchError::Config(format!("parse config {}: {err}", path.display())))
    }
}

/// Worker pool sizing and throughput limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Number of concurrent workers draining the job channel.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Token-bucket dispatch cap, jobs per second.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            rate_limit: default_rate_limit(),
        }
    }
}

/// Retry policy for failed sync jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per job, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay for exponential backoff (doubles per attempt, jittered).
    #[serde(default = "default_backoff", with = "humantime_serde")]
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: default_backoff(),
        }
    }
}

impl RetryConfig {
    /// Backoff before retry `attempt` (1-based): base * 2^(attempt-1).
    /// Jitter is applied by the worker, not here.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1)).min(64);
        self.backoff.saturating_mul(factor)
    }
}

/// Query engine defaults and cache sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_page_size")]
    pub default_limit: usize,
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
    #[serde(default = "default_popular_limit")]
    pub popular_limit: usize,
    /// Entries in the search-response LRU cache. Zero disables caching.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_size(),
            suggestion_limit: default_suggestion_limit(),
            popular_limit: default_popular_limit(),
            cache_size: default_cache_size(),
        }
    }
}

fn default_concurrency() -> usize {
    5
}

fn default_rate_limit() -> u32 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> Duration {
    Duration::from_millis(500)
}

fn default_page_size() -> usize {
    20
}

fn default_suggestion_limit() -> usize {
    5
}

fn default_popular_limit() -> usize {
    10
}

fn default_cache_size() -> usize {
    128
}
