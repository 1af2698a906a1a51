//! Connection pool setup.
//!
//! The pool is sized for a small worker fleet rather than a request-serving
//! tier; every consumer in this workspace goes through [`PoolConfig`] so
//! deployments can tune it with `SIFT_DB_*` environment variables.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use sift_core::{Error, Result};

/// Pool sizing and timeout settings.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Upper bound on open connections.
    pub max_connections: u32,
    /// Connections kept warm even when idle.
    pub min_connections: u32,
    /// How long an acquire may wait before erroring.
    pub acquire_timeout: Duration,
    /// Idle connections are closed after this long.
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 8,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl PoolConfig {
    /// Build a configuration from `SIFT_DB_MAX_CONNECTIONS`,
    /// `SIFT_DB_MIN_CONNECTIONS`, and `SIFT_DB_ACQUIRE_TIMEOUT_SECS`,
    /// falling back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        fn env_u32(key: &str) -> Option<u32> {
            std::env::var(key).ok().and_then(|v| v.parse().ok())
        }

        Self {
            max_connections: env_u32("SIFT_DB_MAX_CONNECTIONS")
                .unwrap_or(defaults.max_connections),
            min_connections: env_u32("SIFT_DB_MIN_CONNECTIONS")
                .unwrap_or(defaults.min_connections),
            acquire_timeout: env_u32("SIFT_DB_ACQUIRE_TIMEOUT_SECS")
                .map(|s| Duration::from_secs(s as u64))
                .unwrap_or(defaults.acquire_timeout),
            idle_timeout: defaults.idle_timeout,
        }
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn min_connections(mut self, n: u32) -> Self {
        self.min_connections = n;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}

/// Connect with default configuration.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::default()).await
}

/// Connect with the given configuration.
pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let start = Instant::now();

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        max_connections = config.max_connections,
        pool_size = pool.size(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Database connection pool established"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = PoolConfig::default()
            .max_connections(20)
            .min_connections(5)
            .acquire_timeout(Duration::from_secs(5));

        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 5);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_env_ignores_garbage() {
        // Unset or unparseable variables fall back to defaults; the worker
        // must come up even with a broken environment.
        std::env::set_var("SIFT_DB_MAX_CONNECTIONS", "not-a-number");
        let config = PoolConfig::from_env();
        assert_eq!(config.max_connections, PoolConfig::default().max_connections);
        std::env::remove_var("SIFT_DB_MAX_CONNECTIONS");
    }
}
