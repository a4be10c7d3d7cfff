//! Configuration management
//!
//! Everything is read from the process environment (after loading `.env` via
//! `dotenvy`), falling back to the defaults below.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::notify::RetryPolicy;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/vstage";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Default publish attempts before giving up.
pub const DEFAULT_NOTIFY_MAX_ATTEMPTS: u32 = 5;

/// Default delay before the first publish retry.
pub const DEFAULT_NOTIFY_BASE_DELAY_MS: u64 = 100;

/// Default ceiling for publish retry delays.
pub const DEFAULT_NOTIFY_MAX_DELAY_MS: u64 = 2_000;

/// Default per-channel buffer of the in-process pub/sub hub.
pub const DEFAULT_LOCAL_CHANNEL_CAPACITY: usize = 64;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub notify: NotifyConfig,
    pub reconcile: ReconcileConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Status notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Redis connection string; the in-process hub is used when unset
    pub redis_url: Option<String>,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub local_channel_capacity: usize,
}

impl NotifyConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            std::time::Duration::from_millis(self.base_delay_ms),
            std::time::Duration::from_millis(self.max_delay_ms),
        )
    }
}

/// Admin reconciliation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// `RECONCILE_ENABLED=1` turns the admin endpoint on
    pub enabled: bool,
    /// `RECONCILE_CONCURRENCY`, kept only when it is a positive integer
    pub concurrency: Option<usize>,
}

impl ReconcileConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("RECONCILE_ENABLED")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            concurrency: std::env::var("RECONCILE_CONCURRENCY")
                .ok()
                .and_then(|v| parse_positive(&v)),
        }
    }
}

/// Parse a strictly positive integer, `None` for anything else
pub fn parse_positive(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("VSTAGE_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env_or("VSTAGE_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "VSTAGE_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or(
                    "DATABASE_IDLE_TIMEOUT",
                    DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                ),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
            },
            notify: NotifyConfig {
                redis_url: std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
                max_attempts: env_or("NOTIFY_MAX_ATTEMPTS", DEFAULT_NOTIFY_MAX_ATTEMPTS),
                base_delay_ms: env_or("NOTIFY_BASE_DELAY_MS", DEFAULT_NOTIFY_BASE_DELAY_MS),
                max_delay_ms: env_or("NOTIFY_MAX_DELAY_MS", DEFAULT_NOTIFY_MAX_DELAY_MS),
                local_channel_capacity: env_or(
                    "NOTIFY_LOCAL_CAPACITY",
                    DEFAULT_LOCAL_CHANNEL_CAPACITY,
                ),
            },
            reconcile: ReconcileConfig::from_env(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.notify.max_attempts == 0 {
            anyhow::bail!("NOTIFY_MAX_ATTEMPTS must be at least 1");
        }

        if self.notify.base_delay_ms > self.notify.max_delay_ms {
            anyhow::bail!(
                "NOTIFY_BASE_DELAY_MS ({}) cannot exceed NOTIFY_MAX_DELAY_MS ({})",
                self.notify.base_delay_ms,
                self.notify.max_delay_ms
            );
        }

        if self.notify.local_channel_capacity == 0 {
            anyhow::bail!("NOTIFY_LOCAL_CAPACITY must be greater than 0");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            notify: NotifyConfig {
                redis_url: None,
                max_attempts: DEFAULT_NOTIFY_MAX_ATTEMPTS,
                base_delay_ms: DEFAULT_NOTIFY_BASE_DELAY_MS,
                max_delay_ms: DEFAULT_NOTIFY_MAX_DELAY_MS,
                local_channel_capacity: DEFAULT_LOCAL_CHANNEL_CAPACITY,
            },
            reconcile: ReconcileConfig::default(),
        }
    }
}
