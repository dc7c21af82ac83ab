use crate::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub meta: Meta,
    pub database: DatabaseConfig,
}

/// Application-wide settings that are not tied to the database.
#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    /// File name prefix for the rolling log files (e.g., "campaign_app").
    pub log_prefix: String,
    /// Directory the log files are written to.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Verbosity of the file log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// The `EnvFilter` directive for this level.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Everything needed to reach the database and size the connection pool.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub connection: ConnectionConfig,
    pub pool: PoolConfig,
}

/// Standard connection parameters.
#[derive(Clone, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: String,
    pub user: String,
    /// Usually supplied through `CAMPAIGN__DATABASE__CONNECTION__PASSWORD`.
    #[serde(default)]
    pub password: String,
}

// Keeps the password out of logs.
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Connection pool policy.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Reported to the server as the `application_name` of every connection.
    pub name: String,
    /// Fixed number of connections held by the pool.
    pub size: u32,
    /// Reset session state when a connection goes back to the pool.
    #[serde(default = "default_true")]
    pub reset_session: bool,
    /// How long an operation may wait for a free connection.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// Upper bound on a single repository operation, queries included.
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
    /// Extra attempts made after a connection failure on idempotent operations.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Delay before the first retry; doubled on each further attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl PoolConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Upper bound on `database.pool.retry_attempts`.
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

impl Config {
    /// Checks values that deserialize fine but cannot work at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.meta.log_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "meta.log_prefix must not be empty".to_string(),
            ));
        }
        let conn = &self.database.connection;
        if conn.host.trim().is_empty() || conn.database.trim().is_empty() || conn.user.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.connection requires host, database and user".to_string(),
            ));
        }
        let pool = &self.database.pool;
        if pool.size == 0 {
            return Err(ConfigError::ValidationError(
                "database.pool.size must be at least 1".to_string(),
            ));
        }
        if pool.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.pool.name must not be empty".to_string(),
            ));
        }
        if pool.acquire_timeout_secs == 0 || pool.operation_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "database.pool timeouts must be greater than zero".to_string(),
            ));
        }
        if pool.retry_attempts > MAX_RETRY_ATTEMPTS {
            return Err(ConfigError::ValidationError(format!(
                "database.pool.retry_attempts must be at most {}",
                MAX_RETRY_ATTEMPTS
            )));
        }
        Ok(())
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_port() -> u16 {
    5432
}

fn default_true() -> bool {
    true
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_operation_timeout_secs() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    200
}
