use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use draftline_core::job_key::JobKeyStrategy;

/// Default upload body limit: 50 MiB.
pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 50 * 1024 * 1024;

/// A configuration value that could not be used.
#[derive(Debug, thiserror::Error)]
#[error("Invalid value '{value}' for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Settings for the result consumer loop.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Sleep between polls while the result queue is empty.
    pub poll_interval: Duration,
    /// Maximum number of results handled at the same time.
    pub concurrency: usize,
    /// How long a claimed result stays hidden before redelivery.
    pub visibility_timeout: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            concurrency: 4,
            visibility_timeout: Duration::from_secs(30),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Directory uploaded drawings are written to (default: `uploads`).
    pub upload_dir: PathBuf,
    /// Largest accepted upload body in bytes (default: 50 MiB).
    pub upload_max_bytes: usize,
    /// Dedup key policy for submitted jobs (default: per entity).
    pub job_key_strategy: JobKeyStrategy,
    pub consumer: ConsumerConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `3000`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `30`                    |
    /// | `UPLOAD_DIR`              | `uploads`               |
    /// | `UPLOAD_MAX_BYTES`        | `52428800`              |
    /// | `JOB_KEY_STRATEGY`        | `per_entity`            |
    /// | `RESULT_POLL_INTERVAL_MS` | `500`                   |
    /// | `RESULT_CONCURRENCY`      | `4`                     |
    /// | `RESULT_VISIBILITY_SECS`  | `30`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("HOST", "0.0.0.0".to_string())?;
        let port: u16 = env_or("PORT", 3000)?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in &cors_origins {
            HeaderValue::from_str(origin).map_err(|e| ConfigError {
                var: "CORS_ORIGINS",
                value: origin.clone(),
                reason: e.to_string(),
            })?;
        }

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 30)?;
        let shutdown_timeout_secs: u64 = env_or("SHUTDOWN_TIMEOUT_SECS", 30)?;
        let upload_dir: PathBuf = env_or("UPLOAD_DIR", PathBuf::from("uploads"))?;
        let upload_max_bytes: usize = env_or("UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES)?;
        let job_key_strategy: JobKeyStrategy =
            env_or("JOB_KEY_STRATEGY", JobKeyStrategy::default())?;

        let poll_interval_ms: u64 = env_or("RESULT_POLL_INTERVAL_MS", 500)?;
        let concurrency: usize = env_or("RESULT_CONCURRENCY", 4)?;
        if concurrency == 0 {
            return Err(ConfigError {
                var: "RESULT_CONCURRENCY",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        let visibility_secs: u64 = env_or("RESULT_VISIBILITY_SECS", 30)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            upload_dir,
            upload_max_bytes,
            job_key_strategy,
            consumer: ConsumerConfig {
                poll_interval: Duration::from_millis(poll_interval_ms),
                concurrency,
                visibility_timeout: Duration::from_secs(visibility_secs),
            },
        })
    }
}

/// Read `var` and parse it, falling back to `default` when unset.
fn env_or<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
