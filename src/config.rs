//! Configuration types for batch-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, time::Duration};

/// Batch fetching behavior (worker pool size, batch bounds, transport timeout)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Workers started per batch (default: 4)
    ///
    /// Fixed regardless of batch size: a smaller batch leaves idle workers that
    /// exit immediately, a larger batch pipelines through the shared queue.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Maximum URLs accepted in one request (default: 20)
    #[serde(default = "default_max_urls_per_request")]
    pub max_urls_per_request: usize,

    /// Per-fetch transport timeout in seconds (default: 1)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every fetch
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            max_urls_per_request: default_max_urls_per_request(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Admission control configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Maximum batches in flight across the whole process (default: 100)
    #[serde(default = "default_max_concurrent_clients")]
    pub max_concurrent_clients: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_clients: default_max_concurrent_clients(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Maximum accepted request body size in bytes (default: 64 KiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Enable CORS for browser access (default: false)
    #[serde(default)]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// How long shutdown waits for detached workers, in seconds (default: 10)
    #[serde(default = "default_shutdown_timeout", with = "duration_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            max_body_bytes: default_max_body_bytes(),
            cors_enabled: false,
            cors_origins: default_cors_origins(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

/// Main configuration for BatchDownloader
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Worker pool and transport settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Process-wide admission control
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// HTTP server settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from a JSON file and validate it
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;

        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the downloader cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.fetch.worker_count == 0 {
            return Err(config_error("worker_count", "worker_count must be at least 1"));
        }
        if self.fetch.max_urls_per_request == 0 {
            return Err(config_error(
                "max_urls_per_request",
                "max_urls_per_request must be at least 1",
            ));
        }
        if self.fetch.request_timeout.is_zero() {
            return Err(config_error(
                "request_timeout",
                "request_timeout must be greater than zero",
            ));
        }
        if self.admission.max_concurrent_clients == 0 {
            return Err(config_error(
                "max_concurrent_clients",
                "max_concurrent_clients must be at least 1",
            ));
        }
        Ok(())
    }
}

fn config_error(key: &str, message: &str) -> Error {
    Error::Config {
        message: message.to_string(),
        key: Some(key.to_string()),
    }
}

fn default_worker_count() -> usize {
    4
}

fn default_max_urls_per_request() -> usize {
    20
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(1)
}

fn default_user_agent() -> String {
    format!("batch-dl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_concurrent_clients() -> usize {
    100
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(10)
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
