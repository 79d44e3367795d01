//! Error types for batch-dl
//!
//! This module provides error handling for the library, including:
//! - Per-URL fetch failures ([`FetchError`])
//! - The aggregated, first-failure-wins batch failure ([`BatchError`])
//! - Admission and request-validation errors on the crate-wide [`Error`]
//! - HTTP status code mapping and structured error details for the API

use thiserror::Error;

/// Result type alias for batch-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for batch-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "worker_count")
        key: Option<String>,
    },

    /// Admission denied: the maximum number of concurrent batches is in flight
    #[error("limit reached")]
    LimitReached,

    /// The request used an HTTP method other than POST
    #[error("Method not supported")]
    MethodNotSupported,

    /// The request body could not be read or parsed
    #[error("{0}")]
    InvalidRequest(String),

    /// The batch has more URLs than allowed per request
    #[error("Number of urls exceeds the maximum")]
    TooManyUrls {
        /// Number of URLs submitted
        count: usize,
        /// Configured maximum
        max: usize,
    },

    /// The batch failed as a whole
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// The HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Shutdown in progress - not accepting new batches
    #[error("shutdown in progress: not accepting new batches")]
    ShuttingDown,
}

/// Failure to retrieve a single URL
///
/// Every variant carries the URL it belongs to. A fetch error is final for
/// that URL: nothing in the crate retries it.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be parsed
    #[error("invalid url: {reason}")]
    InvalidUrl {
        /// The URL as submitted
        url: String,
        /// Parser error
        reason: String,
    },

    /// The server answered outside the 2xx range
    #[error("{}", status_message(.status, .body.as_ref()))]
    Status {
        /// The URL that was requested
        url: String,
        /// HTTP status code
        status: u16,
        /// Error body, if it could be read
        body: Option<String>,
    },

    /// Connect error, timeout, or body read failure
    #[error("{source}")]
    Transport {
        /// The URL that was requested
        url: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// The batch was cancelled before or during this fetch
    #[error("request cancelled")]
    Cancelled {
        /// The URL whose fetch was abandoned
        url: String,
    },
}

fn status_message(status: &u16, body: Option<&String>) -> String {
    match body {
        Some(body) => format!("status code: {} ({})", status, body),
        None => format!("status code: {}", status),
    }
}

impl FetchError {
    /// The URL this failure belongs to
    pub fn url(&self) -> &str {
        match self {
            FetchError::InvalidUrl { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Transport { url, .. }
            | FetchError::Cancelled { url } => url,
        }
    }

    /// Whether this failure was caused by cancellation rather than by the remote side
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled { .. })
    }
}

/// Aggregated failure of one batch
#[derive(Debug, Error)]
pub enum BatchError {
    /// The first observed fetch failure; later failures of the same batch are discarded
    #[error("failed to download Url \"{failing_url}\": {cause}")]
    Fetch {
        /// URL of the first failed fetch
        failing_url: String,
        /// Why it failed
        #[source]
        cause: FetchError,
    },

    /// The worker pool closed the result channel before every URL reported
    #[error("worker pool exited after {received} of {expected} results")]
    Incomplete {
        /// Outcomes received before the channel closed
        received: usize,
        /// Outcomes expected (batch size)
        expected: usize,
    },
}

impl From<FetchError> for BatchError {
    fn from(cause: FetchError) -> Self {
        BatchError::Fetch {
            failing_url: cause.url().to_string(),
            cause,
        }
    }
}

impl BatchError {
    /// URL of the fetch that decided the batch, if a fetch decided it
    pub fn failing_url(&self) -> Option<&str> {
        match self {
            BatchError::Fetch { failing_url, .. } => Some(failing_url),
            BatchError::Incomplete { .. } => None,
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::MethodNotSupported => 400,
            Error::InvalidRequest(_) => 400,
            Error::TooManyUrls { .. } => 400,

            // 502 Bad Gateway - an upstream URL failed
            Error::Batch(_) => 502,

            // 503 Service Unavailable
            Error::LimitReached => 503,
            Error::ShuttingDown => 503,

            // 500 Internal Server Error - Server-side issues
            Error::HttpClient(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::LimitReached => "limit_reached",
            Error::MethodNotSupported => "method_not_supported",
            Error::InvalidRequest(_) => "invalid_request",
            Error::TooManyUrls { .. } => "too_many_urls",
            Error::Batch(BatchError::Fetch { .. }) => "batch_failed",
            Error::Batch(BatchError::Incomplete { .. }) => "batch_incomplete",
            Error::HttpClient(_) => "http_client_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::ShuttingDown => "shutting_down",
        }
    }
}

impl Error {
    /// Structured context for API error bodies, if this error carries any
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::TooManyUrls { count, max } => Some(serde_json::json!({
                "count": count,
                "max": max,
            })),
            Error::Batch(BatchError::Fetch { failing_url, cause }) => {
                let mut details = serde_json::json!({
                    "failing_url": failing_url,
                });
                if let FetchError::Status { status, .. } = cause {
                    details["status"] = serde_json::json!(status);
                }
                Some(details)
            }
            Error::Batch(BatchError::Incomplete { received, expected }) => {
                Some(serde_json::json!({
                    "received": received,
                    "expected": expected,
                }))
            }
            _ => None,
        }
    }
}
