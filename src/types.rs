//! Core types shared by the downloader and the API

use crate::error::{Error, FetchError, ToHttpStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /`: the URLs to fetch as one batch
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct BatchRequest {
    /// URLs to fetch, in submission order
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Outcome of fetching one URL
///
/// Produced exactly once per URL by one worker and handed to the orchestrator
/// over the result channel. Exactly one of body or error exists per outcome.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The URL was retrieved with a 2xx status
    Fetched(FetchedBody),
    /// The URL could not be retrieved
    Failed(FetchError),
}

impl FetchOutcome {
    /// The URL this outcome belongs to
    pub fn url(&self) -> &str {
        match self {
            FetchOutcome::Fetched(body) => &body.url,
            FetchOutcome::Failed(err) => err.url(),
        }
    }
}

impl From<Result<FetchedBody, FetchError>> for FetchOutcome {
    fn from(result: Result<FetchedBody, FetchError>) -> Self {
        match result {
            Ok(body) => FetchOutcome::Fetched(body),
            Err(err) => FetchOutcome::Failed(err),
        }
    }
}

/// Body of a successfully fetched URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedBody {
    /// The URL that was fetched
    pub url: String,
    /// Full response body
    pub body: Vec<u8>,
}

/// One entry of a successful batch response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DownloadedUrl {
    /// The URL that was fetched
    pub url: String,
    /// Response body decoded as UTF-8 (invalid sequences replaced)
    pub result: String,
}

impl From<FetchedBody> for DownloadedUrl {
    fn from(fetched: FetchedBody) -> Self {
        let result = match String::from_utf8(fetched.body) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Self {
            url: fetched.url,
            result,
        }
    }
}

/// Response envelope for every `POST /` outcome
///
/// ```json
/// { "success": true, "result": [{ "url": "http://a", "result": "A" }] }
/// { "success": false, "reason": "Max parallel requests reached", "code": "limit_reached" }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchResponse {
    /// Whether every URL was fetched
    pub success: bool,

    /// Human-readable failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Machine-readable failure code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Additional failure context (failing URL, limits)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Fetched bodies in completion order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<DownloadedUrl>>,
}

impl BatchResponse {
    /// Successful envelope carrying every fetched URL
    pub fn success(result: Vec<DownloadedUrl>) -> Self {
        Self {
            success: true,
            reason: None,
            code: None,
            details: None,
            result: Some(result),
        }
    }

    /// Failure envelope with a plain reason
    pub fn failure(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
            code: Some(code.into()),
            details: None,
            result: None,
        }
    }
}

impl From<&Error> for BatchResponse {
    fn from(error: &Error) -> Self {
        let reason = match error {
            Error::LimitReached => "Max parallel requests reached".to_string(),
            other => other.to_string(),
        };
        Self {
            details: error.details(),
            ..Self::failure(error.error_code(), reason)
        }
    }
}

/// Admission and worker snapshot reported by `GET /stats`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloaderStats {
    /// Batches currently admitted
    pub in_flight: usize,
    /// Admission limit
    pub max_concurrent_clients: usize,
    /// Worker tasks still running, including workers of already-decided batches
    pub active_workers: usize,
    /// Workers started per batch
    pub worker_count: usize,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downloaded_url_from_utf8_body() {
        let downloaded: DownloadedUrl = FetchedBody {
            url: "http://a".into(),
            body: b"A".to_vec(),
        }
        .into();

        assert_eq!(downloaded.url, "http://a");
        assert_eq!(downloaded.result, "A");
    }

    #[test]
    fn test_downloaded_url_replaces_invalid_utf8() {
        let downloaded: DownloadedUrl = FetchedBody {
            url: "http://bin".into(),
            body: vec![b'o', b'k', 0xff],
        }
        .into();

        assert_eq!(downloaded.result, "ok\u{fffd}");
    }

    #[test]
    fn test_outcome_url() {
        let ok = FetchOutcome::from(Ok(FetchedBody {
            url: "http://a".into(),
            body: vec![],
        }));
        let failed = FetchOutcome::from(Err(FetchError::Cancelled {
            url: "http://b".into(),
        }));

        assert_eq!(ok.url(), "http://a");
        assert_eq!(failed.url(), "http://b");
        assert!(matches!(failed, FetchOutcome::Failed(_)));
    }

    #[test]
    fn test_success_envelope_shape() {
        let response = BatchResponse::success(vec![DownloadedUrl {
            url: "http://a".into(),
            result: "A".into(),
        }]);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["result"][0]["url"], "http://a");
        assert_eq!(json["result"][0]["result"], "A");
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn test_limit_reached_envelope() {
        let response = BatchResponse::from(&Error::LimitReached);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["reason"], "Max parallel requests reached");
        assert_eq!(json["code"], "limit_reached");
        assert!(json.get("result").is_none());
    }

    #[test]
    fn test_batch_failure_envelope_names_url() {
        let error = Error::Batch(
            FetchError::Status {
                url: "http://bad".into(),
                status: 500,
                body: Some("oops".into()),
            }
            .into(),
        );
        let response = BatchResponse::from(&error);

        assert_eq!(
            response.reason.as_deref(),
            Some("failed to download Url \"http://bad\": status code: 500 (oops)")
        );
        assert_eq!(response.details.unwrap()["failing_url"], "http://bad");
    }

    #[test]
    fn test_request_missing_urls_is_empty() {
        let request: BatchRequest = serde_json::from_str("{}").unwrap();
        assert!(request.urls.is_empty());
    }
}
