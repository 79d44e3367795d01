//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the batch-dl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the batch-dl REST API
///
/// Served as JSON from `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "batch-dl REST API",
        description = "Fetch a batch of URLs concurrently; the batch succeeds only if every URL does",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        crate::api::routes::download_batch,
        crate::api::routes::health_check,
        crate::api::routes::get_stats,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::types::BatchRequest,
        crate::types::BatchResponse,
        crate::types::DownloadedUrl,
        crate::types::DownloaderStats,
    )),
    tags(
        (name = "batch", description = "Batch download - fetch every URL of a request concurrently"),
        (name = "system", description = "System endpoints - Health checks, statistics, OpenAPI spec"),
    )
)]
pub struct ApiDoc;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_has_every_route() {
        let spec = ApiDoc::openapi();

        for path in ["/", "/health", "/stats", "/openapi.json"] {
            assert!(
                spec.paths.paths.contains_key(path),
                "OpenAPI spec should document {}",
                path
            );
        }
    }

    #[test]
    fn test_openapi_spec_has_components() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("components should be present");

        for schema in ["BatchRequest", "BatchResponse", "DownloadedUrl", "DownloaderStats"] {
            assert!(
                components.schemas.contains_key(schema),
                "missing schema {}",
                schema
            );
        }
    }

    #[test]
    fn test_openapi_spec_serializes_to_json() {
        let json = ApiDoc::openapi().to_json().unwrap();
        assert!(json.contains("batch-dl REST API"));
    }
}
