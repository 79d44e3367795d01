//! Batch download handler.

use crate::api::AppState;
use crate::error::Error;
use crate::types::{BatchRequest, BatchResponse};
use axum::{
    Json,
    body::{Body, to_bytes},
    extract::State,
};

/// POST / - Fetch every URL of a batch concurrently
///
/// The admission slot is taken before the body is read and held until the
/// response is produced, so an overloaded server rejects without buffering.
/// A client that disconnects drops this future, which cancels the batch's
/// in-flight fetches.
#[utoipa::path(
    post,
    path = "/",
    tag = "batch",
    request_body = BatchRequest,
    responses(
        (status = 200, description = "Every URL fetched", body = BatchResponse),
        (status = 400, description = "Unsupported method, malformed body, or too many URLs", body = BatchResponse),
        (status = 413, description = "Request body too large"),
        (status = 502, description = "At least one URL failed", body = BatchResponse),
        (status = 503, description = "Max parallel requests reached, or shutting down", body = BatchResponse)
    )
)]
pub async fn download_batch(
    State(state): State<AppState>,
    body: Body,
) -> Result<Json<BatchResponse>, Error> {
    let admission = state.downloader.admit()?;

    let body = to_bytes(body, state.config.api.max_body_bytes)
        .await
        .map_err(|e| Error::InvalidRequest(format!("failed to read request body: {}", e)))?;

    let request: BatchRequest =
        serde_json::from_slice(&body).map_err(|e| Error::InvalidRequest(e.to_string()))?;

    tracing::debug!(batch_size = request.urls.len(), "Batch request admitted");

    let results = state
        .downloader
        .run_batch(&admission, request.urls)
        .await?;

    Ok(Json(BatchResponse::success(results)))
}

/// Any method other than POST on `/`
pub async fn method_not_supported() -> Error {
    Error::MethodNotSupported
}
