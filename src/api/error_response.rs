//! HTTP error response handling for the API
//!
//! Every error leaves the API as a [`BatchResponse`] failure envelope with the
//! status code from [`ToHttpStatus`].

use crate::error::{Error, ToHttpStatus};
use crate::types::BatchResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, code = self.error_code(), "Request failed");
        }

        (status_code, Json(BatchResponse::from(&self))).into_response()
    }
}
