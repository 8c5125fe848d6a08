//! Envelope responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::backtrace::Backtrace;
use usercheck_core::types::{FailureEnvelope, SuccessEnvelope};
use usercheck_core::Error;

use crate::middleware::CorrelationId;

/// 200 with the success envelope
pub fn success<T: Serialize>(data: T, id: &CorrelationId) -> Response {
    (StatusCode::OK, Json(SuccessEnvelope::new(data, id.as_str()))).into_response()
}

/// A failed request, rendered as the failure envelope
///
/// The error text and a backtrace are only exposed in development mode.
#[derive(Debug)]
pub struct ApiError {
    error: Error,
    id: String,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(error: Error, id: &CorrelationId, development: bool) -> Self {
        let detail = development.then(|| Backtrace::force_capture().to_string());
        Self {
            error,
            id: id.as_str().to_string(),
            detail,
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut envelope = FailureEnvelope::new(status.as_u16(), self.id);
        if let Some(trace) = self.detail {
            envelope = envelope
                .with_error(self.error.to_string())
                .with_stacktrace(trace);
        }
        (status, Json(envelope)).into_response()
    }
}
