//! Correlation id middleware
//!
//! Every inbound request gets a fresh id. It is stored in the request
//! extensions, attached to a `request` span so every log line emitted while
//! handling the request carries it, and echoed in the response header.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use tracing::{info_span, Instrument};
use usercheck_core::utils::generate_correlation_id;
use usercheck_core::CORRELATION_HEADER;

/// Correlation id of the request being handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn new() -> Self {
        Self(generate_correlation_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CorrelationId>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Assign a correlation id to the request and run it inside its span
pub async fn correlation_id(mut request: Request<Body>, next: Next) -> Response {
    let id = CorrelationId::new();
    let span = info_span!(
        "request",
        correlation_id = %id.as_str(),
        method = %request.method(),
        path = %request.uri().path(),
    );
    request.extensions_mut().insert(id.clone());

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}
