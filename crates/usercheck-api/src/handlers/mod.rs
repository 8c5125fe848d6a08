//! Route handlers

mod status;
mod usercheck;
mod usercount;

pub use status::*;
pub use usercheck::*;
pub use usercount::*;

use axum::{
    extract::State,
    http::Uri,
    response::{IntoResponse, Response},
};
use tracing::debug;
use usercheck_core::Error;

use crate::middleware::CorrelationId;
use crate::server::AppState;

/// Anything that matches no route
pub async fn not_found(State(state): State<AppState>, id: CorrelationId, uri: Uri) -> Response {
    debug!("No route for {}", uri);
    state
        .failure(Error::NotFound(uri.path().to_string()), &id)
        .into_response()
}
