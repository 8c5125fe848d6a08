use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::debug;
use usercheck_core::types::StatusReport;

use crate::middleware::CorrelationId;
use crate::response::success;
use crate::server::AppState;

/// GET /api/v1/status - Directory reachability and process id
///
/// Only dials the server; no bind or search is attempted. An unreachable
/// directory is still a 200 with `"LdapStatus": "down"`.
pub async fn get_status(State(state): State<AppState>, id: CorrelationId) -> Response {
    debug!("GET /api/v1/status");

    match state
        .with_provider(|provider| async move { Ok(provider.probe().await) })
        .await
    {
        Ok(status) => success(StatusReport::current(status), &id),
        Err(e) => state.failure(e, &id).into_response(),
    }
}
