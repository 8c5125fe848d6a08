use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::middleware::CorrelationId;
use crate::response::success;
use crate::server::AppState;

/// GET /api/v1/usercount - Member count of the configured group
pub async fn count_users(State(state): State<AppState>, id: CorrelationId) -> Response {
    debug!("GET /api/v1/usercount");

    match state
        .with_provider(|provider| provider.count_members())
        .await
    {
        Ok(count) => success(count, &id),
        Err(e) => state.failure(e, &id).into_response(),
    }
}
