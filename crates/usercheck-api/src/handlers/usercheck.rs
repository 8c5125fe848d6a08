use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::middleware::CorrelationId;
use crate::response::success;
use crate::server::AppState;

/// GET /api/v1/usercheck/{identifier} - Is the user in the configured group?
///
/// The payload is the string `"true"` or `"false"`; an unknown user is
/// reported as `"false"`.
pub async fn check_user(
    State(state): State<AppState>,
    id: CorrelationId,
    Path(identifier): Path<String>,
) -> Response {
    debug!("GET /api/v1/usercheck/{}", identifier);

    match state
        .with_provider(|provider| provider.check_user(&identifier))
        .await
    {
        Ok(check) => {
            debug!(found = check.found, member = check.member, "User check for {}", identifier);
            success(check.member.to_string(), &id)
        }
        Err(e) => state.failure(e, &id).into_response(),
    }
}
