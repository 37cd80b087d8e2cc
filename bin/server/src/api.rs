//! Session-aware API endpoints.

use axum::{Json, extract::State};
use studentrun_core::GuildRecord;
use tracing::{debug, error, instrument};

use crate::app::AppState;
use crate::auth::CurrentSession;
use crate::error::ApiError;

/// Reports whether the current session may see the guild list.
///
/// The body is the bare literal `true` or `false`.
pub async fn profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> &'static str {
    if state.policy.is_authorized_session(&session) {
        "true"
    } else {
        "false"
    }
}

/// Returns the guild list to authorized sessions and `[]` to everyone else.
#[instrument(skip_all)]
pub async fn guilds(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<GuildRecord>>, ApiError> {
    if !state.policy.is_authorized_session(&session) {
        debug!(
            authenticated = session.is_authenticated(),
            "Withholding guild list from unauthorized session"
        );
        return Ok(Json(Vec::new()));
    }

    match state.guilds.fetch_all().await {
        Ok(guilds) => Ok(Json(guilds)),
        Err(report) => {
            error!(source = state.guilds.kind(), error = %report, "Failed to read guild list");
            Err(ApiError::GuildsUnavailable)
        }
    }
}
