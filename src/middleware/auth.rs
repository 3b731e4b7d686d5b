use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, AppState};

/// Header carrying the pairing session identifier on authenticated calls.
pub const SESSION_HEADER: &str = "x-session-id";

/// Middleware to require an authenticated pairing session.
///
/// The browsing surface (catalog, playback details, share issuance) is
/// unlocked by a completed pairing: the caller presents the session
/// identifier it polled to `true`. An absent, pending, expired, or unknown
/// session is the same uniform 401 — the poll read is fail-closed, so a
/// cache outage also denies.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session_id = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty());

    let session_id = match session_id {
        Some(session_id) => session_id,
        None => {
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Missing {} header",
                SESSION_HEADER
            )));
        }
    };

    if !state.pairing.poll(session_id).await {
        tracing::debug!(session_id = %session_id, "Rejected request without authenticated session");
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Unable to authenticate"
        )));
    }

    Ok(next.run(req).await)
}
