use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::dtos::{AuthenticateRequest, CheckAuthParams, CheckAuthResponse, LoginResponse};
use crate::error::AppError;
use crate::AppState;

/// Begin a pairing attempt. The viewing device shows the returned
/// `authenticate_url` (typically as a QR code) and starts polling
/// `/auth/check`.
pub async fn login(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let session_id = state.pairing.begin().await?;
    let authenticate_url = format!(
        "{}/auth/authenticate?session_id={}",
        state.config.public_url, session_id
    );
    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            session_id,
            authenticate_url,
        }),
    ))
}

/// Submit credentials from the second device. Failure is a single uniform
/// 401 regardless of cause.
pub async fn authenticate(
    State(state): State<AppState>,
    Json(req): Json<AuthenticateRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .pairing
        .submit_credentials(&req.session_id, &req.username, &req.password)
        .await?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Success. Your viewing device should refresh momentarily."
        })),
    ))
}

/// Polling endpoint for the viewing device. Always 200; `false` covers
/// pending, expired, and unknown sessions alike.
pub async fn check_auth(
    State(state): State<AppState>,
    Query(params): Query<CheckAuthParams>,
) -> impl IntoResponse {
    let is_authenticated = match params.session_id.as_deref() {
        Some(session_id) => {
            if tracing::enabled!(tracing::Level::DEBUG) {
                let snapshot = state.cache.dump_auth().await;
                tracing::debug!(
                    session_id = %session_id,
                    live_sessions = snapshot.len(),
                    snapshot = ?snapshot,
                    "Pairing poll"
                );
            }
            state.pairing.poll(session_id).await
        }
        None => false,
    };
    Json(CheckAuthResponse { is_authenticated })
}
