use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::dtos::{PlaybackResponse, ShareRequest, ShareResponse, SharedParams};
use crate::error::AppError;
use crate::services::catalog;
use crate::services::ServiceError;
use crate::AppState;

/// Minimum plausible share-code length; anything shorter is rejected
/// before touching the cache.
const MIN_CODE_LEN: usize = 10;

/// Issue a durable share link for an object path (authenticated surface).
pub async fn share_url(
    State(state): State<AppState>,
    Json(req): Json<ShareRequest>,
) -> Result<impl IntoResponse, AppError> {
    let code = state.share.issue(&req.name).await?;
    let url = format!("{}/shared?auth_code={}", state.config.public_url, code);
    Ok((StatusCode::OK, Json(ShareResponse { url, code })))
}

/// Public playback endpoint for share-link holders: resolve the code, then
/// sweep and issue a fresh access grant for the content it names.
pub async fn shared(
    State(state): State<AppState>,
    Query(params): Query<SharedParams>,
) -> Result<impl IntoResponse, AppError> {
    let code = match params.auth_code.as_deref() {
        Some(code) if code.len() >= MIN_CODE_LEN => code,
        _ => {
            tracing::error!("Missing auth_code in share attempt");
            return Err(ServiceError::ShareNotFound.into());
        }
    };

    let name = match state.share.resolve(code).await {
        Some(name) => name,
        None => {
            tracing::error!("Invalid auth_code in share attempt");
            return Err(ServiceError::ShareNotFound.into());
        }
    };

    let (video_name, media_type) = catalog::describe(&name);
    let url = state.grants.issue(&name).await?;

    Ok((
        StatusCode::OK,
        Json(PlaybackResponse {
            url,
            video_name,
            full_name: None,
            media_type: media_type.content_type().to_string(),
        }),
    ))
}
