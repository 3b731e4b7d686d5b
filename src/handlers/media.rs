use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::dtos::{CatalogResponse, DetailParams, PlaybackResponse};
use crate::error::AppError;
use crate::services::catalog;
use crate::services::ServiceError;
use crate::AppState;

/// Shortest object path worth looking up ("a/b.c" and friends).
const MIN_NAME_LEN: usize = 5;

/// Viewer-facing catalog: the bucket listing grouped by folder.
pub async fn videos(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let sections = state.catalog.sections().await?;
    Ok((StatusCode::OK, Json(CatalogResponse { sections })))
}

/// Playback details for one object: sweeps expired grants, issues a fresh
/// one, and returns the temporary URL.
pub async fn detail(
    State(state): State<AppState>,
    Query(params): Query<DetailParams>,
) -> Result<impl IntoResponse, AppError> {
    let name = match params.name.as_deref() {
        Some(name) if name.len() >= MIN_NAME_LEN => name,
        _ => return Err(ServiceError::InvalidName.into()),
    };

    let (video_name, media_type) = catalog::describe(name);
    let url = state.grants.issue(name).await?;

    Ok((
        StatusCode::OK,
        Json(PlaybackResponse {
            url,
            video_name,
            full_name: Some(name.to_string()),
            media_type: media_type.content_type().to_string(),
        }),
    ))
}
