pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod services;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::error::AppError;
use crate::services::{CatalogService, GrantCache, GrantManager, PairingService, ShareService};

/// Shared application state. The grant cache is constructed once at
/// startup and handed to every component that needs it; nothing reaches
/// for global state.
#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub cache: Arc<dyn GrantCache>,
    pub pairing: PairingService,
    pub share: ShareService,
    pub grants: GrantManager,
    pub catalog: CatalogService,
}

pub fn build_router(state: AppState) -> Router {
    // Browsing and share issuance require a completed pairing; the pairing
    // surface itself, share playback, and health stay public
    let protected_routes = Router::new()
        .route("/share", post(handlers::share::share_url))
        .route("/videos", get(handlers::media::videos))
        .route("/videos/detail", get(handlers::media::detail))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::session_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        // Pairing surface
        .route("/auth/login", get(handlers::auth::login))
        .route("/auth/authenticate", post(handlers::auth::authenticate))
        .route("/auth/check", get(handlers::auth::check_auth))
        // Playback for anyone holding a share code
        .route("/shared", get(handlers::share::shared))
        .merge(protected_routes)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
}

/// Service health check: liveness plus a cache backend round trip.
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, AppError> {
    state.cache.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Cache health check failed");
        AppError::from(e)
    })?;

    Ok(axum::Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "cache": "up"
        }
    })))
}
