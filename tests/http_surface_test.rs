mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use mediagate::config::{CacheBackend, CacheConfig, Environment, GatewayConfig, StorageConfig};
use mediagate::services::{
    CatalogService, GrantCache, GrantManager, LocalGrantCache, MockObjectStore, PairingService,
    ShareService, SystemClock,
};
use mediagate::middleware::auth::SESSION_HEADER;
use mediagate::{build_router, AppState};
use std::sync::Arc;
use tower::util::ServiceExt;

fn test_config() -> GatewayConfig {
    GatewayConfig {
        environment: Environment::Dev,
        service_name: "mediagate".to_string(),
        service_version: "0.0.0-test".to_string(),
        log_level: "debug".to_string(),
        port: 8080,
        public_url: "http://localhost:8080".to_string(),
        cache: CacheConfig {
            backend: CacheBackend::Local,
            redis_url: None,
            pending_ttl_secs: 900,
            authenticated_ttl_secs: 900,
            share_ttl_secs: 172_800,
        },
        storage: StorageConfig {
            endpoint: "https://objectstorage.example.com".to_string(),
            namespace: "test".to_string(),
            bucket: "media".to_string(),
            grant_validity_secs: 7200,
        },
        credentials: common::test_credentials(),
    }
}

fn test_app() -> Router {
    let config = test_config();
    let cache: Arc<dyn GrantCache> = Arc::new(LocalGrantCache::new(
        mediagate::services::CacheTtls::from_config(&config.cache),
    ));
    let store = Arc::new(MockObjectStore::with_objects(&[
        "movies/foo.mp4",
        "movies/show.hls/",
        "movies/show.hls/output.m3u8",
        "movies/show.hls/segment0.ts",
    ]));

    let state = AppState {
        pairing: PairingService::new(cache.clone(), config.credentials.clone()),
        share: ShareService::new(cache.clone()),
        grants: GrantManager::new(store.clone(), Arc::new(SystemClock), &config.storage),
        catalog: CatalogService::new(store, &config.storage.bucket),
        cache,
        config,
    };
    build_router(state)
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_as(uri: &str, session_id: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(SESSION_HEADER, session_id)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_json_as(uri: &str, session_id: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(SESSION_HEADER, session_id)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Runs the pairing flow to completion and returns an authenticated session.
async fn pair(app: &Router) -> String {
    let response = app.clone().oneshot(get("/auth/login")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session_id = json_body(response).await["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(post_json(
            "/auth/authenticate",
            serde_json::json!({
                "session_id": session_id,
                "username": "alice",
                "password": "correct",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    session_id
}

#[tokio::test]
async fn health_check_works() {
    let app = test_app();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["cache"], "up");
}

#[tokio::test]
async fn full_pairing_flow_over_http() {
    let app = test_app();

    // Viewing device begins a pairing attempt
    let response = app.clone().oneshot(get("/auth/login")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let session_id = body["session_id"].as_str().unwrap().to_string();
    assert!(body["authenticate_url"]
        .as_str()
        .unwrap()
        .contains(&session_id));

    // Not yet authenticated
    let response = app
        .clone()
        .oneshot(get(&format!("/auth/check?session_id={}", session_id)))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["is_authenticated"], false);

    // Wrong credentials: uniform 401, state unchanged
    let response = app
        .clone()
        .oneshot(post_json(
            "/auth/authenticate",
            serde_json::json!({
                "session_id": session_id,
                "username": "alice",
                "password": "wrong",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get(&format!("/auth/check?session_id={}", session_id)))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["is_authenticated"], false);

    // Correct credentials flip the session
    let response = app
        .clone()
        .oneshot(post_json(
            "/auth/authenticate",
            serde_json::json!({
                "session_id": session_id,
                "username": "alice",
                "password": "correct",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get(&format!("/auth/check?session_id={}", session_id)))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["is_authenticated"], true);
}

#[tokio::test]
async fn check_auth_without_session_id_is_false_not_error() {
    let app = test_app();

    let response = app.oneshot(get("/auth/check")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["is_authenticated"], false);
}

#[tokio::test]
async fn share_link_round_trip_over_http() {
    let app = test_app();
    let session_id = pair(&app).await;

    let response = app
        .clone()
        .oneshot(post_json_as(
            "/share",
            &session_id,
            serde_json::json!({ "name": "movies/foo.mp4" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let code = body["code"].as_str().unwrap().to_string();
    assert_eq!(
        body["url"],
        format!("http://localhost:8080/shared?auth_code={}", code)
    );

    let response = app
        .clone()
        .oneshot(get(&format!("/shared?auth_code={}", code)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["video_name"], "foo");
    assert_eq!(body["media_type"], "video/mp4");
    assert!(body["url"]
        .as_str()
        .unwrap()
        .starts_with("https://objectstorage.example.com/p/"));
    assert!(body["url"].as_str().unwrap().ends_with("movies/foo.mp4"));
}

#[tokio::test]
async fn unknown_share_code_is_not_found() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(get("/shared?auth_code=definitely-not-issued"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Too-short codes are rejected the same way
    let response = app.oneshot(get("/shared?auth_code=short")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_and_detail_endpoints() {
    let app = test_app();
    let session_id = pair(&app).await;

    let response = app
        .clone()
        .oneshot(get_as("/videos", &session_id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let movies = body["sections"]["movies"].as_array().unwrap();
    assert_eq!(movies.len(), 2);

    let response = app
        .clone()
        .oneshot(get_as(
            "/videos/detail?name=movies/show.hls/output.m3u8",
            &session_id,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["video_name"], "show");
    assert_eq!(body["media_type"], "application/x-mpegURL");
    assert_eq!(body["full_name"], "movies/show.hls/output.m3u8");

    // Missing or implausible names are rejected up front
    let response = app
        .clone()
        .oneshot(get_as("/videos/detail", &session_id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get_as("/videos/detail?name=x.y", &session_id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn browsing_surface_requires_authenticated_session() {
    let app = test_app();

    // No session header at all
    for uri in ["/videos", "/videos/detail?name=movies/foo.mp4"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = app
        .clone()
        .oneshot(post_json(
            "/share",
            serde_json::json!({ "name": "movies/foo.mp4" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A pending session (never authenticated) is rejected the same way
    let response = app.clone().oneshot(get("/auth/login")).await.unwrap();
    let pending = json_body(response).await["session_id"]
        .as_str()
        .unwrap()
        .to_string();
    let response = app
        .clone()
        .oneshot(get_as("/videos", &pending))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // So is a session id that was never issued
    let response = app
        .clone()
        .oneshot(get_as("/videos", "no-such-session"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Playback by share code stays public
    let session_id = pair(&app).await;
    let response = app
        .clone()
        .oneshot(post_json_as(
            "/share",
            &session_id,
            serde_json::json!({ "name": "movies/foo.mp4" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let code = json_body(response).await["code"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get(&format!("/shared?auth_code={}", code)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
