use mediagate::{
    build_router,
    config::{CacheBackend, GatewayConfig},
    error::AppError,
    observability::init_tracing,
    services::{
        CacheTtls, CatalogService, GrantCache, GrantManager, HttpObjectStore, LocalGrantCache,
        PairingService, RedisGrantCache, ShareService, SystemClock,
    },
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = GatewayConfig::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting media gateway"
    );

    // Select the cache backend once; everything downstream depends only on
    // the GrantCache contract
    let ttls = CacheTtls::from_config(&config.cache);
    let cache: Arc<dyn GrantCache> = match config.cache.backend {
        CacheBackend::Local => {
            tracing::info!("Using in-process grant cache");
            Arc::new(LocalGrantCache::new(ttls))
        }
        CacheBackend::Redis => {
            let url = config
                .cache
                .redis_url
                .as_deref()
                .ok_or_else(|| AppError::ConfigError(anyhow::anyhow!("REDIS_URL is not set")))?;
            Arc::new(RedisGrantCache::connect(url, ttls).await?)
        }
    };

    let store = Arc::new(HttpObjectStore::new(&config.storage)?);
    tracing::info!(
        endpoint = %config.storage.endpoint,
        bucket = %config.storage.bucket,
        "Object storage client initialized"
    );

    let clock = Arc::new(SystemClock);
    let pairing = PairingService::new(cache.clone(), config.credentials.clone());
    let share = ShareService::new(cache.clone());
    let grants = GrantManager::new(store.clone(), clock, &config.storage);
    let catalog = CatalogService::new(store, &config.storage.bucket);

    let state = AppState {
        config: config.clone(),
        cache,
        pairing,
        share,
        grants,
        catalog,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
