use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};
use std::collections::HashMap;

use crate::services::cache::{CacheTtls, GrantCache};
use crate::services::ServiceError;

const AUTH_PREFIX: &str = "auth:";
const SHARE_PREFIX: &str = "share:";

/// Networked cache backend on Redis. Entries rely on the store's native
/// expiry, so state is shared across gateway instances and survives
/// restarts. Per-key atomicity comes from the store; no client-side
/// locking.
#[derive(Clone)]
pub struct RedisGrantCache {
    _client: Client,
    manager: ConnectionManager,
    ttls: CacheTtls,
}

impl RedisGrantCache {
    pub async fn connect(url: &str, ttls: CacheTtls) -> Result<Self, ServiceError> {
        tracing::info!(url = %url, "Connecting to Redis");
        let client = Client::open(url)?;

        // ConnectionManager reconnects automatically on connection loss
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            ServiceError::Redis(e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self {
            _client: client,
            manager,
            ttls,
        })
    }

    fn auth_key(session_id: &str) -> String {
        format!("{}{}", AUTH_PREFIX, session_id)
    }

    fn share_key(code: &str) -> String {
        format!("{}{}", SHARE_PREFIX, code)
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), ServiceError> {
        let mut conn = self.manager.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(expiry_seconds)
            .query_async(&mut conn)
            .await
            .map_err(ServiceError::Redis)
    }
}

#[async_trait]
impl GrantCache for RedisGrantCache {
    async fn set_auth(&self, session_id: &str, value: bool) -> Result<(), ServiceError> {
        self.set_with_expiry(
            &Self::auth_key(session_id),
            if value { "true" } else { "false" },
            self.ttls.auth_secs(value),
        )
        .await
    }

    async fn get_auth(&self, session_id: &str) -> bool {
        let mut conn = self.manager.clone();
        let value: Option<String> = match redis::cmd("GET")
            .arg(Self::auth_key(session_id))
            .query_async(&mut conn)
            .await
        {
            Ok(value) => value,
            Err(e) => {
                // Fail closed: an unreachable cache reads as unauthenticated
                tracing::warn!(error = %e, "Auth flag read failed, treating as unauthenticated");
                return false;
            }
        };
        // Anything but the canonical true-literal coerces to false
        matches!(value.as_deref(), Some("true"))
    }

    async fn exists_auth(&self, session_id: &str) -> bool {
        let mut conn = self.manager.clone();
        match redis::cmd("EXISTS")
            .arg(Self::auth_key(session_id))
            .query_async::<_, bool>(&mut conn)
            .await
        {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!(error = %e, "Session existence check failed, treating as absent");
                false
            }
        }
    }

    async fn set_share(&self, code: &str, content_id: &str) -> Result<(), ServiceError> {
        self.set_with_expiry(&Self::share_key(code), content_id, self.ttls.share_secs)
            .await
    }

    async fn get_share(&self, code: &str) -> Option<String> {
        let mut conn = self.manager.clone();
        match redis::cmd("GET")
            .arg(Self::share_key(code))
            .query_async::<_, Option<String>>(&mut conn)
            .await
        {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Share code read failed, treating as not found");
                None
            }
        }
    }

    async fn dump_auth(&self) -> HashMap<String, String> {
        let mut conn = self.manager.clone();
        let mut entries = HashMap::new();
        let mut cursor: u64 = 0;

        loop {
            let scan: Result<(u64, Vec<String>), redis::RedisError> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(format!("{}*", AUTH_PREFIX))
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await;

            let (next, keys) = match scan {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(error = %e, "Auth snapshot scan failed");
                    return HashMap::new();
                }
            };

            for key in keys {
                let value: Option<String> = redis::cmd("GET")
                    .arg(&key)
                    .query_async(&mut conn)
                    .await
                    .unwrap_or(None);
                if let Some(value) = value {
                    let session_id = key.trim_start_matches(AUTH_PREFIX).to_string();
                    entries.insert(session_id, value);
                }
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        entries
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(ServiceError::Redis)
    }
}
