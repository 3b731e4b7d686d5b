use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::CacheConfig;
use crate::services::ServiceError;

/// Source of the current time for TTL decisions. Production uses
/// [`SystemClock`]; tests substitute a manually advanced clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Per-namespace expiry windows, taken from configuration once at startup.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub pending_secs: u64,
    pub authenticated_secs: u64,
    pub share_secs: u64,
}

impl CacheTtls {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            pending_secs: config.pending_ttl_secs,
            authenticated_secs: config.authenticated_ttl_secs,
            share_secs: config.share_ttl_secs,
        }
    }

    /// Every auth write re-arms the window for the state being written.
    pub fn auth_secs(&self, authenticated: bool) -> u64 {
        if authenticated {
            self.authenticated_secs
        } else {
            self.pending_secs
        }
    }
}

/// Key-value store with per-key expiry backing all transient authorization
/// state: pairing sessions in the "auth" namespace and share codes in the
/// "share" namespace.
///
/// Reads are fail-closed: an absent, expired, or unreadable entry is
/// indistinguishable from one that never existed, and backend failures on
/// the read path degrade to the least-privileged answer instead of
/// propagating.
#[async_trait]
pub trait GrantCache: Send + Sync {
    /// Write or overwrite the auth flag for a session, re-arming its TTL.
    async fn set_auth(&self, session_id: &str, value: bool) -> Result<(), ServiceError>;

    /// Read the auth flag. Absent, expired, unparsable, or unreachable all
    /// coerce to `false`; this never returns an error.
    async fn get_auth(&self, session_id: &str) -> bool;

    /// Whether the session exists at all, independent of its value. Guards
    /// against authenticating a session identifier that was never minted.
    async fn exists_auth(&self, session_id: &str) -> bool;

    async fn set_share(&self, code: &str, content_id: &str) -> Result<(), ServiceError>;

    /// Resolve a share code. `None` covers both expired and never-issued.
    async fn get_share(&self, code: &str) -> Option<String>;

    /// Diagnostic snapshot of live auth entries. Observability only, never
    /// control flow; degrades to empty on backend failure.
    async fn dump_auth(&self) -> HashMap<String, String>;

    async fn health_check(&self) -> Result<(), ServiceError>;
}

struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-process cache backend. Expiry is lazy: an entry past its deadline is
/// dropped the first time a read touches it. Single-node only, lost on
/// restart.
pub struct LocalGrantCache {
    auth: DashMap<String, Entry>,
    share: DashMap<String, Entry>,
    ttls: CacheTtls,
    clock: Arc<dyn Clock>,
}

impl LocalGrantCache {
    pub fn new(ttls: CacheTtls) -> Self {
        Self::with_clock(ttls, Arc::new(SystemClock))
    }

    pub fn with_clock(ttls: CacheTtls, clock: Arc<dyn Clock>) -> Self {
        Self {
            auth: DashMap::new(),
            share: DashMap::new(),
            ttls,
            clock,
        }
    }

    fn read_live(map: &DashMap<String, Entry>, key: &str, now: DateTime<Utc>) -> Option<String> {
        let expired = match map.get(key) {
            Some(entry) => {
                if entry.expires_at > now {
                    return Some(entry.value.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            // Re-check under the write lock; a concurrent writer may have
            // re-armed the entry since we looked.
            map.remove_if(key, |_, entry| entry.expires_at <= now);
        }
        None
    }

    fn write(map: &DashMap<String, Entry>, key: &str, value: String, expires_at: DateTime<Utc>) {
        map.insert(key.to_string(), Entry { value, expires_at });
    }
}

#[async_trait]
impl GrantCache for LocalGrantCache {
    async fn set_auth(&self, session_id: &str, value: bool) -> Result<(), ServiceError> {
        let ttl = Duration::seconds(self.ttls.auth_secs(value) as i64);
        let expires_at = self.clock.now() + ttl;
        Self::write(&self.auth, session_id, value.to_string(), expires_at);
        Ok(())
    }

    async fn get_auth(&self, session_id: &str) -> bool {
        match Self::read_live(&self.auth, session_id, self.clock.now()) {
            Some(value) => value == "true",
            None => false,
        }
    }

    async fn exists_auth(&self, session_id: &str) -> bool {
        Self::read_live(&self.auth, session_id, self.clock.now()).is_some()
    }

    async fn set_share(&self, code: &str, content_id: &str) -> Result<(), ServiceError> {
        let expires_at = self.clock.now() + Duration::seconds(self.ttls.share_secs as i64);
        Self::write(&self.share, code, content_id.to_string(), expires_at);
        Ok(())
    }

    async fn get_share(&self, code: &str) -> Option<String> {
        Self::read_live(&self.share, code, self.clock.now())
    }

    async fn dump_auth(&self) -> HashMap<String, String> {
        let now = self.clock.now();
        self.auth
            .iter()
            .filter(|entry| entry.expires_at > now)
            .map(|entry| (entry.key().clone(), entry.value.clone()))
            .collect()
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}
