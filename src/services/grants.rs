use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;
use thiserror::Error;

use crate::config::StorageConfig;
use crate::models::{AccessGrant, AccessMode, GrantRequest, ObjectPage};
use crate::services::cache::Clock;
use crate::services::ServiceError;

/// Failures surfaced by the object-storage port. Transient unavailability
/// is kept distinct from a missing bucket so callers can decide retry vs.
/// hard failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("bucket '{0}' does not exist")]
    BucketNotFound(String),

    #[error("object storage unavailable: {0}")]
    Unavailable(String),
}

/// Port onto the object-storage service: grant lifecycle plus bucket
/// listing. The storage service is the sole authority for grant state.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_grants(&self, bucket: &str) -> Result<Vec<AccessGrant>, StoreError>;

    async fn delete_grant(&self, bucket: &str, grant_id: &str) -> Result<(), StoreError>;

    async fn create_grant(
        &self,
        bucket: &str,
        request: GrantRequest,
    ) -> Result<AccessGrant, StoreError>;

    async fn list_objects(
        &self,
        bucket: &str,
        start: Option<&str>,
    ) -> Result<ObjectPage, StoreError>;
}

/// Manages the outstanding time-limited read grants for the configured
/// bucket: purges expired grants and issues new ones on demand.
///
/// Issuance does not deduplicate by object path; rapid repeated views of
/// the same content hold multiple live grants until the next sweep. That is
/// a deliberate capacity trade-off, bounded by the sweep running before
/// every new grant.
#[derive(Clone)]
pub struct GrantManager {
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    bucket: String,
    endpoint: String,
    validity_secs: u64,
}

impl GrantManager {
    pub fn new(store: Arc<dyn ObjectStore>, clock: Arc<dyn Clock>, config: &StorageConfig) -> Self {
        Self {
            store,
            clock,
            bucket: config.bucket.clone(),
            endpoint: config.endpoint.clone(),
            validity_secs: config.grant_validity_secs,
        }
    }

    /// Delete every grant for the bucket whose expiry has passed. Runs
    /// synchronously before each issuance rather than on a background
    /// timer, which bounds stale-grant accumulation to at most one new
    /// entry per issuance at the cost of an extra list round trip.
    pub async fn sweep_expired(&self) -> Result<usize, ServiceError> {
        let now = self.clock.now();
        let grants = self.store.list_grants(&self.bucket).await?;

        let mut removed = 0;
        for grant in grants {
            if grant.is_expired(now) {
                self.store.delete_grant(&self.bucket, &grant.id).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Sweep, then create a fresh read-only grant for `object_path` with
    /// bucket listing denied, and compose the externally reachable URL.
    ///
    /// Not transactional: a failure during the sweep aborts the whole
    /// issuance, and no grant is assumed to exist unless the create call
    /// confirmed it.
    pub async fn issue(&self, object_path: &str) -> Result<String, ServiceError> {
        let removed = self.sweep_expired().await?;
        if removed > 0 {
            tracing::info!(
                removed = removed,
                bucket = %self.bucket,
                "Purged expired access grants"
            );
        }

        let now = self.clock.now();
        let expires_at = now + Duration::seconds(self.validity_secs as i64);
        let grant = self
            .store
            .create_grant(
                &self.bucket,
                GrantRequest {
                    name: format!("{}{}", object_path, expires_at.to_rfc3339()),
                    object_path: object_path.to_string(),
                    access: AccessMode::ObjectRead,
                    expires_at,
                },
            )
            .await?;

        tracing::debug!(
            grant_id = %grant.id,
            object_path = %object_path,
            expires_at = %grant.expires_at,
            "Access grant issued"
        );
        Ok(format!("{}{}{}", self.endpoint, grant.access_uri, object_path))
    }
}

/// In-process [`ObjectStore`] used by tests and local development.
pub struct MockObjectStore {
    pub grants: std::sync::Mutex<Vec<AccessGrant>>,
    pub objects: std::sync::Mutex<Vec<String>>,
    pub page_size: usize,
    pub unavailable: std::sync::atomic::AtomicBool,
    next_id: std::sync::atomic::AtomicU64,
}

impl Default for MockObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self {
            grants: std::sync::Mutex::new(Vec::new()),
            objects: std::sync::Mutex::new(Vec::new()),
            page_size: 100,
            unavailable: std::sync::atomic::AtomicBool::new(false),
            next_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    pub fn with_objects(names: &[&str]) -> Self {
        let store = Self::new();
        *store.objects.lock().unwrap() = names.iter().map(|n| n.to_string()).collect();
        store
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StoreError::Unavailable("mock store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn list_grants(&self, _bucket: &str) -> Result<Vec<AccessGrant>, StoreError> {
        self.check_available()?;
        Ok(self.grants.lock().unwrap().clone())
    }

    async fn delete_grant(&self, _bucket: &str, grant_id: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.grants.lock().unwrap().retain(|g| g.id != grant_id);
        Ok(())
    }

    async fn create_grant(
        &self,
        _bucket: &str,
        request: GrantRequest,
    ) -> Result<AccessGrant, StoreError> {
        self.check_available()?;
        let n = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let grant = AccessGrant {
            id: format!("grant-{}", n),
            name: request.name,
            access_uri: format!("/p/token-{}/n/test/b/test/o/", n),
            expires_at: request.expires_at,
        };
        self.grants.lock().unwrap().push(grant.clone());
        Ok(grant)
    }

    async fn list_objects(
        &self,
        _bucket: &str,
        start: Option<&str>,
    ) -> Result<ObjectPage, StoreError> {
        self.check_available()?;
        let objects = self.objects.lock().unwrap();
        let offset: usize = start.and_then(|s| s.parse().ok()).unwrap_or(0);
        let page: Vec<_> = objects
            .iter()
            .skip(offset)
            .take(self.page_size)
            .map(|name| crate::models::StorageObject {
                name: name.clone(),
                size: None,
                time_created: None,
            })
            .collect();
        let next = offset + page.len();
        let next_start = if next < objects.len() {
            Some(next.to_string())
        } else {
            None
        };
        Ok(ObjectPage {
            objects: page,
            next_start,
        })
    }
}
