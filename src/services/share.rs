use std::sync::Arc;
use uuid::Uuid;

use crate::services::cache::GrantCache;
use crate::services::ServiceError;

/// Maximum mint attempts before giving up on a colliding share code.
const MAX_ISSUE_ATTEMPTS: usize = 4;

/// Issues and resolves durable share codes mapping to a bucket object path.
/// Codes outlive pairing sessions (48h by default) and are readable by
/// anyone who holds them.
#[derive(Clone)]
pub struct ShareService {
    cache: Arc<dyn GrantCache>,
}

impl ShareService {
    pub fn new(cache: Arc<dyn GrantCache>) -> Self {
        Self { cache }
    }

    /// Mint a share code for a content identifier. UUIDv4 entropy makes a
    /// collision negligible, but an existing code is never overwritten:
    /// mint again instead, up to a bounded number of attempts.
    pub async fn issue(&self, content_id: &str) -> Result<String, ServiceError> {
        for _ in 0..MAX_ISSUE_ATTEMPTS {
            let code = Uuid::new_v4().to_string();
            if self.cache.get_share(&code).await.is_some() {
                tracing::warn!("Share code collision, re-minting");
                continue;
            }
            self.cache.set_share(&code, content_id).await?;
            tracing::info!(content_id = %content_id, "Share link issued");
            return Ok(code);
        }
        Err(ServiceError::Internal(anyhow::anyhow!(
            "could not mint a unique share code after {} attempts",
            MAX_ISSUE_ATTEMPTS
        )))
    }

    /// Resolve a code to its content identifier. Expired and never-issued
    /// are the same `None`.
    pub async fn resolve(&self, code: &str) -> Option<String> {
        self.cache.get_share(code).await
    }
}
