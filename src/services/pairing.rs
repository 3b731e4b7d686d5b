use std::sync::Arc;
use uuid::Uuid;

use crate::config::Credentials;
use crate::services::cache::GrantCache;
use crate::services::ServiceError;

/// Device-pairing state machine. A viewing device calls [`begin`] and polls
/// [`poll`] while a second device submits the shared credentials via
/// [`submit_credentials`]. There is no explicit expired state: once the
/// cache TTL elapses the session reads as if it never existed.
///
/// [`begin`]: PairingService::begin
/// [`poll`]: PairingService::poll
/// [`submit_credentials`]: PairingService::submit_credentials
#[derive(Clone)]
pub struct PairingService {
    cache: Arc<dyn GrantCache>,
    credentials: Credentials,
}

impl PairingService {
    pub fn new(cache: Arc<dyn GrantCache>, credentials: Credentials) -> Self {
        Self { cache, credentials }
    }

    /// Mint a new pairing session in the pending state.
    pub async fn begin(&self) -> Result<String, ServiceError> {
        let session_id = Uuid::new_v4().to_string();
        self.cache.set_auth(&session_id, false).await?;
        tracing::debug!(session_id = %session_id, "Pairing session created");
        Ok(session_id)
    }

    /// Validate the shared credentials against a pending session and flip it
    /// to authenticated.
    ///
    /// Every failure mode (wrong credentials, unknown session, expired
    /// session) surfaces as the same [`ServiceError::AuthenticationFailed`]
    /// so the caller cannot tell which check failed; the distinction exists
    /// only in the logs.
    pub async fn submit_credentials(
        &self,
        session_id: &str,
        username: &str,
        password: &str,
    ) -> Result<(), ServiceError> {
        let credentials_ok = self.credentials.matches(username, password);
        // Existence independent of value: a guessed session identifier that
        // was never minted by begin() cannot be flipped to authenticated.
        let session_known = self.cache.exists_auth(session_id).await;

        if !credentials_ok || !session_known {
            if !credentials_ok {
                tracing::debug!(session_id = %session_id, "Credential mismatch on pairing attempt");
            } else {
                tracing::debug!(session_id = %session_id, "Pairing attempt for unknown or expired session");
            }
            return Err(ServiceError::AuthenticationFailed);
        }

        self.cache.set_auth(session_id, true).await?;
        tracing::info!(session_id = %session_id, "Pairing session authenticated");
        Ok(())
    }

    /// Pure O(1) read of the session's auth flag. Never blocks server-side;
    /// the pending device implements the wait by polling on an interval.
    /// `false` covers pending, expired, and never-created alike and is not
    /// an error.
    pub async fn poll(&self, session_id: &str) -> bool {
        self.cache.get_auth(session_id).await
    }
}
