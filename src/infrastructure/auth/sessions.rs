//! Registry of live refresh sessions

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::account::{AccountId, Email};
use crate::domain::session::{RefreshSession, SessionToken};
use crate::domain::storage::Storage;
use crate::domain::DomainError;

/// Tracks which refresh tokens are currently valid
///
/// A token moves from issued to consumed or revoked exactly once; nothing
/// re-registers a token value after it has left the registry.
#[derive(Debug)]
pub struct SessionRegistry {
    storage: Arc<dyn Storage<RefreshSession>>,
}

impl SessionRegistry {
    pub fn new(storage: Arc<dyn Storage<RefreshSession>>) -> Self {
        Self { storage }
    }

    /// Record a freshly issued refresh token
    pub async fn register(
        &self,
        token: &str,
        email: &Email,
        account_id: &AccountId,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshSession, DomainError> {
        let session = RefreshSession::new(
            SessionToken::new(token),
            email.clone(),
            account_id.clone(),
            Utc::now(),
            expires_at,
        );

        self.storage.create(session).await
    }

    pub async fn is_valid(&self, token: &str) -> Result<bool, DomainError> {
        self.storage.exists(&SessionToken::new(token)).await
    }

    /// Remove a token; unknown tokens are a no-op returning `false`
    pub async fn revoke(&self, token: &str) -> Result<bool, DomainError> {
        self.storage.delete(&SessionToken::new(token)).await
    }

    /// Atomically remove a token and return its session
    ///
    /// Of concurrent callers presenting the same token, only one gets `Some`.
    pub async fn consume(&self, token: &str) -> Result<Option<RefreshSession>, DomainError> {
        self.storage.take(&SessionToken::new(token)).await
    }

    /// Evict every session whose expiry is at or before `now`
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut purged = 0;

        for session in self.storage.list().await? {
            if session.is_expired_at(now) && self.storage.delete(&session.token).await? {
                purged += 1;
            }
        }

        if purged > 0 {
            debug!(purged, "Purged expired refresh sessions");
        }
        Ok(purged)
    }

    pub async fn count(&self) -> Result<usize, DomainError> {
        self.storage.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryStorage;
    use chrono::Duration;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Arc::new(InMemoryStorage::<RefreshSession>::new()))
    }

    fn email() -> Email {
        Email::parse("a@x.com").unwrap()
    }

    async fn register(registry: &SessionRegistry, token: &str, ttl: Duration) {
        registry
            .register(token, &email(), &AccountId::generate(), Utc::now() + ttl)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_register_and_validate() {
        let registry = registry();
        register(&registry, "token-a", Duration::days(7)).await;

        assert!(registry.is_valid("token-a").await.unwrap());
        assert!(!registry.is_valid("token-b").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let registry = registry();
        register(&registry, "token-a", Duration::days(7)).await;

        assert!(registry.revoke("token-a").await.unwrap());
        assert!(!registry.revoke("token-a").await.unwrap());
        assert!(!registry.revoke("never-issued").await.unwrap());
        assert!(!registry.is_valid("token-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_consume_once() {
        let registry = registry();
        register(&registry, "token-a", Duration::days(7)).await;

        let session = registry.consume("token-a").await.unwrap().unwrap();
        assert_eq!(session.email, email());
        assert!(registry.consume("token-a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_multiple_sessions_per_account() {
        let registry = registry();
        register(&registry, "token-a", Duration::days(7)).await;
        register(&registry, "token-b", Duration::days(7)).await;

        registry.revoke("token-a").await.unwrap();

        assert!(registry.is_valid("token-b").await.unwrap());
        assert_eq!(registry.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let registry = registry();
        register(&registry, "stale", Duration::seconds(-1)).await;
        register(&registry, "live", Duration::days(7)).await;

        assert_eq!(registry.purge_expired(Utc::now()).await.unwrap(), 1);
        assert!(!registry.is_valid("stale").await.unwrap());
        assert!(registry.is_valid("live").await.unwrap());
    }
}
