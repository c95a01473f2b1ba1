//! Auth gateway: register, login, refresh, logout and the gate checks

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::jwt::{AccessClaims, RefreshClaims, SignedToken, TokenIssuer};
use super::sessions::SessionRegistry;
use crate::domain::account::{Account, Role};
use crate::domain::DomainError;
use crate::infrastructure::account::AccountService;
use crate::infrastructure::observability::{record_auth_event, set_active_sessions, AuthEvent};

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";
const REJECTED_REFRESH_TOKEN: &str = "Refresh token invalid";

/// Tokens handed to a client after login or refresh
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    /// Absent when refresh tokens are not rotated
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

/// Authentication service tying accounts, tokens and sessions together
#[derive(Debug)]
pub struct AuthService {
    accounts: Arc<AccountService>,
    tokens: Arc<dyn TokenIssuer>,
    sessions: Arc<SessionRegistry>,
    rotate_refresh_tokens: bool,
}

impl AuthService {
    pub fn new(
        accounts: Arc<AccountService>,
        tokens: Arc<dyn TokenIssuer>,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            accounts,
            tokens,
            sessions,
            rotate_refresh_tokens: true,
        }
    }

    /// Toggle single-use refresh tokens
    pub fn with_rotation(mut self, rotate_refresh_tokens: bool) -> Self {
        self.rotate_refresh_tokens = rotate_refresh_tokens;
        self
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<Account, DomainError> {
        let result = self.accounts.register(email, password).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(DomainError::Conflict { .. }) => "conflict",
            Err(DomainError::Validation { .. }) => "invalid",
            Err(_) => "error",
        };
        record_auth_event(AuthEvent::Register, outcome);

        result
    }

    /// Exchange credentials for an access/refresh token pair
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, DomainError> {
        let Some(account) = self.accounts.authenticate(email, password).await? else {
            warn!("Login rejected: invalid credentials");
            record_auth_event(AuthEvent::Login, "invalid_credentials");
            return Err(DomainError::unauthenticated(INVALID_CREDENTIALS));
        };

        let access = self.issue_access(&account)?;
        let refresh = self.issue_and_register_refresh(&account).await?;

        info!(account_id = %account.id(), role = %account.role(), "Login succeeded");
        record_auth_event(AuthEvent::Login, "success");
        self.publish_session_count().await;

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: Some(refresh.token),
            expires_in: self.tokens.access_ttl_secs(),
        })
    }

    /// Mint a new access token from a registered refresh token
    ///
    /// A registered token that fails verification is revoked on the spot.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<TokenPair, DomainError> {
        let token = match refresh_token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(self.refresh_unknown()),
        };

        if !self.sessions.is_valid(token).await? {
            return Err(self.refresh_unknown());
        }

        let claims = match self.tokens.verify_refresh_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                self.sessions.revoke(token).await?;
                self.publish_session_count().await;
                warn!(error = %e, "Refresh token failed verification and was revoked");
                record_auth_event(AuthEvent::Refresh, "rejected");
                return Err(DomainError::forbidden(REJECTED_REFRESH_TOKEN));
            }
        };

        if self.rotate_refresh_tokens && self.sessions.consume(token).await?.is_none() {
            debug!("Refresh token already consumed by a concurrent request");
            return Err(self.refresh_unknown());
        }

        let account = self.account_for(&claims).await?;
        let access = self.issue_access(&account)?;

        let refresh_token = if self.rotate_refresh_tokens {
            Some(self.issue_and_register_refresh(&account).await?.token)
        } else {
            None
        };

        debug!(account_id = %account.id(), "Access token refreshed");
        record_auth_event(AuthEvent::Refresh, "success");
        if self.rotate_refresh_tokens {
            self.publish_session_count().await;
        }

        Ok(TokenPair {
            access_token: access.token,
            refresh_token,
            expires_in: self.tokens.access_ttl_secs(),
        })
    }

    /// Revoke a refresh token; absent and unknown tokens are accepted
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<(), DomainError> {
        let revoked = match refresh_token {
            Some(token) => self.sessions.revoke(token).await?,
            None => false,
        };

        record_auth_event(AuthEvent::Logout, if revoked { "revoked" } else { "noop" });
        if revoked {
            self.publish_session_count().await;
        }
        Ok(())
    }

    /// Verify a bearer access token
    pub fn authenticate(&self, access_token: &str) -> Result<AccessClaims, DomainError> {
        self.tokens.verify_access_token(access_token).map_err(|e| {
            debug!(error = %e, "Access token rejected");
            DomainError::forbidden("Invalid or expired token")
        })
    }

    /// Require the claims to carry exactly `required`
    pub fn authorize(&self, claims: &AccessClaims, required: Role) -> Result<(), DomainError> {
        if claims.role == required {
            Ok(())
        } else {
            debug!(account_id = %claims.sub, role = %claims.role, "Authorization denied");
            Err(DomainError::forbidden(format!("Role '{}' required", required)))
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Keep the active session gauge in step with the registry
    async fn publish_session_count(&self) {
        match self.sessions.count().await {
            Ok(active) => set_active_sessions(active),
            Err(e) => debug!(error = %e, "Could not count sessions"),
        }
    }

    fn refresh_unknown(&self) -> DomainError {
        record_auth_event(AuthEvent::Refresh, "unknown");
        DomainError::unauthenticated(INVALID_REFRESH_TOKEN)
    }

    async fn account_for(&self, claims: &RefreshClaims) -> Result<Account, DomainError> {
        match self.accounts.find_by_email(&claims.email).await? {
            Some(account) => Ok(account),
            None => {
                warn!(account_id = %claims.sub, "Refresh token refers to a missing account");
                Err(self.refresh_unknown())
            }
        }
    }

    fn issue_access(&self, account: &Account) -> Result<SignedToken<AccessClaims>, DomainError> {
        Ok(self
            .tokens
            .issue_access_token(account.id(), account.email(), account.role())?)
    }

    async fn issue_and_register_refresh(
        &self,
        account: &Account,
    ) -> Result<SignedToken<RefreshClaims>, DomainError> {
        let refresh = self
            .tokens
            .issue_refresh_token(account.id(), account.email())?;

        let expires_at = DateTime::<Utc>::from_timestamp(refresh.claims.exp, 0)
            .ok_or_else(|| DomainError::internal("Refresh token expiry out of range"))?;

        self.sessions
            .register(&refresh.token, account.email(), account.id(), expires_at)
            .await?;

        Ok(refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{Account, Email};
    use crate::domain::session::RefreshSession;
    use crate::infrastructure::account::{Argon2Hasher, StorageAccountRepository};
    use crate::infrastructure::auth::{JwtConfig, JwtService};
    use crate::infrastructure::storage::InMemoryStorage;

    fn tokens() -> Arc<JwtService> {
        Arc::new(JwtService::new(JwtConfig::new("access-test-secret", "refresh-test-secret")).unwrap())
    }

    fn service_with(rotate: bool) -> AuthService {
        let accounts = AccountService::new(
            Arc::new(StorageAccountRepository::new(Arc::new(
                InMemoryStorage::<Account>::new(),
            ))),
            Arc::new(Argon2Hasher::new()),
        );
        let sessions = SessionRegistry::new(Arc::new(InMemoryStorage::<RefreshSession>::new()));

        AuthService::new(Arc::new(accounts), tokens(), Arc::new(sessions)).with_rotation(rotate)
    }

    fn service() -> AuthService {
        service_with(true)
    }

    async fn logged_in(service: &AuthService, email: &str) -> TokenPair {
        service.register(email, "secret1").await.unwrap();
        service.login(email, "secret1").await.unwrap()
    }

    #[tokio::test]
    async fn test_login_issues_registered_pair() {
        let service = service();
        let pair = logged_in(&service, "a@x.com").await;

        assert_eq!(pair.expires_in, 900);
        let refresh = pair.refresh_token.unwrap();
        assert!(service.sessions().is_valid(&refresh).await.unwrap());

        let claims = service.authenticate(&pair.access_token).unwrap();
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();
        service.register("a@x.com", "secret1").await.unwrap();

        let wrong_password = service.login("a@x.com", "wrong1").await.unwrap_err();
        let unknown_email = service.login("nobody@x.com", "secret1").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, DomainError::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_refresh_carries_identity_and_current_role() {
        let service = service();
        service.register("a@x.com", "secret1").await.unwrap();
        let pair = logged_in(&service, "b@x.com").await;

        let refreshed = service
            .refresh(pair.refresh_token.as_deref())
            .await
            .unwrap();
        let claims = service.authenticate(&refreshed.access_token).unwrap();

        assert_eq!(claims.email, "b@x.com");
        assert_eq!(claims.role, Role::User);
    }

    #[tokio::test]
    async fn test_rotated_token_is_single_use() {
        let service = service();
        let pair = logged_in(&service, "a@x.com").await;
        let original = pair.refresh_token.unwrap();

        let rotated = service.refresh(Some(&original)).await.unwrap();
        let replacement = rotated.refresh_token.unwrap();

        assert_ne!(original, replacement);
        assert!(matches!(
            service.refresh(Some(&original)).await,
            Err(DomainError::Unauthenticated { .. })
        ));
        assert!(service.refresh(Some(&replacement)).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_refresh_single_winner() {
        let service = Arc::new(service());
        let token = logged_in(&service, "a@x.com").await.refresh_token.unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let service = service.clone();
                let token = token.clone();
                tokio::spawn(async move { service.refresh(Some(&token)).await.is_ok() })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_refresh_without_rotation_keeps_token() {
        let service = service_with(false);
        let token = logged_in(&service, "a@x.com").await.refresh_token.unwrap();

        let first = service.refresh(Some(&token)).await.unwrap();
        assert!(first.refresh_token.is_none());
        assert!(service.refresh(Some(&token)).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_unknown_and_missing_tokens() {
        let service = service();

        assert!(matches!(
            service.refresh(None).await,
            Err(DomainError::Unauthenticated { .. })
        ));
        assert!(matches!(
            service.refresh(Some("never-issued")).await,
            Err(DomainError::Unauthenticated { .. })
        ));
    }

    #[tokio::test]
    async fn test_tampered_registered_token_is_revoked() {
        let service = service();
        let account = service.register("a@x.com", "secret1").await.unwrap();

        // Signed with the access secret, so it fails refresh verification
        let forged = service
            .tokens
            .issue_access_token(account.id(), account.email(), account.role())
            .unwrap()
            .token;
        service
            .sessions()
            .register(
                &forged,
                &Email::parse("a@x.com").unwrap(),
                account.id(),
                Utc::now() + chrono::Duration::days(1),
            )
            .await
            .unwrap();

        assert!(matches!(
            service.refresh(Some(&forged)).await,
            Err(DomainError::Forbidden { .. })
        ));
        assert!(matches!(
            service.refresh(Some(&forged)).await,
            Err(DomainError::Unauthenticated { .. })
        ));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let service = service();
        let token = logged_in(&service, "a@x.com").await.refresh_token.unwrap();

        service.logout(Some(&token)).await.unwrap();
        service.logout(Some(&token)).await.unwrap();
        service.logout(None).await.unwrap();

        assert!(matches!(
            service.refresh(Some(&token)).await,
            Err(DomainError::Unauthenticated { .. })
        ));
    }

    #[tokio::test]
    async fn test_authorize_requires_matching_role() {
        let service = service();
        let admin = logged_in(&service, "a@x.com").await;
        let user = logged_in(&service, "b@x.com").await;

        let admin_claims = service.authenticate(&admin.access_token).unwrap();
        let user_claims = service.authenticate(&user.access_token).unwrap();

        assert!(service.authorize(&admin_claims, Role::Admin).is_ok());
        assert!(matches!(
            service.authorize(&user_claims, Role::Admin),
            Err(DomainError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_refresh_token() {
        let service = service();
        let pair = logged_in(&service, "a@x.com").await;

        assert!(matches!(
            service.authenticate(&pair.refresh_token.unwrap()),
            Err(DomainError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_active_session_gauge_follows_login_and_logout() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let service = service();

        let token = metrics::with_local_recorder(&recorder, || {
            tokio_test::block_on(logged_in(&service, "a@x.com"))
                .refresh_token
                .unwrap()
        });
        assert!(handle.render().contains("auth_active_sessions 1"));

        metrics::with_local_recorder(&recorder, || {
            tokio_test::block_on(service.logout(Some(&token))).unwrap();
        });
        assert!(handle.render().contains("auth_active_sessions 0"));
    }
}
