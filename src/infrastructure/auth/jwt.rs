//! JWT access and refresh token signing and verification

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

use crate::domain::account::{AccountId, Email, Role};
use crate::domain::DomainError;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (account ID)
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

impl AccessClaims {
    pub fn account_id(&self) -> &str {
        &self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Claims carried by a refresh token
///
/// No role: the current role is looked up again when the token is exchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub email: String,
    /// Random token ID, keeps tokens minted in the same second distinct
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// An encoded token together with the claims it was signed from
#[derive(Debug, Clone)]
pub struct SignedToken<C> {
    pub token: String,
    pub claims: C,
}

/// Token verification and signing failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token is malformed or its signature is invalid")]
    Malformed,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for DomainError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired | TokenError::Malformed => DomainError::forbidden(err.to_string()),
            TokenError::Signing(_) => DomainError::internal(err.to_string()),
        }
    }
}

/// Configuration for the JWT service
#[derive(Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

impl JwtConfig {
    pub const DEFAULT_ACCESS_TTL_SECS: u64 = 15 * 60;
    pub const DEFAULT_REFRESH_TTL_SECS: u64 = 7 * 24 * 60 * 60;

    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl_secs: Self::DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: Self::DEFAULT_REFRESH_TTL_SECS,
        }
    }

    pub fn with_ttls(mut self, access_ttl_secs: u64, refresh_ttl_secs: u64) -> Self {
        self.access_ttl_secs = access_ttl_secs;
        self.refresh_ttl_secs = refresh_ttl_secs;
        self
    }

    /// Both secrets must be set and must differ
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            return Err(DomainError::configuration(
                "Access and refresh token secrets must not be empty",
            ));
        }

        if self.access_secret == self.refresh_secret {
            return Err(DomainError::configuration(
                "Access and refresh token secrets must differ",
            ));
        }

        if self.access_ttl_secs == 0 || self.refresh_ttl_secs == 0 {
            return Err(DomainError::configuration("Token lifetimes must be positive"));
        }

        Ok(())
    }
}

impl Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"[hidden]")
            .field("refresh_secret", &"[hidden]")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

/// Trait for minting and checking session tokens
pub trait TokenIssuer: Send + Sync + Debug {
    /// Sign an access token issued now
    fn issue_access_token(
        &self,
        account_id: &AccountId,
        email: &Email,
        role: Role,
    ) -> Result<SignedToken<AccessClaims>, TokenError> {
        self.issue_access_token_at(account_id, email, role, Utc::now().timestamp())
    }

    /// Sign an access token with an explicit issuance time
    fn issue_access_token_at(
        &self,
        account_id: &AccountId,
        email: &Email,
        role: Role,
        issued_at: i64,
    ) -> Result<SignedToken<AccessClaims>, TokenError>;

    /// Sign a refresh token issued now
    fn issue_refresh_token(
        &self,
        account_id: &AccountId,
        email: &Email,
    ) -> Result<SignedToken<RefreshClaims>, TokenError>;

    fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError>;

    fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError>;

    /// Access token lifetime, reported to clients as `expiresIn`
    fn access_ttl_secs(&self) -> u64;
}

/// HS256 implementation with separate access and refresh keys
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    validation: Validation,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("config", &self.config)
            .field("algorithm", &ALGORITHM)
            .finish()
    }
}

impl JwtService {
    /// Create a new JWT service, rejecting unusable secrets
    pub fn new(config: JwtConfig) -> Result<Self, DomainError> {
        config.validate()?;

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;

        Ok(Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            validation,
            config,
        })
    }

    fn sign<C: Serialize>(&self, claims: &C, key: &EncodingKey) -> Result<String, TokenError> {
        encode(&Header::new(ALGORITHM), claims, key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify<C: DeserializeOwned>(&self, token: &str, key: &DecodingKey) -> Result<C, TokenError> {
        decode::<C>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }
}

impl TokenIssuer for JwtService {
    fn issue_access_token_at(
        &self,
        account_id: &AccountId,
        email: &Email,
        role: Role,
        issued_at: i64,
    ) -> Result<SignedToken<AccessClaims>, TokenError> {
        let claims = AccessClaims {
            sub: account_id.as_str().to_string(),
            email: email.as_str().to_string(),
            role,
            iat: issued_at,
            exp: issued_at + self.config.access_ttl_secs as i64,
        };

        let token = self.sign(&claims, &self.access_encoding)?;
        Ok(SignedToken { token, claims })
    }

    fn issue_refresh_token(
        &self,
        account_id: &AccountId,
        email: &Email,
    ) -> Result<SignedToken<RefreshClaims>, TokenError> {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: account_id.as_str().to_string(),
            email: email.as_str().to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.config.refresh_ttl_secs as i64,
        };

        let token = self.sign(&claims, &self.refresh_encoding)?;
        Ok(SignedToken { token, claims })
    }

    fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.verify(token, &self.access_decoding)
    }

    fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.verify(token, &self.refresh_decoding)
    }

    fn access_ttl_secs(&self) -> u64 {
        self.config.access_ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(JwtConfig::new("access-secret-for-tests", "refresh-secret-for-tests"))
            .unwrap()
    }

    fn identity() -> (AccountId, Email) {
        (
            AccountId::from("u_test".to_string()),
            Email::parse("a@x.com").unwrap(),
        )
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = service();
        let (id, email) = identity();

        let signed = service.issue_access_token(&id, &email, Role::Admin).unwrap();
        let claims = service.verify_access_token(&signed.token).unwrap();

        assert_eq!(claims, signed.claims);
        assert_eq!(claims.account_id(), "u_test");
        assert_eq!(claims.email, "a@x.com");
        assert!(claims.is_admin());
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_access_token_is_deterministic_within_a_second() {
        let service = service();
        let (id, email) = identity();

        let first = service
            .issue_access_token_at(&id, &email, Role::User, 1_700_000_000)
            .unwrap();
        let second = service
            .issue_access_token_at(&id, &email, Role::User, 1_700_000_000)
            .unwrap();

        assert_eq!(first.token, second.token);
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let service = service();
        let (id, email) = identity();

        let first = service.issue_refresh_token(&id, &email).unwrap();
        let second = service.issue_refresh_token(&id, &email).unwrap();

        assert_ne!(first.token, second.token);
        assert_eq!(first.claims.exp - first.claims.iat, 604_800);
    }

    #[test]
    fn test_expired_access_token() {
        let service = service();
        let (id, email) = identity();
        let issued_at = Utc::now().timestamp() - 901;

        let signed = service
            .issue_access_token_at(&id, &email, Role::User, issued_at)
            .unwrap();

        assert_eq!(
            service.verify_access_token(&signed.token),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let service = service();
        let (id, email) = identity();

        let access = service.issue_access_token(&id, &email, Role::User).unwrap();
        let refresh = service.issue_refresh_token(&id, &email).unwrap();

        assert_eq!(
            service.verify_refresh_token(&access.token),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            service.verify_access_token(&refresh.token),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_swapped_payload_is_rejected() {
        let service = service();
        let (id, email) = identity();

        let user = service.issue_access_token(&id, &email, Role::User).unwrap();
        let admin = service.issue_access_token(&id, &email, Role::Admin).unwrap();

        let user_parts: Vec<&str> = user.token.split('.').collect();
        let admin_parts: Vec<&str> = admin.token.split('.').collect();
        let forged = format!("{}.{}.{}", user_parts[0], admin_parts[1], user_parts[2]);

        assert_eq!(service.verify_access_token(&forged), Err(TokenError::Malformed));
    }

    #[test]
    fn test_wrong_secret() {
        let other = JwtService::new(JwtConfig::new("another-access", "another-refresh")).unwrap();
        let (id, email) = identity();

        let signed = other.issue_access_token(&id, &email, Role::Admin).unwrap();

        assert_eq!(
            service().verify_access_token(&signed.token),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_algorithm_is_pinned() {
        let (id, email) = identity();
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: id.as_str().to_string(),
            email: email.as_str().to_string(),
            role: Role::Admin,
            iat: now,
            exp: now + 900,
        };

        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"access-secret-for-tests"),
        )
        .unwrap();

        assert_eq!(service().verify_access_token(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_garbage_token() {
        assert_eq!(
            service().verify_access_token("not-a-jwt"),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_secrets_must_differ() {
        let result = JwtService::new(JwtConfig::new("same", "same"));
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_secrets_must_be_set() {
        let result = JwtService::new(JwtConfig::new("", "refresh"));
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let output = format!("{:?}", service());
        assert!(!output.contains("access-secret-for-tests"));
        assert!(output.contains("[hidden]"));
    }

    #[test]
    fn test_token_error_maps_to_forbidden() {
        assert!(matches!(
            DomainError::from(TokenError::Expired),
            DomainError::Forbidden { .. }
        ));
    }
}
