//! Refresh session entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::account::{AccountId, Email};
use crate::domain::storage::{StorageEntity, StorageKey};

/// Raw refresh token, used verbatim as the registry key
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl StorageKey for SessionToken {
    fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are bearer credentials; only a short prefix ever reaches logs.
impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "SessionToken({}…)", prefix)
    }
}

/// A live refresh token and the account it was issued to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSession {
    pub token: SessionToken,
    pub email: Email,
    pub account_id: AccountId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RefreshSession {
    pub fn new(
        token: SessionToken,
        email: Email,
        account_id: AccountId,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token,
            email,
            account_id,
            issued_at,
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl StorageEntity for RefreshSession {
    type Key = SessionToken;

    fn key(&self) -> &Self::Key {
        &self.token
    }
}
