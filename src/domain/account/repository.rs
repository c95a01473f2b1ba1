//! Account repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{Account, Email};
use crate::domain::DomainError;

/// Repository trait for account storage
#[async_trait]
pub trait AccountRepository: Send + Sync + Debug {
    /// Get an account by its email
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, DomainError>;

    /// Insert a new account, fails with `Conflict` on a taken email
    async fn create(&self, account: Account) -> Result<Account, DomainError>;

    /// Replace an existing account
    async fn update(&self, account: Account) -> Result<Account, DomainError>;

    /// Number of registered accounts
    async fn count(&self) -> Result<usize, DomainError>;
}
