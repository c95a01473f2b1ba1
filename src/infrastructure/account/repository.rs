//! Storage-backed account repository

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::account::{Account, AccountRepository, Email};
use crate::domain::storage::Storage;
use crate::domain::DomainError;

/// Storage-backed implementation of AccountRepository
#[derive(Debug)]
pub struct StorageAccountRepository {
    storage: Arc<dyn Storage<Account>>,
}

impl StorageAccountRepository {
    pub fn new(storage: Arc<dyn Storage<Account>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl AccountRepository for StorageAccountRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, DomainError> {
        self.storage.get(email).await
    }

    async fn create(&self, account: Account) -> Result<Account, DomainError> {
        self.storage.create(account).await.map_err(|e| match e {
            DomainError::Conflict { .. } => DomainError::conflict("User already exists"),
            other => other,
        })
    }

    async fn update(&self, account: Account) -> Result<Account, DomainError> {
        if !self.storage.exists(account.email()).await? {
            return Err(DomainError::not_found(format!(
                "Account '{}' not found",
                account.email()
            )));
        }

        self.storage.update(account).await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        self.storage.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::Role;
    use crate::infrastructure::storage::InMemoryStorage;

    fn repository() -> StorageAccountRepository {
        StorageAccountRepository::new(Arc::new(InMemoryStorage::<Account>::new()))
    }

    fn account(email: &str) -> Account {
        Account::new(Email::parse(email).unwrap(), "$argon2id$stub", Role::User)
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = repository();
        repo.create(account("a@x.com")).await.unwrap();

        let found = repo
            .find_by_email(&Email::parse("a@x.com").unwrap())
            .await
            .unwrap();

        assert!(found.is_some());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = repository();
        repo.create(account("a@x.com")).await.unwrap();

        let result = repo.create(account("a@x.com")).await;
        match result {
            Err(DomainError::Conflict { message }) => assert_eq!(message, "User already exists"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_email_lookup_is_exact() {
        let repo = repository();
        repo.create(account("a@x.com")).await.unwrap();

        let found = repo
            .find_by_email(&Email::parse("A@x.com").unwrap())
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_account() {
        let repo = repository();

        let result = repo.update(account("ghost@x.com")).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
