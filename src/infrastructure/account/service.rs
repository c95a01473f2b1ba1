//! Account service: registration, credential checks and addresses

use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

use crate::domain::account::{
    validate_address, validate_password, Account, AccountRepository, Address, Email, NewAddress,
    Role, DEFAULT_MIN_PASSWORD_LENGTH,
};
use crate::domain::error::FieldViolation;
use crate::domain::DomainError;

use super::password::PasswordHasher;

/// Verified against when an email is unknown, so a miss costs one Argon2 run
const DUMMY_PASSWORD: &str = "storefront-dummy-password";

/// Credential store for registered accounts
#[derive(Debug)]
pub struct AccountService {
    repository: Arc<dyn AccountRepository>,
    hasher: Arc<dyn PasswordHasher>,
    min_password_length: usize,
    /// Serializes the first-admin check with the insert, and address appends
    write_lock: Mutex<()>,
    dummy_hash: OnceCell<String>,
}

impl AccountService {
    pub fn new(repository: Arc<dyn AccountRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            repository,
            hasher,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            write_lock: Mutex::new(()),
            dummy_hash: OnceCell::new(),
        }
    }

    pub fn with_min_password_length(mut self, min_password_length: usize) -> Self {
        self.min_password_length = min_password_length;
        self
    }

    /// Register a new account
    ///
    /// The first account ever registered becomes an admin.
    pub async fn register(&self, email: &str, password: &str) -> Result<Account, DomainError> {
        let mut violations: Vec<FieldViolation> = Vec::new();

        let email = match Email::parse(email) {
            Ok(email) => Some(email),
            Err(e) => {
                violations.push(e.into());
                None
            }
        };

        if let Err(e) = validate_password(password, self.min_password_length) {
            violations.push(e.into());
        }

        let Some(email) = email.filter(|_| violations.is_empty()) else {
            return Err(DomainError::invalid_fields(violations));
        };

        let password_hash = self.hash_password(password).await?;

        let _guard = self.write_lock.lock().await;

        if self.repository.find_by_email(&email).await?.is_some() {
            return Err(DomainError::conflict("User already exists"));
        }

        let role = if self.repository.count().await? == 0 {
            Role::Admin
        } else {
            Role::User
        };

        let account = self
            .repository
            .create(Account::new(email, password_hash, role))
            .await?;

        info!(account_id = %account.id(), role = %role, "Account registered");
        Ok(account)
    }

    /// Look up an account by exact email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DomainError> {
        match Email::parse(email) {
            Ok(email) => self.repository.find_by_email(&email).await,
            Err(_) => Ok(None),
        }
    }

    /// Check a password against the account's stored hash
    pub async fn verify_password(
        &self,
        account: &Account,
        password: &str,
    ) -> Result<bool, DomainError> {
        self.verify_hash(password, account.password_hash().to_string())
            .await
    }

    /// Resolve an account from credentials
    ///
    /// Returns `None` for an unknown email or a wrong password alike.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Account>, DomainError> {
        let Some(account) = self.find_by_email(email).await? else {
            let dummy = self.dummy_hash().await?;
            self.verify_hash(password, dummy).await?;
            debug!("Authentication failed: unknown email");
            return Ok(None);
        };

        if self.verify_password(&account, password).await? {
            Ok(Some(account))
        } else {
            debug!(account_id = %account.id(), "Authentication failed: wrong password");
            Ok(None)
        }
    }

    /// Append an address to an account
    pub async fn add_address(
        &self,
        email: &str,
        fields: NewAddress,
    ) -> Result<Address, DomainError> {
        validate_address(&fields).map_err(DomainError::invalid_fields)?;

        let _guard = self.write_lock.lock().await;

        let mut account = self.require_account(email).await?;
        let address = Address::from_new(fields);

        account.add_address(address.clone());
        self.repository.update(account).await?;

        debug!(address_id = %address.id, "Address added");
        Ok(address)
    }

    /// Addresses of an account in insertion order
    pub async fn list_addresses(&self, email: &str) -> Result<Vec<Address>, DomainError> {
        let account = self.require_account(email).await?;
        Ok(account.addresses().to_vec())
    }

    pub async fn count(&self) -> Result<usize, DomainError> {
        self.repository.count().await
    }

    async fn require_account(&self, email: &str) -> Result<Account, DomainError> {
        self.find_by_email(email)
            .await?
            .ok_or_else(|| DomainError::not_found("User not found"))
    }

    async fn hash_password(&self, password: &str) -> Result<String, DomainError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::internal(format!("Password hashing task failed: {}", e)))?
    }

    async fn verify_hash(&self, password: &str, hash: String) -> Result<bool, DomainError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| DomainError::internal(format!("Password verification task failed: {}", e)))
    }

    async fn dummy_hash(&self) -> Result<String, DomainError> {
        self.dummy_hash
            .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD))
            .await
            .cloned()
    }
}
