//! Account entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_email, AccountValidationError};
use crate::domain::storage::{StorageEntity, StorageKey};

/// Account email, the primary key of the credential store
///
/// Matching is exact and case-sensitive: `A@x.com` and `a@x.com` are two
/// different accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Parse and validate an email address
    pub fn parse(email: impl Into<String>) -> Result<Self, AccountValidationError> {
        let email = email.into();
        validate_email(&email)?;
        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl StorageKey for Email {
    fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque account identifier (`u_<uuid>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn generate() -> Self {
        Self(format!("u_{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AccountId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields submitted to create an address
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewAddress {
    pub full_name: String,
    pub street_address: String,
    pub city: String,
    #[serde(alias = "pincode")]
    pub postal_code: String,
    pub phone: String,
}

/// A postal address owned by one account; immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: String,
    pub full_name: String,
    pub street_address: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// Build an address from already validated fields
    pub fn from_new(fields: NewAddress) -> Self {
        Self {
            id: format!("addr_{}", uuid::Uuid::new_v4()),
            full_name: fields.full_name.trim().to_string(),
            street_address: fields.street_address.trim().to_string(),
            city: fields.city.trim().to_string(),
            postal_code: fields.postal_code.trim().to_string(),
            phone: fields.phone.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Registered account
///
/// The password hash is part of the stored representation but is never
/// exposed through the API or `Debug` output.
#[derive(Clone, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    email: Email,
    password_hash: String,
    role: Role,
    addresses: Vec<Address>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(email: Email, password_hash: impl Into<String>, role: Role) -> Self {
        let now = Utc::now();

        Self {
            id: AccountId::generate(),
            email,
            password_hash: password_hash.into(),
            role,
            addresses: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Append an address, keeping insertion order
    pub fn add_address(&mut self, address: Address) {
        self.addresses.push(address);
        self.updated_at = Utc::now();
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[hidden]")
            .field("role", &self.role)
            .field("addresses", &self.addresses.len())
            .finish()
    }
}

impl StorageEntity for Account {
    type Key = Email;

    fn key(&self) -> &Self::Key {
        &self.email
    }
}
