//! Account infrastructure module
//!
//! Argon2 password hashing, the storage-backed account repository and the
//! account service used by the auth gateway and address endpoints.

mod password;
mod repository;
mod service;

pub use password::{Argon2Hasher, PasswordHasher};
pub use repository::StorageAccountRepository;
pub use service::AccountService;
