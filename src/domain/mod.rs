//! Domain layer - Core business logic and entities

pub mod account;
pub mod error;
pub mod product;
pub mod session;
pub mod storage;

pub use account::{
    Account, AccountId, AccountRepository, AccountValidationError, Address, Email, NewAddress,
    Role,
};
pub use error::{DomainError, FieldViolation};
pub use product::{Product, ProductChanges, ProductId, ProductStatus, ProductValidationError};
pub use session::{RefreshSession, SessionToken};
pub use storage::{Storage, StorageEntity, StorageKey};
