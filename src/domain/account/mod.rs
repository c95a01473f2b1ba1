//! Account domain
//!
//! Domain types for registered accounts: identity, role, postal addresses,
//! validation rules and the repository trait.

mod entity;
mod repository;
mod validation;

pub use entity::{Account, AccountId, Address, Email, NewAddress, Role};
pub use repository::AccountRepository;
pub use validation::{
    validate_address, validate_email, validate_password, AccountValidationError,
    DEFAULT_MIN_PASSWORD_LENGTH,
};
