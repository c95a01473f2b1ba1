//! Account and address validation utilities

use thiserror::Error;
use validator::ValidateEmail;

use super::entity::NewAddress;
use crate::domain::error::FieldViolation;

/// Errors that can occur during account validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AccountValidationError {
    #[error("Email cannot be empty")]
    EmptyEmail,

    #[error("Email exceeds maximum length of {0} characters")]
    EmailTooLong(usize),

    #[error("Email is not a valid address")]
    InvalidEmail,

    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("Password exceeds maximum length of {0} characters")]
    PasswordTooLong(usize),
}

impl AccountValidationError {
    /// Name of the request field this error refers to
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyEmail | Self::EmailTooLong(_) | Self::InvalidEmail => "email",
            Self::PasswordTooShort(_) | Self::PasswordTooLong(_) => "password",
        }
    }
}

impl From<AccountValidationError> for FieldViolation {
    fn from(err: AccountValidationError) -> Self {
        FieldViolation::new(err.field(), err.to_string())
    }
}

const MAX_EMAIL_LENGTH: usize = 254;
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_ADDRESS_FIELD_LENGTH: usize = 200;

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), AccountValidationError> {
    if email.is_empty() {
        return Err(AccountValidationError::EmptyEmail);
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(AccountValidationError::EmailTooLong(MAX_EMAIL_LENGTH));
    }

    if !email.to_string().validate_email() {
        return Err(AccountValidationError::InvalidEmail);
    }

    Ok(())
}

/// Validate a password against the length policy
///
/// Length is counted in characters, not bytes.
pub fn validate_password(password: &str, min_length: usize) -> Result<(), AccountValidationError> {
    let length = password.chars().count();

    if length < min_length {
        return Err(AccountValidationError::PasswordTooShort(min_length));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(AccountValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

/// Validate address fields, reporting every offending field
pub fn validate_address(fields: &NewAddress) -> Result<(), Vec<FieldViolation>> {
    let checks = [
        ("fullName", "Full name", &fields.full_name),
        ("streetAddress", "Street address", &fields.street_address),
        ("city", "City", &fields.city),
        ("postalCode", "Postal code", &fields.postal_code),
        ("phone", "Phone", &fields.phone),
    ];

    let violations: Vec<FieldViolation> = checks
        .iter()
        .filter_map(|(field, label, value)| {
            let value = value.trim();

            if value.is_empty() {
                Some(FieldViolation::new(*field, format!("{} is required", label)))
            } else if value.chars().count() > MAX_ADDRESS_FIELD_LENGTH {
                Some(FieldViolation::new(
                    *field,
                    format!("{} exceeds {} characters", label, MAX_ADDRESS_FIELD_LENGTH),
                ))
            } else {
                None
            }
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
