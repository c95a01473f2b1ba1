//! Product validation

use rust_decimal::Decimal;
use thiserror::Error;

use super::entity::ProductChanges;
use crate::domain::error::FieldViolation;

/// Errors that can occur during product validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProductValidationError {
    #[error("Name is required")]
    MissingName,

    #[error("Name exceeds maximum length of {0} characters")]
    NameTooLong(usize),

    #[error("Price is required")]
    MissingPrice,

    #[error("Price cannot be negative")]
    NegativePrice,
}

impl ProductValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingName | Self::NameTooLong(_) => "name",
            Self::MissingPrice | Self::NegativePrice => "price",
        }
    }
}

impl From<ProductValidationError> for FieldViolation {
    fn from(err: ProductValidationError) -> Self {
        FieldViolation::new(err.field(), err.to_string())
    }
}

const MAX_NAME_LENGTH: usize = 200;

/// Checks that apply to any set of product changes
pub fn validate_changes(changes: &ProductChanges) -> Result<(), Vec<FieldViolation>> {
    collect(changes_errors(changes))
}

/// Checks for a new product: `name` and `price` must be present
pub fn validate_new_product(changes: &ProductChanges) -> Result<(), Vec<FieldViolation>> {
    let mut errors = Vec::new();

    if changes.name.is_none() {
        errors.push(ProductValidationError::MissingName);
    }
    if changes.price.is_none() {
        errors.push(ProductValidationError::MissingPrice);
    }
    errors.extend(changes_errors(changes));

    collect(errors)
}

fn changes_errors(changes: &ProductChanges) -> Vec<ProductValidationError> {
    let mut errors = Vec::new();

    if let Some(name) = &changes.name {
        let name = name.trim();

        if name.is_empty() {
            errors.push(ProductValidationError::MissingName);
        } else if name.chars().count() > MAX_NAME_LENGTH {
            errors.push(ProductValidationError::NameTooLong(MAX_NAME_LENGTH));
        }
    }

    if changes.price.is_some_and(|price| price < Decimal::ZERO) {
        errors.push(ProductValidationError::NegativePrice);
    }

    errors
}

fn collect(errors: Vec<ProductValidationError>) -> Result<(), Vec<FieldViolation>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.into_iter().map(FieldViolation::from).collect())
    }
}
