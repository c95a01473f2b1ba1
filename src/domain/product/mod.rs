//! Product domain - catalogue entities and validation

mod entity;
mod validation;

pub use entity::{Product, ProductChanges, ProductId, ProductStatus};
pub use validation::{validate_changes, validate_new_product, ProductValidationError};
