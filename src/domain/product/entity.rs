//! Product entity and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validation::{validate_changes, validate_new_product};
use crate::domain::error::FieldViolation;
use crate::domain::storage::{StorageEntity, StorageKey};

/// Product identifier (`p_<uuid>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn generate() -> Self {
        Self(format!("p_{}", uuid::Uuid::new_v4()))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl StorageKey for ProductId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Listing status shown in the admin panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("Unknown product status '{}'", other)),
        }
    }
}

/// A set of product field values; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub stock: Option<u32>,
    pub unit: Option<String>,
    pub status: Option<ProductStatus>,
    pub image: Option<String>,
}

/// Catalogue product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    description: String,
    price: Decimal,
    image: Option<String>,
    category: String,
    stock: u32,
    unit: String,
    status: ProductStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Create a product; `name` and `price` are required
    pub fn create(changes: ProductChanges) -> Result<Self, Vec<FieldViolation>> {
        validate_new_product(&changes)?;
        let now = Utc::now();

        Ok(Self {
            id: ProductId::generate(),
            name: changes.name.unwrap_or_default().trim().to_string(),
            description: changes.description.unwrap_or_default(),
            price: changes.price.unwrap_or_default(),
            image: changes.image,
            category: changes.category.unwrap_or_default(),
            stock: changes.stock.unwrap_or_default(),
            unit: changes.unit.unwrap_or_default(),
            status: changes.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update
    pub fn apply(&mut self, changes: ProductChanges) -> Result<(), Vec<FieldViolation>> {
        validate_changes(&changes)?;

        if let Some(name) = changes.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        if let Some(stock) = changes.stock {
            self.stock = stock;
        }
        if let Some(unit) = changes.unit {
            self.unit = unit;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if changes.image.is_some() {
            self.image = changes.image;
        }

        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn status(&self) -> ProductStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl StorageEntity for Product {
    type Key = ProductId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}
