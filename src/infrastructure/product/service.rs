//! Product catalogue service

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::product::{Product, ProductChanges, ProductId};
use crate::domain::storage::Storage;
use crate::domain::DomainError;

/// CRUD over the product catalogue
#[derive(Debug)]
pub struct ProductService {
    storage: Arc<dyn Storage<Product>>,
}

impl ProductService {
    pub fn new(storage: Arc<dyn Storage<Product>>) -> Self {
        Self { storage }
    }

    /// All products, oldest first
    pub async fn list(&self) -> Result<Vec<Product>, DomainError> {
        let mut products = self.storage.list().await?;
        products.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().as_str().cmp(b.id().as_str()))
        });
        Ok(products)
    }

    pub async fn get(&self, id: &str) -> Result<Product, DomainError> {
        self.storage
            .get(&ProductId::new(id))
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, changes: ProductChanges) -> Result<Product, DomainError> {
        let product = Product::create(changes).map_err(DomainError::invalid_fields)?;
        let product = self.storage.create(product).await?;

        info!(product_id = %product.id(), name = %product.name(), "Product created");
        Ok(product)
    }

    /// Apply a partial update; absent fields keep their values
    pub async fn update(&self, id: &str, changes: ProductChanges) -> Result<Product, DomainError> {
        let mut product = self.get(id).await?;
        product.apply(changes).map_err(DomainError::invalid_fields)?;

        let product = self.storage.update(product).await?;

        info!(product_id = %product.id(), "Product updated");
        Ok(product)
    }

    /// Remove a product, returning it so its image can be cleaned up
    pub async fn delete(&self, id: &str) -> Result<Product, DomainError> {
        let product = self
            .storage
            .take(&ProductId::new(id))
            .await?
            .ok_or_else(|| not_found(id))?;

        info!(product_id = %product.id(), "Product deleted");
        Ok(product)
    }

    pub async fn count(&self) -> Result<usize, DomainError> {
        self.storage.count().await
    }
}

fn not_found(id: &str) -> DomainError {
    debug!(product_id = %id, "Product not found");
    DomainError::not_found("Product not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryStorage;
    use rust_decimal::Decimal;

    fn service() -> ProductService {
        ProductService::new(Arc::new(InMemoryStorage::<Product>::new()))
    }

    fn tea(name: &str) -> ProductChanges {
        ProductChanges {
            name: Some(name.to_string()),
            price: Some(Decimal::new(24900, 2)),
            category: Some("beverages".to_string()),
            stock: Some(25),
            unit: Some("250g".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = service();
        let created = service.create(tea("Assam Tea")).await.unwrap();

        let fetched = service.get(created.id().as_str()).await.unwrap();
        assert_eq!(fetched.name(), "Assam Tea");
        assert_eq!(fetched.price(), Decimal::new(24900, 2));
    }

    #[tokio::test]
    async fn test_create_invalid() {
        let service = service();

        let result = service.create(ProductChanges::default()).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert_eq!(service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_in_creation_order() {
        let service = service();
        for name in ["Assam Tea", "Darjeeling Tea", "Nilgiri Tea"] {
            service.create(tea(name)).await.unwrap();
        }

        let names: Vec<String> = service
            .list()
            .await
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect();

        assert_eq!(names.len(), 3);
        assert_eq!(names[0], "Assam Tea");
    }

    #[tokio::test]
    async fn test_partial_update() {
        let service = service();
        let created = service.create(tea("Assam Tea")).await.unwrap();

        let updated = service
            .update(
                created.id().as_str(),
                ProductChanges {
                    price: Some(Decimal::new(19900, 2)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.price(), Decimal::new(19900, 2));
        assert_eq!(updated.category(), "beverages");
        assert_eq!(updated.created_at(), created.created_at());
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let result = service().update("p_missing", ProductChanges::default()).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete() {
        let service = service();
        let created = service.create(tea("Assam Tea")).await.unwrap();
        let id = created.id().as_str().to_string();

        assert_eq!(service.delete(&id).await.unwrap().name(), "Assam Tea");
        assert!(matches!(service.get(&id).await, Err(DomainError::NotFound { .. })));
        assert!(matches!(service.delete(&id).await, Err(DomainError::NotFound { .. })));
    }
}
