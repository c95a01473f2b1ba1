//! Storage trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

use super::entity::StorageEntity;

/// Generic keyed storage for any entity type
///
/// Every store in the service is built on an injected `Arc<dyn Storage<E>>`,
/// so a persistent engine can replace the in-memory one without touching the
/// services above it. Each method must be atomic with respect to the others.
#[async_trait]
pub trait Storage<E>: Send + Sync + Debug
where
    E: StorageEntity + 'static,
{
    /// Retrieves an entity by its key
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError>;

    /// Retrieves all entities
    async fn list(&self) -> Result<Vec<E>, DomainError>;

    /// Inserts a new entity, fails with `Conflict` if the key is taken
    async fn create(&self, entity: E) -> Result<E, DomainError>;

    /// Replaces an existing entity, fails with `NotFound` if absent
    async fn update(&self, entity: E) -> Result<E, DomainError>;

    /// Deletes an entity by its key, returns true if it was present
    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.take(key).await?.is_some())
    }

    /// Removes and returns an entity in one step
    ///
    /// Of several concurrent callers presenting the same key, at most one
    /// receives `Some`.
    async fn take(&self, key: &E::Key) -> Result<Option<E>, DomainError>;

    /// Checks if an entity exists by its key
    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Returns the count of entities
    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.list().await?.len())
    }
}
