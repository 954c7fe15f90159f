//! Entity store boundary.
//!
//! Products and manufacturers live in one backing store. The trait is
//! storage-agnostic; backends enforce manufacturer name uniqueness, contact
//! email uniqueness and product → manufacturer referential integrity.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use stockroom_catalog::{InventorySnapshot, Manufacturer, Product};
use stockroom_core::{DomainError, ManufacturerId, ProductId};

pub use in_memory::InMemoryEntityStore;
pub use postgres::PostgresEntityStore;

/// Store operation error.
///
/// These are infrastructure errors. `DuplicateName` is normally consumed by
/// the manufacturer resolver; every variant maps into [`DomainError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("manufacturer name already exists: {0}")]
    DuplicateName(String),

    #[error("contact email already in use: {0}")]
    DuplicateContactEmail(String),

    #[error("referenced manufacturer does not exist: {0}")]
    MissingManufacturer(ManufacturerId),

    #[error("manufacturer {0} is still referenced by products")]
    ManufacturerInUse(ManufacturerId),

    #[error("value cannot be stored: {0}")]
    Unrepresentable(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => DomainError::not_found(what),
            StoreError::DuplicateName(_)
            | StoreError::DuplicateContactEmail(_)
            | StoreError::MissingManufacturer(_)
            | StoreError::ManufacturerInUse(_)
            | StoreError::Unrepresentable(_) => DomainError::validation(err.to_string()),
            StoreError::Unavailable(msg) => DomainError::store_unavailable(msg),
        }
    }
}

/// Async persistence interface for the inventory.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn insert_product(&self, product: Product) -> StoreResult<()>;

    async fn get_product(&self, id: ProductId) -> StoreResult<Product>;

    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    /// Replace a stored product. `NotFound` if the id is unknown.
    async fn update_product(&self, product: Product) -> StoreResult<()>;

    /// Delete a product and return the removed record.
    async fn delete_product(&self, id: ProductId) -> StoreResult<Product>;

    /// Delete every product. Returns the number removed. Irreversible.
    async fn delete_all_products(&self) -> StoreResult<u64>;

    async fn insert_manufacturer(&self, manufacturer: Manufacturer) -> StoreResult<()>;

    async fn get_manufacturer(&self, id: ManufacturerId) -> StoreResult<Manufacturer>;

    /// Exact lookup by (trimmed) name.
    async fn find_manufacturer_by_name(&self, name: &str) -> StoreResult<Option<Manufacturer>>;

    async fn list_manufacturers(&self) -> StoreResult<Vec<Manufacturer>>;

    async fn update_manufacturer(&self, manufacturer: Manufacturer) -> StoreResult<()>;

    /// Delete a manufacturer. `ManufacturerInUse` while any product references it.
    async fn delete_manufacturer(&self, id: ManufacturerId) -> StoreResult<Manufacturer>;

    async fn count_products_for_manufacturer(&self, id: ManufacturerId) -> StoreResult<u64>;

    /// Products and manufacturers read at one consistent point.
    async fn snapshot(&self) -> StoreResult<InventorySnapshot>;

    async fn ping(&self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_domain_categories() {
        assert!(DomainError::from(StoreError::NotFound("product")).is_not_found());
        assert!(matches!(
            DomainError::from(StoreError::DuplicateName("Acme".into())),
            DomainError::Validation(_)
        ));
        assert!(matches!(
            DomainError::from(StoreError::MissingManufacturer(ManufacturerId::new())),
            DomainError::Validation(_)
        ));
        assert!(matches!(
            DomainError::from(StoreError::Unavailable("lock poisoned".into())),
            DomainError::StoreUnavailable(_)
        ));
    }
}
