use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use stockroom_catalog::{InventorySnapshot, Manufacturer, Product};
use stockroom_core::{Entity, ManufacturerId, ProductId};

use super::{EntityStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    products: HashMap<ProductId, Product>,
    manufacturers: HashMap<ManufacturerId, Manufacturer>,
}

impl Tables {
    fn name_taken(&self, name: &str, except: Option<ManufacturerId>) -> bool {
        self.manufacturers
            .values()
            .any(|m| m.name() == name && Some(m.id()) != except)
    }

    fn email_taken(&self, manufacturer: &Manufacturer) -> bool {
        let Some(key) = manufacturer.contact().map(|c| c.email_key()) else {
            return false;
        };
        self.manufacturers.values().any(|m| {
            m.id() != manufacturer.id() && m.contact().is_some_and(|c| c.email_key() == key)
        })
    }

    fn check_unique(&self, manufacturer: &Manufacturer) -> StoreResult<()> {
        if self.name_taken(manufacturer.name(), Some(manufacturer.id())) {
            return Err(StoreError::DuplicateName(manufacturer.name().to_string()));
        }
        if self.email_taken(manufacturer) {
            let email = manufacturer.contact().map(|c| c.email().to_string()).unwrap_or_default();
            return Err(StoreError::DuplicateContactEmail(email));
        }
        Ok(())
    }

    fn check_reference(&self, product: &Product) -> StoreResult<()> {
        match product.manufacturer() {
            Some(id) if !self.manufacturers.contains_key(&id) => Err(StoreError::MissingManufacturer(id)),
            _ => Ok(()),
        }
    }

    fn references(&self, id: ManufacturerId) -> u64 {
        self.products.values().filter(|p| p.manufacturer() == Some(id)).count() as u64
    }
}

/// In-memory entity store for tests/dev.
///
/// Both tables sit behind one lock so a snapshot never observes a product
/// without its manufacturer. A poisoned lock surfaces as `Unavailable`.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    inner: RwLock<Tables>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn insert_product(&self, product: Product) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.check_reference(&product)?;
        tables.products.insert(product.id(), product);
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        self.read()?
            .products
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("product"))
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.read()?.products.values().cloned().collect())
    }

    async fn update_product(&self, product: Product) -> StoreResult<()> {
        let mut tables = self.write()?;
        if !tables.products.contains_key(&product.id()) {
            return Err(StoreError::NotFound("product"));
        }
        tables.check_reference(&product)?;
        tables.products.insert(product.id(), product);
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<Product> {
        self.write()?
            .products
            .remove(&id)
            .ok_or(StoreError::NotFound("product"))
    }

    async fn delete_all_products(&self) -> StoreResult<u64> {
        let mut tables = self.write()?;
        let count = tables.products.len() as u64;
        tables.products.clear();
        Ok(count)
    }

    async fn insert_manufacturer(&self, manufacturer: Manufacturer) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.check_unique(&manufacturer)?;
        tables.manufacturers.insert(manufacturer.id(), manufacturer);
        Ok(())
    }

    async fn get_manufacturer(&self, id: ManufacturerId) -> StoreResult<Manufacturer> {
        self.read()?
            .manufacturers
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound("manufacturer"))
    }

    async fn find_manufacturer_by_name(&self, name: &str) -> StoreResult<Option<Manufacturer>> {
        let name = name.trim();
        Ok(self
            .read()?
            .manufacturers
            .values()
            .find(|m| m.name() == name)
            .cloned())
    }

    async fn list_manufacturers(&self) -> StoreResult<Vec<Manufacturer>> {
        Ok(self.read()?.manufacturers.values().cloned().collect())
    }

    async fn update_manufacturer(&self, manufacturer: Manufacturer) -> StoreResult<()> {
        let mut tables = self.write()?;
        if !tables.manufacturers.contains_key(&manufacturer.id()) {
            return Err(StoreError::NotFound("manufacturer"));
        }
        tables.check_unique(&manufacturer)?;
        tables.manufacturers.insert(manufacturer.id(), manufacturer);
        Ok(())
    }

    async fn delete_manufacturer(&self, id: ManufacturerId) -> StoreResult<Manufacturer> {
        let mut tables = self.write()?;
        if !tables.manufacturers.contains_key(&id) {
            return Err(StoreError::NotFound("manufacturer"));
        }
        if tables.references(id) > 0 {
            return Err(StoreError::ManufacturerInUse(id));
        }
        tables
            .manufacturers
            .remove(&id)
            .ok_or(StoreError::NotFound("manufacturer"))
    }

    async fn count_products_for_manufacturer(&self, id: ManufacturerId) -> StoreResult<u64> {
        Ok(self.read()?.references(id))
    }

    async fn snapshot(&self) -> StoreResult<InventorySnapshot> {
        let tables = self.read()?;
        Ok(InventorySnapshot::new(
            tables.products.values().cloned().collect(),
            tables.manufacturers.values().cloned().collect(),
        ))
    }

    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }
}
