//! Inventory service: orchestrates store, resolver and aggregation engine.
//!
//! Every write validates its input before touching the store. Manufacturer
//! references carried by product writes go through the resolver, so the
//! store only ever sees resolved ids.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use stockroom_catalog::{
    CriticalStockEntry, Manufacturer, ManufacturerChanges, ManufacturerDraft, ManufacturerStockValue,
    NewProduct, Product, ProductUpdate, StockSummary, StockThresholds,
};
use stockroom_core::{DomainError, DomainResult, Entity, FieldUpdate, ManufacturerId, Money, ProductId};

use crate::analytics::AggregationEngine;
use crate::resolver::ManufacturerResolver;
use crate::store::{EntityStore, InMemoryEntityStore};

pub struct InventoryService {
    store: Arc<dyn EntityStore>,
    resolver: ManufacturerResolver,
    engine: AggregationEngine,
}

impl InventoryService {
    pub fn new(store: Arc<dyn EntityStore>, thresholds: StockThresholds) -> Self {
        Self {
            resolver: ManufacturerResolver::new(store.clone()),
            engine: AggregationEngine::new(store.clone(), thresholds),
            store,
        }
    }

    /// Service over a fresh in-memory store (tests/dev).
    pub fn in_memory(thresholds: StockThresholds) -> Self {
        Self::new(Arc::new(InMemoryEntityStore::new()), thresholds)
    }

    pub fn thresholds(&self) -> StockThresholds {
        self.engine.thresholds()
    }

    pub async fn health(&self) -> DomainResult<()> {
        Ok(self.store.ping().await?)
    }

    // ---- products ----

    #[instrument(skip(self, new), fields(product_name = %new.draft.name), err)]
    pub async fn create_product(&self, new: NewProduct) -> DomainResult<Product> {
        new.draft.validate()?;

        let manufacturer = match &new.manufacturer {
            Some(input) => Some(self.resolver.resolve(input).await?),
            None => None,
        };

        let product = Product::create(ProductId::new(), new.draft, manufacturer, Utc::now())?;
        self.store.insert_product(product.clone()).await?;
        info!(product_id = %product.id(), "product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: ProductId) -> DomainResult<Product> {
        Ok(self.store.get_product(id).await?)
    }

    /// All products ordered by name, then id.
    pub async fn list_products(&self) -> DomainResult<Vec<Product>> {
        let mut products = self.store.list_products().await?;
        products.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(&b.id())));
        Ok(products)
    }

    #[instrument(skip(self, update), fields(product_id = %id), err)]
    pub async fn update_product(&self, id: ProductId, update: ProductUpdate) -> DomainResult<Product> {
        update.changes.validate()?;
        let mut product = self.store.get_product(id).await?;

        let manufacturer = match &update.manufacturer {
            FieldUpdate::Unchanged => FieldUpdate::Unchanged,
            FieldUpdate::Clear => FieldUpdate::Clear,
            FieldUpdate::Set(input) => FieldUpdate::Set(self.resolver.resolve(input).await?),
        };

        product.apply_changes(update.changes, manufacturer, Utc::now())?;
        self.store.update_product(product.clone()).await?;
        info!("product updated");
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn delete_product(&self, id: ProductId) -> DomainResult<Product> {
        let deleted = self.store.delete_product(id).await?;
        info!("product deleted");
        Ok(deleted)
    }

    /// Remove every product. Manufacturers are kept.
    #[instrument(skip(self), err)]
    pub async fn delete_all_products(&self) -> DomainResult<u64> {
        let deleted = self.store.delete_all_products().await?;
        info!(deleted, "all products deleted");
        Ok(deleted)
    }

    // ---- manufacturers ----

    /// Create-or-fetch by name. The flag is `true` if a record was created.
    pub async fn create_manufacturer(&self, draft: ManufacturerDraft) -> DomainResult<(Manufacturer, bool)> {
        self.resolver.create_explicit(&draft).await
    }

    pub async fn get_manufacturer(&self, id: ManufacturerId) -> DomainResult<Manufacturer> {
        Ok(self.store.get_manufacturer(id).await?)
    }

    pub async fn list_manufacturers(&self) -> DomainResult<Vec<Manufacturer>> {
        self.engine.list_manufacturers().await
    }

    #[instrument(skip(self, changes), fields(manufacturer_id = %id), err)]
    pub async fn update_manufacturer(
        &self,
        id: ManufacturerId,
        changes: ManufacturerChanges,
    ) -> DomainResult<Manufacturer> {
        changes.validate()?;
        let mut manufacturer = self.store.get_manufacturer(id).await?;

        if let Some(new_name) = changes.new_name() {
            if let Some(other) = self.store.find_manufacturer_by_name(new_name).await? {
                if other.id() != id {
                    return Err(DomainError::validation(format!(
                        "manufacturer name {new_name:?} is already in use"
                    )));
                }
            }
        }

        manufacturer.apply_changes(changes, Utc::now())?;
        self.store.update_manufacturer(manufacturer.clone()).await?;
        info!("manufacturer updated");
        Ok(manufacturer)
    }

    #[instrument(skip(self), fields(manufacturer_id = %id), err)]
    pub async fn delete_manufacturer(&self, id: ManufacturerId) -> DomainResult<Manufacturer> {
        self.store.get_manufacturer(id).await?;
        let references = self.store.count_products_for_manufacturer(id).await?;
        if references > 0 {
            return Err(DomainError::validation(format!(
                "manufacturer is referenced by {references} product(s)"
            )));
        }
        let deleted = self.store.delete_manufacturer(id).await?;
        info!("manufacturer deleted");
        Ok(deleted)
    }

    // ---- analytics ----

    pub async fn total_stock_value(&self) -> DomainResult<Money> {
        self.engine.total_stock_value().await
    }

    pub async fn total_stock_value_by_manufacturer(&self) -> DomainResult<Vec<ManufacturerStockValue>> {
        self.engine.total_stock_value_by_manufacturer().await
    }

    pub async fn stock_value_for_manufacturer(&self, id: ManufacturerId) -> DomainResult<Money> {
        self.engine.stock_value_for_manufacturer(id).await
    }

    pub async fn low_stock(&self, threshold: Option<u64>) -> DomainResult<Vec<Product>> {
        self.engine.low_stock(threshold).await
    }

    pub async fn critical_stock(&self, threshold: Option<u64>) -> DomainResult<Vec<CriticalStockEntry>> {
        self.engine.critical_stock(threshold).await
    }

    pub async fn summary(&self) -> DomainResult<StockSummary> {
        self.engine.summary().await
    }
}
