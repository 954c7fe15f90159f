//! Stock analytics over the live entity set.
//!
//! Every query reads one store snapshot and runs the pure catalog analytics
//! over it, so a result never mixes two points in time.

use std::sync::Arc;

use tracing::instrument;

use stockroom_catalog::{
    CriticalStockEntry, InventorySnapshot, Manufacturer, ManufacturerStockValue, Product, StockSummary,
    StockThresholds,
};
use stockroom_core::{DomainResult, ManufacturerId, Money};

use crate::store::EntityStore;

/// Read-only aggregation engine.
pub struct AggregationEngine {
    store: Arc<dyn EntityStore>,
    thresholds: StockThresholds,
}

impl AggregationEngine {
    pub fn new(store: Arc<dyn EntityStore>, thresholds: StockThresholds) -> Self {
        Self { store, thresholds }
    }

    pub fn thresholds(&self) -> StockThresholds {
        self.thresholds
    }

    async fn snapshot(&self) -> DomainResult<InventorySnapshot> {
        Ok(self.store.snapshot().await?)
    }

    #[instrument(skip(self), err)]
    pub async fn total_stock_value(&self) -> DomainResult<Money> {
        self.snapshot().await?.total_stock_value()
    }

    #[instrument(skip(self), err)]
    pub async fn total_stock_value_by_manufacturer(&self) -> DomainResult<Vec<ManufacturerStockValue>> {
        self.snapshot().await?.stock_value_by_manufacturer()
    }

    #[instrument(skip(self), fields(manufacturer_id = %id), err)]
    pub async fn stock_value_for_manufacturer(&self, id: ManufacturerId) -> DomainResult<Money> {
        self.snapshot().await?.stock_value_for(id)
    }

    /// Products strictly below `threshold` (configured low threshold if `None`).
    #[instrument(skip(self), err)]
    pub async fn low_stock(&self, threshold: Option<u64>) -> DomainResult<Vec<Product>> {
        let threshold = threshold.unwrap_or(self.thresholds.low);
        Ok(self.snapshot().await?.low_stock(threshold))
    }

    /// Critical-stock projection (configured critical threshold if `None`).
    #[instrument(skip(self), err)]
    pub async fn critical_stock(&self, threshold: Option<u64>) -> DomainResult<Vec<CriticalStockEntry>> {
        let threshold = threshold.unwrap_or(self.thresholds.critical);
        Ok(self.snapshot().await?.critical_stock(threshold))
    }

    #[instrument(skip(self), err)]
    pub async fn list_manufacturers(&self) -> DomainResult<Vec<Manufacturer>> {
        Ok(self.snapshot().await?.manufacturers_by_id())
    }

    #[instrument(skip(self), err)]
    pub async fn summary(&self) -> DomainResult<StockSummary> {
        self.snapshot().await?.summary(self.thresholds)
    }
}
