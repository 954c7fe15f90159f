//! Catalog domain module: products, manufacturers, contacts and stock analytics.
//!
//! Business rules are implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage).

pub mod analytics;
pub mod contact;
pub mod manufacturer;
pub mod product;

pub use analytics::{
    CriticalStockEntry, InventorySnapshot, ManufacturerStockValue, StockSummary, StockThresholds,
    UNKNOWN,
};
pub use contact::Contact;
pub use manufacturer::{Address, Manufacturer, ManufacturerChanges, ManufacturerDraft, ManufacturerInput};
pub use product::{NewProduct, Product, ProductChanges, ProductDraft, ProductUpdate};
