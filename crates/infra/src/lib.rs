//! Infrastructure layer: entity stores, manufacturer resolution, analytics
//! engine, service orchestration and configuration.

pub mod analytics;
pub mod config;
pub mod resolver;
pub mod service;
pub mod store;

pub use analytics::AggregationEngine;
pub use resolver::ManufacturerResolver;
pub use service::InventoryService;
pub use store::{EntityStore, InMemoryEntityStore, PostgresEntityStore, StoreError};
