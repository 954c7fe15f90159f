use tracing::info;

use stockroom_infra::config::{AppConfig, StoreBackend};
use stockroom_infra::{InMemoryEntityStore, InventoryService, PostgresEntityStore, StoreError};

/// Build the inventory service over the configured store backend.
pub async fn build_service(config: &AppConfig) -> Result<InventoryService, StoreError> {
    let thresholds = config.stock.thresholds();

    match config.store.backend {
        StoreBackend::Memory => {
            info!("using in-memory entity store");
            Ok(InventoryService::new(std::sync::Arc::new(InMemoryEntityStore::new()), thresholds))
        }
        StoreBackend::Postgres => {
            let url = config
                .store
                .database_url
                .as_deref()
                .ok_or_else(|| StoreError::Unavailable("store.database_url is not set".to_string()))?;
            let store = PostgresEntityStore::connect(
                url,
                config.store.max_connections,
                config.store.acquire_timeout(),
            )
            .await?;
            info!("using postgres entity store");
            Ok(InventoryService::new(std::sync::Arc::new(store), thresholds))
        }
    }
}
