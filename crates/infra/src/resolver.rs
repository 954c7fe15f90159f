//! Manufacturer resolution for product writes.
//!
//! Turns a [`ManufacturerInput`] into a stored manufacturer id. Embedded
//! manufacturer details are deduplicated by name: the first write with a new
//! name creates the record, every later one reuses it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use stockroom_catalog::{Manufacturer, ManufacturerDraft, ManufacturerInput};
use stockroom_core::{DomainError, DomainResult, Entity, ManufacturerId};

use crate::store::{EntityStore, StoreError};

/// Resolves manufacturer references, creating manufacturers on first sight.
///
/// Check-then-insert for one name is serialized through a per-name async lock.
/// The store's unique name constraint backs this up across processes: when an
/// insert loses the race the winner's record is fetched and returned.
pub struct ManufacturerResolver {
    store: Arc<dyn EntityStore>,
    name_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ManufacturerResolver {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            name_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a product's manufacturer input to an existing id.
    pub async fn resolve(&self, input: &ManufacturerInput) -> DomainResult<ManufacturerId> {
        match input {
            ManufacturerInput::Existing(id) => self.ensure_exists(*id).await,
            ManufacturerInput::Details(draft) => {
                let (manufacturer, _) = self.create_or_fetch(draft).await?;
                Ok(manufacturer.id())
            }
        }
    }

    /// Explicit creation. Returns the stored record and whether it was created now.
    pub async fn create_explicit(&self, draft: &ManufacturerDraft) -> DomainResult<(Manufacturer, bool)> {
        self.create_or_fetch(draft).await
    }

    async fn ensure_exists(&self, id: ManufacturerId) -> DomainResult<ManufacturerId> {
        match self.store.get_manufacturer(id).await {
            Ok(_) => Ok(id),
            Err(StoreError::NotFound(_)) => Err(DomainError::validation(format!(
                "manufacturer {id} does not exist"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, draft), fields(manufacturer_name = %draft.dedup_key()), err)]
    async fn create_or_fetch(&self, draft: &ManufacturerDraft) -> DomainResult<(Manufacturer, bool)> {
        draft.validate()?;
        let name = draft.dedup_key().to_string();

        let lock = self.lock_for(&name).await;
        let result = {
            let _guard = lock.lock().await;
            self.create_or_fetch_locked(&name, draft).await
        };
        self.release(&name, lock).await;
        result
    }

    async fn create_or_fetch_locked(
        &self,
        name: &str,
        draft: &ManufacturerDraft,
    ) -> DomainResult<(Manufacturer, bool)> {
        if let Some(existing) = self.store.find_manufacturer_by_name(name).await? {
            debug!(manufacturer_id = %existing.id(), "manufacturer resolved by name");
            return Ok((existing, false));
        }

        let manufacturer = Manufacturer::create(ManufacturerId::new(), draft.clone(), Utc::now())?;
        match self.store.insert_manufacturer(manufacturer.clone()).await {
            Ok(()) => {
                info!(manufacturer_id = %manufacturer.id(), "manufacturer created");
                Ok((manufacturer, true))
            }
            Err(StoreError::DuplicateName(_)) => {
                debug!("lost manufacturer insert race; fetching winner");
                self.store
                    .find_manufacturer_by_name(name)
                    .await?
                    .map(|winner| (winner, false))
                    .ok_or_else(|| DomainError::conflict(format!("manufacturer {name:?} changed concurrently")))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.name_locks.lock().await;
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the registry entry once no other task holds or awaits it.
    async fn release(&self, name: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.name_locks.lock().await;
        drop(lock);
        if locks.get(name).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryEntityStore, StoreResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use stockroom_catalog::{Contact, InventorySnapshot, Product};
    use stockroom_core::ProductId;

    fn resolver() -> (Arc<InMemoryEntityStore>, ManufacturerResolver) {
        let store = Arc::new(InMemoryEntityStore::new());
        let resolver = ManufacturerResolver::new(store.clone());
        (store, resolver)
    }

    #[tokio::test]
    async fn same_name_resolves_to_same_id() {
        let (store, resolver) = resolver();
        let input = ManufacturerInput::Details(ManufacturerDraft::named("Acme"));

        let first = resolver.resolve(&input).await.unwrap();
        let second = resolver.resolve(&input).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.list_manufacturers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn found_manufacturer_is_not_mutated_by_payload() {
        let (store, resolver) = resolver();
        let created = resolver
            .resolve(&ManufacturerInput::Details(ManufacturerDraft {
                country: Some("US".into()),
                ..ManufacturerDraft::named("Acme")
            }))
            .await
            .unwrap();

        let reused = resolver
            .resolve(&ManufacturerInput::Details(ManufacturerDraft {
                country: Some("DE".into()),
                contact: Some(Contact::new("Other", "other@acme.example", None).unwrap()),
                ..ManufacturerDraft::named("  Acme  ")
            }))
            .await
            .unwrap();

        assert_eq!(created, reused);
        let stored = store.get_manufacturer(created).await.unwrap();
        assert_eq!(stored.country(), Some("US"));
        assert!(stored.contact().is_none());
    }

    #[tokio::test]
    async fn unknown_existing_id_is_a_validation_error() {
        let (_, resolver) = resolver();
        let err = resolver
            .resolve(&ManufacturerInput::Existing(ManufacturerId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn empty_name_is_rejected_without_writes() {
        let (store, resolver) = resolver();
        let err = resolver
            .resolve(&ManufacturerInput::Details(ManufacturerDraft::named("   ")))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(store.list_manufacturers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn explicit_create_reports_whether_it_created() {
        let (_, resolver) = resolver();
        let (first, created) = resolver.create_explicit(&ManufacturerDraft::named("Acme")).await.unwrap();
        let (second, created_again) = resolver.create_explicit(&ManufacturerDraft::named("Acme")).await.unwrap();

        assert!(created);
        assert!(!created_again);
        assert_eq!(first.id(), second.id());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_resolution_creates_one_manufacturer() {
        let (store, resolver) = resolver();
        let resolver = Arc::new(resolver);

        let mut handles = Vec::new();
        for _ in 0..32 {
            let resolver = resolver.clone();
            handles.push(tokio::spawn(async move {
                resolver
                    .resolve(&ManufacturerInput::Details(ManufacturerDraft::named("Acme")))
                    .await
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.list_manufacturers().await.unwrap().len(), 1);
        assert!(resolver.name_locks.lock().await.is_empty());
    }

    /// Simulates a writer in another process: the first name lookup misses
    /// even though the name is already stored.
    struct RacingStore {
        inner: InMemoryEntityStore,
        hide_once: AtomicBool,
    }

    #[async_trait]
    impl EntityStore for RacingStore {
        async fn insert_product(&self, product: Product) -> StoreResult<()> {
            self.inner.insert_product(product).await
        }
        async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
            self.inner.get_product(id).await
        }
        async fn list_products(&self) -> StoreResult<Vec<Product>> {
            self.inner.list_products().await
        }
        async fn update_product(&self, product: Product) -> StoreResult<()> {
            self.inner.update_product(product).await
        }
        async fn delete_product(&self, id: ProductId) -> StoreResult<Product> {
            self.inner.delete_product(id).await
        }
        async fn delete_all_products(&self) -> StoreResult<u64> {
            self.inner.delete_all_products().await
        }
        async fn insert_manufacturer(&self, manufacturer: Manufacturer) -> StoreResult<()> {
            self.inner.insert_manufacturer(manufacturer).await
        }
        async fn get_manufacturer(&self, id: ManufacturerId) -> StoreResult<Manufacturer> {
            self.inner.get_manufacturer(id).await
        }
        async fn find_manufacturer_by_name(&self, name: &str) -> StoreResult<Option<Manufacturer>> {
            if self.hide_once.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_manufacturer_by_name(name).await
        }
        async fn list_manufacturers(&self) -> StoreResult<Vec<Manufacturer>> {
            self.inner.list_manufacturers().await
        }
        async fn update_manufacturer(&self, manufacturer: Manufacturer) -> StoreResult<()> {
            self.inner.update_manufacturer(manufacturer).await
        }
        async fn delete_manufacturer(&self, id: ManufacturerId) -> StoreResult<Manufacturer> {
            self.inner.delete_manufacturer(id).await
        }
        async fn count_products_for_manufacturer(&self, id: ManufacturerId) -> StoreResult<u64> {
            self.inner.count_products_for_manufacturer(id).await
        }
        async fn snapshot(&self) -> StoreResult<InventorySnapshot> {
            self.inner.snapshot().await
        }
        async fn ping(&self) -> StoreResult<()> {
            self.inner.ping().await
        }
    }

    #[tokio::test]
    async fn lost_insert_race_returns_the_winner() {
        let store = Arc::new(RacingStore {
            inner: InMemoryEntityStore::new(),
            hide_once: AtomicBool::new(false),
        });
        let resolver = ManufacturerResolver::new(store.clone());

        let winner = resolver
            .resolve(&ManufacturerInput::Details(ManufacturerDraft::named("Acme")))
            .await
            .unwrap();

        store.hide_once.store(true, Ordering::SeqCst);
        let loser = resolver
            .resolve(&ManufacturerInput::Details(ManufacturerDraft::named("Acme")))
            .await
            .unwrap();

        assert_eq!(winner, loser);
        assert_eq!(store.list_manufacturers().await.unwrap().len(), 1);
    }
}
