use super::ListingStore;
use crate::error::StoreError;
use crate::models::PersistedListing;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Non-durable store for dry runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    listings: Mutex<HashMap<String, PersistedListing>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, external_id: &str) -> Option<PersistedListing> {
        self.listings.lock().await.get(external_id).cloned()
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn exists(&self, external_id: &str) -> Result<bool, StoreError> {
        Ok(self.listings.lock().await.contains_key(external_id))
    }

    async fn insert(&self, listing: &PersistedListing) -> Result<(), StoreError> {
        let mut listings = self.listings.lock().await;
        if listings.contains_key(&listing.external_id) {
            return Err(StoreError::Duplicate {
                external_id: listing.external_id.clone(),
            });
        }
        listings.insert(listing.external_id.clone(), listing.clone());
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.listings.lock().await.len() as u64)
    }
}
