pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::StoreError;
use crate::models::PersistedListing;
use async_trait::async_trait;

/// Keyed record of every listing that has been processed.
///
/// The uniqueness of `external_id` is what keeps a listing from being handled twice.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn exists(&self, external_id: &str) -> Result<bool, StoreError>;

    /// Insert a new record. A second insert for the same id fails with
    /// [`StoreError::Duplicate`] and leaves the stored record untouched.
    async fn insert(&self, listing: &PersistedListing) -> Result<(), StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}
