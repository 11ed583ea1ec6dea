use crate::error::StoreError;
use crate::models::ClassifiedListing;
use crate::store::ListingStore;

/// True when the store has never seen this external id.
pub async fn is_novel<S>(store: &S, external_id: &str) -> Result<bool, StoreError>
where
    S: ListingStore + ?Sized,
{
    Ok(!store.exists(external_id).await?)
}

/// Persist a classified listing so later cycles skip it.
///
/// Recording the same id twice yields [`StoreError::Duplicate`] on the second call.
pub async fn record<S>(store: &S, listing: &ClassifiedListing) -> Result<(), StoreError>
where
    S: ListingStore + ?Sized,
{
    store.insert(&listing.to_persisted()).await
}
