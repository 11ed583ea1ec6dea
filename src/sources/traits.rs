use crate::error::SourceError;
use crate::models::RawListing;
use crate::sources::types::SearchQuery;
use async_trait::async_trait;

/// One fetched listing, or the reason it could not be read.
pub type ListingResult = Result<RawListing, SourceError>;

/// Common trait for listing sources
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch up to `query.limit` listings, newest first.
    ///
    /// The outer error means the area could not be searched at all. Inner errors
    /// are single listings that failed to load; callers skip them.
    async fn fetch_listings(&self, query: &SearchQuery) -> Result<Vec<ListingResult>, SourceError>;

    /// Get the name of the listing source
    fn source_name(&self) -> &'static str;
}
