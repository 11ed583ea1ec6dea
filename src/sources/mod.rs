pub mod craigslist;
pub mod traits;
pub mod types;

pub use craigslist::CraigslistSource;
pub use traits::{ListingResult, ListingSource};
pub use types::{SearchQuery, SortOrder};
