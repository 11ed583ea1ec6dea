pub mod dry_run;
pub mod slack;

pub use dry_run::LogNotifier;
pub use slack::SlackNotifier;

use crate::error::NotifyError;
use crate::models::{ClassifiedListing, PetPolicy};
use async_trait::async_trait;

/// Destination for rendered listing messages
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), NotifyError>;
}

pub fn pet_glyph(policy: PetPolicy) -> &'static str {
    match policy {
        PetPolicy::Disallowed => ":cat::x:",
        PetPolicy::Allowed => ":cat::smiley_cat:",
        PetPolicy::Unknown => ":cat::question:",
    }
}

/// One-line Slack message for a listing:
///
/// `*$1500*, 750 sq ft | :cat::question: | 0.42 mi - *lawrence* | <maps link|map> | <url|title>`
pub fn render_listing(listing: &ClassifiedListing) -> String {
    let raw = &listing.raw;
    let price = raw.price.as_deref().unwrap_or("");
    let size = match &raw.area {
        Some(area) => area.replace("ft2", " sq ft"),
        None => "____ sq ft".to_string(),
    };
    let transit = match &listing.geo.nearest_station {
        Some(station) => format!("{:.2} mi - *{}*", station.distance_miles, station.name),
        None => "-- mi - *none*".to_string(),
    };
    let map = match raw.coordinate {
        Some(c) => format!("<https://www.google.com/maps/?q={},{}|map>", c.lat, c.lon),
        None => "no map".to_string(),
    };

    format!(
        "*{}*, {} | {} | {} | {} | <{}|{}>",
        price,
        size,
        pet_glyph(listing.pet_policy),
        transit,
        map,
        raw.url,
        raw.title
    )
}
