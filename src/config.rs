use crate::error::ConfigError;
use crate::geo::{Region, RegionShape, TransitStation};
use crate::models::Coordinate;
use crate::sources::{SearchQuery, SortOrder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Environment variable holding the Slack bot token.
pub const SLACK_TOKEN_VAR: &str = "SLACK_TOKEN";

/// Everything one scout process needs, loaded once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub geo: GeoConfig,
    pub classifier: ClassifierConfig,
    pub slack: SlackConfig,
    pub store: StoreConfig,
    pub schedule: ScheduleConfig,
}

/// Search parameters sent to the listing source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Craigslist site, e.g. "sfbay" for https://sfbay.craigslist.org
    pub site: String,
    /// Sub-areas searched in order, e.g. "sby" and "pen"
    pub areas: Vec<String>,
    /// Housing section, "apa" for apartments
    pub category: String,
    /// Minimum monthly rent
    pub min_price: Option<u32>,
    /// Maximum monthly rent
    pub max_price: Option<u32>,
    /// Minimum size in square feet
    pub min_size: Option<u32>,
    pub posted_today: bool,
    /// Result order requested from the site; "newest", "price_asc" or "price_desc"
    pub sort: SortOrder,
    /// Listings pulled per area per cycle
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            site: "sfbay".to_string(),
            areas: vec!["sby".to_string(), "pen".to_string()],
            category: "apa".to_string(),
            min_price: Some(1000),
            max_price: Some(2800),
            min_size: Some(600),
            posted_today: true,
            sort: SortOrder::Newest,
            limit: 20,
        }
    }
}

impl SearchConfig {
    pub fn query_for(&self, area: &str) -> SearchQuery {
        SearchQuery {
            site: self.site.clone(),
            area: area.to_string(),
            category: self.category.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            min_size: self.min_size,
            posted_today: self.posted_today,
            sort: self.sort,
            limit: self.limit,
        }
    }
}

/// Regions, neighborhoods and transit stations listings are checked against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    pub regions: Vec<Region>,
    /// Names searched for in the listing's free-text location when no region matches.
    pub neighborhoods: Vec<String>,
    pub stations: Vec<TransitStation>,
    /// Farthest acceptable distance to a station, in miles.
    pub max_transit_distance: f64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        let vertices = [
            (37.414816, -122.118444),
            (37.424473, -122.097250),
            (37.414551, -122.083682),
            (37.408535, -122.070044),
            (37.400691, -122.035674),
            (37.395649, -122.012829),
            (37.391176, -121.996054),
            (37.382011, -121.963947),
            (37.366082, -121.965050),
            (37.352382, -121.968590),
            (37.352181, -122.014118),
            (37.364261, -122.032507),
            (37.370669, -122.077826),
            (37.399521, -122.132630),
        ]
        .into_iter()
        .map(|(lat, lon)| Coordinate::new(lat, lon))
        .collect();

        Self {
            regions: vec![Region::new_polygon("the_polygon", vertices)],
            neighborhoods: Vec::new(),
            stations: vec![
                TransitStation::new("lawrence", 37.370444, -121.996069),
                TransitStation::new("sunnyvale", 37.378392, -122.030794),
                TransitStation::new("mountainview", 37.394567, -122.075990),
                TransitStation::new("sanantonio", 37.407264, -122.107073),
            ],
            max_transit_distance: 2.0,
        }
    }
}

/// Phrases used to read a listing's pet policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Any of these in the lowered body marks the listing as no-pets.
    pub negative_pet_phrases: Vec<String>,
    /// Substrings that mark cats as welcome, checked after the negative phrases.
    pub positive_pet_markers: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            negative_pet_phrases: vec![
                "cats not allowed".to_string(),
                "no pets".to_string(),
                "no pet".to_string(),
            ],
            positive_pet_markers: vec!["purrr".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Channel for accepted listings
    pub channel: String,
    /// Channel for everything else
    pub ignored_channel: String,
    pub username: String,
    pub icon_emoji: String,
    /// Bot token; usually left out of the file and read from `SLACK_TOKEN`.
    pub token: Option<String>,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            channel: "#housing".to_string(),
            ignored_channel: "#housing-ignored".to_string(),
            username: "hal".to_string(),
            icon_emoji: ":red_circle:".to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://listings.db?mode=rwc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Pause between the end of one cycle and the start of the next.
    pub poll_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 20 * 60,
        }
    }
}

impl ScheduleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Config {
    /// Load from a TOML file, falling back to defaults when the file does not exist.
    /// `SLACK_TOKEN` overrides any token in the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        if let Ok(token) = std::env::var(SLACK_TOKEN_VAR) {
            if !token.is_empty() {
                config.slack.token = Some(token);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.areas.is_empty() {
            return Err(invalid("search.areas", "at least one area is required"));
        }
        if let (Some(min), Some(max)) = (self.search.min_price, self.search.max_price) {
            if min > max {
                return Err(invalid(
                    "search.min_price",
                    format!("{min} is above max_price {max}"),
                ));
            }
        }

        let max = self.geo.max_transit_distance;
        if !max.is_finite() || max <= 0.0 {
            return Err(invalid(
                "geo.max_transit_distance",
                format!("{max} must be a positive number of miles"),
            ));
        }

        for region in &self.geo.regions {
            if let RegionShape::Polygon { vertices } = &region.shape {
                if vertices.len() < 3 {
                    return Err(invalid(
                        "geo.regions",
                        format!("polygon {} needs at least 3 vertices", region.name),
                    ));
                }
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}
