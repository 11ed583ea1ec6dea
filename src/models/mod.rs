use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees.
///
/// Serialized as a `[lat, lon]` array so config files can list coordinates compactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Self { lat, lon }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lat, c.lon]
    }
}

/// A listing as it comes off the source, before any annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawListing {
    pub id: String,
    pub url: String,
    pub title: String,
    pub price: Option<String>,
    pub body: String,
    /// Free-text neighborhood the poster picked, e.g. "(sunnyvale)".
    pub location: Option<String>,
    pub coordinate: Option<Coordinate>,
    /// Size string as the source prints it, e.g. "750ft2".
    pub area: Option<String>,
    pub posted_at: String,
    /// Attribute labels such as "cats are OK - purrr".
    pub pet_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDistance {
    pub name: String,
    pub distance_miles: f64,
}

/// How a region name was attached to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchSource {
    Geometry,
    Neighborhood,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMatch {
    pub name: String,
    pub source: MatchSource,
}

/// Geographic facts derived for one listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoAnnotation {
    /// Closest configured station, regardless of the transit threshold.
    pub nearest_station: Option<StationDistance>,
    pub near_transit: bool,
    pub region: Option<RegionMatch>,
}

impl GeoAnnotation {
    /// Matched region name, empty when nothing matched.
    pub fn region_name(&self) -> &str {
        self.region.as_ref().map(|r| r.name.as_str()).unwrap_or("")
    }

    pub fn region_matched(&self) -> bool {
        !self.region_name().is_empty()
    }

    pub fn station_name(&self) -> &str {
        self.nearest_station
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PetPolicy {
    Disallowed,
    Allowed,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bucket {
    Accepted,
    Ignored,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedListing {
    pub raw: RawListing,
    pub geo: GeoAnnotation,
    /// Parsed price, 0 when the source text was not a number.
    pub price: f64,
    pub pet_policy: PetPolicy,
    pub posted_at: DateTime<Utc>,
    pub bucket: Bucket,
}

impl ClassifiedListing {
    pub fn is_accepted(&self) -> bool {
        self.bucket == Bucket::Accepted
    }

    pub fn to_persisted(&self) -> PersistedListing {
        let coordinate = self.raw.coordinate.unwrap_or(Coordinate::new(0.0, 0.0));
        PersistedListing {
            external_id: self.raw.id.clone(),
            link: self.raw.url.clone(),
            created: self.posted_at,
            lat: coordinate.lat,
            lon: coordinate.lon,
            title: self.raw.title.clone(),
            price: self.price,
            location: self.raw.location.clone().unwrap_or_default(),
            area: self.raw.area.clone(),
            region: self.geo.region_name().to_string(),
            station: self.geo.station_name().to_string(),
        }
    }
}

/// Row written to the listing store once per novel external id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedListing {
    pub external_id: String,
    pub link: String,
    pub created: DateTime<Utc>,
    pub lat: f64,
    pub lon: f64,
    pub title: String,
    pub price: f64,
    pub location: String,
    pub area: Option<String>,
    pub region: String,
    pub station: String,
}
