//! Distance and containment helpers for listing coordinates.

use crate::models::Coordinate;
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6367.0;
const MILES_PER_KM: f64 = 0.621371;

/// Great-circle distance in miles between two points given in degrees.
pub fn distance_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    MILES_PER_KM * EARTH_RADIUS_KM * c
}

pub fn distance_between(a: Coordinate, b: Coordinate) -> f64 {
    distance_miles(a.lat, a.lon, b.lat, b.lon)
}

/// Strict containment in the box spanned by two corners.
///
/// Corners are normalized first, so both the (south-west, north-east) convention
/// and boxes written with swapped longitudes describe the same area. Points on an
/// edge are outside.
pub fn point_in_box(point: Coordinate, bottom_left: Coordinate, top_right: Coordinate) -> bool {
    let (lat_min, lat_max) = ordered(bottom_left.lat, top_right.lat);
    let (lon_min, lon_max) = ordered(bottom_left.lon, top_right.lon);
    lat_min < point.lat && point.lat < lat_max && lon_min < point.lon && point.lon < lon_max
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Ray-casting containment. Points on an edge or vertex are outside, matching
/// [`point_in_box`]. "On" allows for rounding: anything within
/// `EDGE_TOLERANCE_DEG` of an edge counts.
pub fn point_in_polygon(point: Coordinate, vertices: &[Coordinate]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (a, b) = (vertices[i], vertices[j]);
        if on_segment(point, a, b) {
            return false;
        }
        if (a.lon > point.lon) != (b.lon > point.lon) {
            let lat_at = (b.lat - a.lat) * (point.lon - a.lon) / (b.lon - a.lon) + a.lat;
            if point.lat < lat_at {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Points closer than this to an edge, in degrees (about 0.1 mm), are on it.
const EDGE_TOLERANCE_DEG: f64 = 1e-9;

fn on_segment(p: Coordinate, a: Coordinate, b: Coordinate) -> bool {
    let (dlat, dlon) = (b.lat - a.lat, b.lon - a.lon);
    let len = dlat.hypot(dlon);
    if len == 0.0 {
        return (p.lat - a.lat).abs() <= EDGE_TOLERANCE_DEG
            && (p.lon - a.lon).abs() <= EDGE_TOLERANCE_DEG;
    }

    // Perpendicular distance from p to the line through a and b.
    let cross = dlat * (p.lon - a.lon) - dlon * (p.lat - a.lat);
    if (cross / len).abs() > EDGE_TOLERANCE_DEG {
        return false;
    }
    let (lat_min, lat_max) = ordered(a.lat, b.lat);
    let (lon_min, lon_max) = ordered(a.lon, b.lon);
    lat_min - EDGE_TOLERANCE_DEG <= p.lat
        && p.lat <= lat_max + EDGE_TOLERANCE_DEG
        && lon_min - EDGE_TOLERANCE_DEG <= p.lon
        && p.lon <= lon_max + EDGE_TOLERANCE_DEG
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionShape {
    Box {
        bottom_left: Coordinate,
        top_right: Coordinate,
    },
    Polygon {
        vertices: Vec<Coordinate>,
    },
}

/// A named area listings are matched against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    #[serde(flatten)]
    pub shape: RegionShape,
}

impl Region {
    pub fn new_box(name: impl Into<String>, bottom_left: Coordinate, top_right: Coordinate) -> Self {
        Self {
            name: name.into(),
            shape: RegionShape::Box {
                bottom_left,
                top_right,
            },
        }
    }

    pub fn new_polygon(name: impl Into<String>, vertices: Vec<Coordinate>) -> Self {
        Self {
            name: name.into(),
            shape: RegionShape::Polygon { vertices },
        }
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        match &self.shape {
            RegionShape::Box {
                bottom_left,
                top_right,
            } => point_in_box(point, *bottom_left, *top_right),
            RegionShape::Polygon { vertices } => point_in_polygon(point, vertices),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitStation {
    pub name: String,
    pub coordinate: Coordinate,
}

impl TransitStation {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            coordinate: Coordinate::new(lat, lon),
        }
    }
}
