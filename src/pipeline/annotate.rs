use crate::config::GeoConfig;
use crate::geo::distance_between;
use crate::models::{Coordinate, GeoAnnotation, MatchSource, RegionMatch, StationDistance};

/// Work out which region a listing is in and how far it is from transit.
///
/// Without a coordinate every field stays at its default: no station, no
/// region, not near transit. The neighborhood text fallback is only consulted
/// for geotagged listings whose point fell outside every configured region.
pub fn annotate(coordinate: Option<Coordinate>, location_text: &str, geo: &GeoConfig) -> GeoAnnotation {
    let Some(point) = coordinate else {
        return GeoAnnotation::default();
    };

    // Overlapping regions resolve to the first one in config order, the same
    // rule the neighborhood fallback uses. Region lists written for the old
    // last-match-wins behavior must be reversed.
    let region = geo
        .regions
        .iter()
        .find(|region| region.contains(point))
        .map(|region| RegionMatch {
            name: region.name.clone(),
            source: MatchSource::Geometry,
        })
        .or_else(|| match_neighborhood(location_text, &geo.neighborhoods));

    let mut nearest: Option<StationDistance> = None;
    let mut near_transit = false;
    for station in &geo.stations {
        let distance = distance_between(station.coordinate, point);
        if nearest.as_ref().map_or(true, |n| distance < n.distance_miles) {
            nearest = Some(StationDistance {
                name: station.name.clone(),
                distance_miles: distance,
            });
        }
        if distance < geo.max_transit_distance {
            near_transit = true;
        }
    }

    GeoAnnotation {
        nearest_station: nearest,
        near_transit,
        region,
    }
}

/// First configured neighborhood whose name appears in the location text.
fn match_neighborhood(location_text: &str, neighborhoods: &[String]) -> Option<RegionMatch> {
    let location = location_text.to_lowercase();
    neighborhoods
        .iter()
        .find(|hood| !hood.is_empty() && location.contains(&hood.to_lowercase()))
        .map(|hood| RegionMatch {
            name: hood.clone(),
            source: MatchSource::Neighborhood,
        })
}
