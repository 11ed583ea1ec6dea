use crate::config::ClassifierConfig;
use crate::models::{Bucket, ClassifiedListing, GeoAnnotation, PetPolicy, RawListing};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

/// Attach the normalized fields and decide which bucket a listing goes to.
///
/// Unknown pet policy passes; only an explicit no-pets phrase rejects.
pub fn classify(raw: RawListing, geo: GeoAnnotation, rules: &ClassifierConfig) -> ClassifiedListing {
    let price = parse_price(raw.price.as_deref());
    let pet_policy = detect_pet_policy(&raw.body, raw.pet_text.as_deref(), rules);
    let posted_at = parse_posted_at(&raw.posted_at).unwrap_or_else(|| {
        debug!("Unparseable posting time {:?} for {}", raw.posted_at, raw.id);
        Utc::now()
    });

    let bucket = if pet_policy != PetPolicy::Disallowed && geo.near_transit && geo.region_matched() {
        Bucket::Accepted
    } else {
        Bucket::Ignored
    };

    ClassifiedListing {
        raw,
        geo,
        price,
        pet_policy,
        posted_at,
        bucket,
    }
}

/// "$1500" -> 1500.0. Anything unparseable is 0.
pub fn parse_price(text: Option<&str>) -> f64 {
    let Some(text) = text else {
        return 0.0;
    };
    let trimmed = text.trim();
    let number = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    match number.parse::<f64>() {
        Ok(price) if price.is_finite() => price,
        _ => {
            debug!("Could not parse price {:?}, using 0", text);
            0.0
        }
    }
}

pub fn detect_pet_policy(body: &str, pet_text: Option<&str>, rules: &ClassifierConfig) -> PetPolicy {
    let mut text = body.to_lowercase();
    if let Some(extra) = pet_text {
        text.push('\n');
        text.push_str(&extra.to_lowercase());
    }

    if rules
        .negative_pet_phrases
        .iter()
        .any(|phrase| text.contains(&phrase.to_lowercase()))
    {
        return PetPolicy::Disallowed;
    }

    let says_cats = text
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == "cats");
    let has_marker = rules
        .positive_pet_markers
        .iter()
        .any(|marker| text.contains(&marker.to_lowercase()));

    if says_cats || has_marker {
        PetPolicy::Allowed
    } else {
        PetPolicy::Unknown
    }
}

/// Accepts RFC 3339 plus the listing-page forms "2024-05-26 14:27" and
/// "2024-05-26T14:27:00-0700".
pub fn parse_posted_at(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M")
        .ok()
        .map(|naive| naive.and_utc())
}
