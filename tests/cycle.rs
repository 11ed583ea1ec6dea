use async_trait::async_trait;
use rental_scout::config::Config;
use rental_scout::error::{NotifyError, SourceError, StoreError};
use rental_scout::geo::{Region, TransitStation};
use rental_scout::models::{Bucket, Coordinate, PersistedListing, PetPolicy, RawListing};
use rental_scout::notify::Notifier;
use rental_scout::sources::{ListingResult, ListingSource, SearchQuery};
use rental_scout::store::{ListingStore, MemoryStore, SqliteStore};
use rental_scout::{Scout, Supervisor};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const LAWRENCE: Coordinate = Coordinate::new(37.370444, -121.996069);

/// Serves canned results per area; a missing area is a failed search.
#[derive(Default)]
struct ScriptedSource {
    areas: Mutex<HashMap<String, Vec<Scripted>>>,
}

#[derive(Clone)]
enum Scripted {
    Listing(RawListing),
    Broken,
}

impl ScriptedSource {
    fn with_area(self, area: &str, items: Vec<Scripted>) -> Self {
        self.areas.lock().unwrap().insert(area.to_string(), items);
        self
    }
}

#[async_trait]
impl ListingSource for ScriptedSource {
    async fn fetch_listings(&self, query: &SearchQuery) -> Result<Vec<ListingResult>, SourceError> {
        let areas = self.areas.lock().unwrap();
        let items = areas.get(&query.area).ok_or_else(|| SourceError::Status {
            status: 503,
            url: format!("https://sfbay.craigslist.org/search/{}", query.area),
        })?;
        Ok(items
            .iter()
            .take(query.limit)
            .map(|item| match item {
                Scripted::Listing(raw) => Ok(raw.clone()),
                Scripted::Broken => Err(SourceError::Parse {
                    reason: "truncated page".to_string(),
                }),
            })
            .collect())
    }

    fn source_name(&self) -> &'static str {
        "Scripted"
    }
}

#[derive(Default)]
struct RecordingNotifier {
    posts: Mutex<Vec<(String, String)>>,
    fail_containing: Option<String>,
}

impl RecordingNotifier {
    fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
        if let Some(marker) = &self.fail_containing {
            if text.contains(marker.as_str()) {
                return Err(NotifyError::Rejected {
                    channel: channel.to_string(),
                    reason: "rate_limited".to_string(),
                });
            }
        }
        self.posts
            .lock()
            .unwrap()
            .push((channel.to_string(), text.to_string()));
        Ok(())
    }
}

/// Store whose lookups always fail.
struct BrokenStore;

#[async_trait]
impl ListingStore for BrokenStore {
    async fn exists(&self, _external_id: &str) -> Result<bool, StoreError> {
        Err(StoreError::Corrupt {
            reason: "disk on fire".to_string(),
        })
    }

    async fn insert(&self, _listing: &PersistedListing) -> Result<(), StoreError> {
        unreachable!("lookups fail first")
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(0)
    }
}

/// Store that loses every insert race: lookups miss, inserts collide.
#[derive(Default)]
struct RacingStore {
    inserts: Mutex<usize>,
}

#[async_trait]
impl ListingStore for RacingStore {
    async fn exists(&self, _external_id: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn insert(&self, listing: &PersistedListing) -> Result<(), StoreError> {
        *self.inserts.lock().unwrap() += 1;
        Err(StoreError::Duplicate {
            external_id: listing.external_id.clone(),
        })
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(0)
    }
}

fn raw(id: &str, body: &str) -> RawListing {
    RawListing {
        id: id.to_string(),
        url: format!("https://sfbay.craigslist.org/sby/apa/d/listing/{id}.html"),
        title: format!("Listing {id}"),
        price: Some("$1500".to_string()),
        body: body.to_string(),
        location: Some("near downtown".to_string()),
        coordinate: Some(LAWRENCE),
        area: Some("700ft2".to_string()),
        posted_at: "2024-05-26 14:27".to_string(),
        pet_text: None,
    }
}

fn config(regions: Vec<Region>) -> Config {
    let mut config = Config::default();
    config.search.areas = vec!["sby".to_string()];
    config.geo.regions = regions;
    config.geo.neighborhoods = Vec::new();
    config.geo.stations = vec![TransitStation::new("lawrence", 37.370444, -121.996069)];
    config.geo.max_transit_distance = 2.0;
    config
}

fn around_lawrence() -> Region {
    Region::new_box(
        "lawrence_box",
        Coordinate::new(37.36, -122.01),
        Coordinate::new(37.38, -121.98),
    )
}

fn scout(
    config: Config,
    source: ScriptedSource,
    store: Arc<dyn ListingStore>,
    notifier: Arc<RecordingNotifier>,
) -> Scout {
    Scout::new(config, Arc::new(source), store, notifier)
}

#[tokio::test]
async fn test_no_pets_near_transit_is_ignored() {
    let source = ScriptedSource::default().with_area("sby", vec![Scripted::Listing(raw("1", "no pets"))]);
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let scout = scout(config(vec![]), source, store.clone(), notifier.clone());

    let report = scout.run_cycle().await.unwrap();

    assert!(report.accepted.is_empty());
    assert_eq!(report.ignored.len(), 1);
    let listing = &report.ignored[0];
    assert_eq!(listing.bucket, Bucket::Ignored);
    assert_eq!(listing.pet_policy, PetPolicy::Disallowed);
    assert!(listing.geo.near_transit);
    assert_eq!(listing.price, 1500.0);

    assert!(store.exists("1").await.unwrap());
    let posts = notifier.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, "#housing-ignored");
    assert!(posts[0].1.starts_with("*$1500*, 700 sq ft | :cat::x: | 0.00 mi - *lawrence* |"));
}

#[tokio::test]
async fn test_cats_ok_inside_region_is_accepted() {
    let source = ScriptedSource::default().with_area("sby", vec![Scripted::Listing(raw("2", "cats ok"))]);
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let scout = scout(config(vec![around_lawrence()]), source, store, notifier.clone());

    let report = scout.run_cycle().await.unwrap();

    assert_eq!(report.accepted.len(), 1);
    assert!(report.ignored.is_empty());
    assert_eq!(report.accepted[0].pet_policy, PetPolicy::Allowed);
    assert_eq!(report.accepted[0].geo.region_name(), "lawrence_box");

    let posts = notifier.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, "#housing");
    assert!(posts[0].1.contains(":cat::smiley_cat:"));
    assert!(posts[0].1.contains("<https://www.google.com/maps/?q=37.370444,-121.996069|map>"));
    assert!(posts[0].1.ends_with("|Listing 2>"));
}

#[tokio::test]
async fn test_missing_location_is_dropped_and_not_persisted() {
    let mut nowhere = raw("3", "cats ok");
    nowhere.location = None;
    let source = ScriptedSource::default().with_area("sby", vec![Scripted::Listing(nowhere)]);
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let scout = scout(config(vec![around_lawrence()]), source, store.clone(), notifier.clone());

    let report = scout.run_cycle().await.unwrap();
    assert!(report.accepted.is_empty());
    assert!(report.ignored.is_empty());
    assert_eq!(report.stats.missing_location, 1);
    assert!(!store.exists("3").await.unwrap());
    assert!(notifier.posts().is_empty());

    // Seen again next cycle, since nothing was recorded.
    let report = scout.run_cycle().await.unwrap();
    assert_eq!(report.stats.missing_location, 1);
    assert_eq!(report.stats.already_seen, 0);
}

#[tokio::test]
async fn test_listings_are_processed_once() {
    let source = ScriptedSource::default().with_area("sby", vec![Scripted::Listing(raw("4", "cats ok"))]);
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let notifier = Arc::new(RecordingNotifier::default());
    let scout = scout(config(vec![around_lawrence()]), source, store.clone(), notifier.clone());

    let first = scout.run_cycle().await.unwrap();
    assert_eq!(first.accepted.len(), 1);

    let second = scout.run_cycle().await.unwrap();
    assert!(second.accepted.is_empty());
    assert!(second.ignored.is_empty());
    assert_eq!(second.stats.already_seen, 1);
    assert_eq!(second.stats.stored_total, 1);

    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(notifier.posts().len(), 1);
}

#[tokio::test]
async fn test_listing_recorded_concurrently_counts_as_seen() {
    let source = ScriptedSource::default().with_area("sby", vec![Scripted::Listing(raw("6", "cats ok"))]);
    let store = Arc::new(RacingStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let scout = scout(config(vec![around_lawrence()]), source, store.clone(), notifier.clone());

    let report = scout.run_cycle().await.unwrap();

    assert!(report.accepted.is_empty());
    assert!(report.ignored.is_empty());
    assert_eq!(report.stats.already_seen, 1);
    assert_eq!(report.stats.fetched, 1);
    assert_eq!(*store.inserts.lock().unwrap(), 1);
    assert!(notifier.posts().is_empty());
}

#[tokio::test]
async fn test_reposts_sharing_a_link_are_both_novel() {
    let first = raw("7", "cats ok");
    let mut repost = raw("8", "cats ok");
    repost.url = first.url.clone();
    let source = ScriptedSource::default().with_area(
        "sby",
        vec![Scripted::Listing(first), Scripted::Listing(repost)],
    );
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let notifier = Arc::new(RecordingNotifier::default());
    let scout = scout(config(vec![around_lawrence()]), source, store.clone(), notifier.clone());

    let report = scout.run_cycle().await.unwrap();

    assert_eq!(report.accepted.len(), 2);
    assert_eq!(report.stats.already_seen, 0);
    assert_eq!(report.stats.stored_total, 2);
    assert!(store.exists("8").await.unwrap());
    assert_eq!(notifier.posts().len(), 2);
}

#[tokio::test]
async fn test_ignored_listings_are_still_recorded() {
    let mut far = raw("5", "cats ok");
    far.coordinate = Some(Coordinate::new(38.5, -121.5));
    let source = ScriptedSource::default().with_area("sby", vec![Scripted::Listing(far)]);
    let store = Arc::new(MemoryStore::new());
    let scout = scout(
        config(vec![around_lawrence()]),
        source,
        store.clone(),
        Arc::new(RecordingNotifier::default()),
    );

    let report = scout.run_cycle().await.unwrap();
    assert_eq!(report.ignored.len(), 1);
    assert!(!report.ignored[0].geo.near_transit);
    assert!(store.exists("5").await.unwrap());
}

#[tokio::test]
async fn test_broken_items_and_failed_areas_are_skipped() {
    let mut config = config(vec![around_lawrence()]);
    config.search.areas = vec!["sby".to_string(), "pen".to_string(), "eby".to_string()];
    let source = ScriptedSource::default()
        .with_area(
            "sby",
            vec![
                Scripted::Broken,
                Scripted::Listing(raw("6", "cats ok")),
                Scripted::Broken,
            ],
        )
        .with_area("eby", vec![Scripted::Listing(raw("7", "no pet"))]);
    let notifier = Arc::new(RecordingNotifier::default());
    let scout = scout(config, source, Arc::new(MemoryStore::new()), notifier.clone());

    let report = scout.run_cycle().await.unwrap();

    assert_eq!(report.stats.fetch_errors, 2);
    assert_eq!(report.stats.areas_failed, 1);
    assert_eq!(report.stats.fetched, 2);
    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.ignored.len(), 1);
    assert_eq!(notifier.posts().len(), 2);
}

#[tokio::test]
async fn test_failed_post_does_not_block_later_posts() {
    let source = ScriptedSource::default().with_area(
        "sby",
        vec![
            Scripted::Listing(raw("8", "cats ok")),
            Scripted::Listing(raw("9", "cats ok")),
            Scripted::Listing(raw("10", "no pets")),
        ],
    );
    let notifier = Arc::new(RecordingNotifier {
        fail_containing: Some("|Listing 8>".to_string()),
        ..RecordingNotifier::default()
    });
    let scout = scout(config(vec![around_lawrence()]), source, Arc::new(MemoryStore::new()), notifier.clone());

    let report = scout.run_cycle().await.unwrap();

    assert_eq!(report.accepted.len(), 2);
    assert_eq!(report.stats.notify_failures, 1);
    let posts = notifier.posts();
    assert_eq!(posts.len(), 2);
    assert!(posts[0].1.ends_with("|Listing 9>"));
    assert_eq!(posts[1].0, "#housing-ignored");
}

#[tokio::test]
async fn test_area_limit_is_respected() {
    let items = (0..30)
        .map(|i| Scripted::Listing(raw(&format!("l{i}"), "quiet")))
        .collect();
    let source = ScriptedSource::default().with_area("sby", items);
    let scout = scout(
        config(vec![]),
        source,
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingNotifier::default()),
    );

    let report = scout.run_cycle().await.unwrap();
    assert_eq!(report.stats.fetched, 20);
    assert_eq!(report.ignored.len(), 20);
}

#[tokio::test]
async fn test_store_failure_fails_the_cycle() {
    let source = ScriptedSource::default().with_area("sby", vec![Scripted::Listing(raw("11", "cats ok"))]);
    let scout = scout(
        config(vec![]),
        source,
        Arc::new(BrokenStore),
        Arc::new(RecordingNotifier::default()),
    );

    let err = scout.run_cycle().await.unwrap_err();
    assert!(format!("{err:#}").contains("disk on fire"));
}

#[tokio::test(start_paused = true)]
async fn test_supervisor_keeps_going_after_failed_cycles() {
    let source = ScriptedSource::default().with_area("sby", vec![Scripted::Listing(raw("12", "cats ok"))]);
    let scout = scout(
        config(vec![]),
        source,
        Arc::new(BrokenStore),
        Arc::new(RecordingNotifier::default()),
    );
    let supervisor = Supervisor::new(scout).with_interval(Duration::from_secs(60));

    let summary = supervisor
        .run(tokio::time::sleep(Duration::from_secs(150)))
        .await;

    assert_eq!(summary.cycles_ok, 0);
    assert_eq!(summary.cycles_failed, 3);
}

#[tokio::test(start_paused = true)]
async fn test_supervisor_stops_on_shutdown() {
    let source = ScriptedSource::default().with_area("sby", vec![Scripted::Listing(raw("13", "cats ok"))]);
    let notifier = Arc::new(RecordingNotifier::default());
    let scout = scout(
        config(vec![around_lawrence()]),
        source,
        Arc::new(MemoryStore::new()),
        notifier.clone(),
    );
    let supervisor = Supervisor::new(scout);

    let summary = supervisor.run(tokio::time::sleep(Duration::from_secs(1))).await;

    assert_eq!(summary.cycles_ok, 1);
    assert_eq!(summary.cycles_failed, 0);
    assert_eq!(notifier.posts().len(), 1);
}
