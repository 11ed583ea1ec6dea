use crate::config::Config;
use crate::models::{Bucket, ClassifiedListing, RawListing};
use crate::notify::{render_listing, Notifier};
use crate::pipeline::{annotate::annotate, classify::classify, dedup};
use crate::sources::ListingSource;
use crate::store::ListingStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters for the things a cycle skipped or failed at without aborting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub areas_failed: usize,
    pub fetched: usize,
    pub fetch_errors: usize,
    pub already_seen: usize,
    pub missing_location: usize,
    pub notify_failures: usize,
    /// Listings in the store once the cycle finished.
    pub stored_total: u64,
}

#[derive(Debug, Default)]
pub struct CycleReport {
    pub accepted: Vec<ClassifiedListing>,
    pub ignored: Vec<ClassifiedListing>,
    pub stats: CycleStats,
}

/// What happened to a single raw listing.
#[derive(Debug)]
pub enum Outcome {
    AlreadySeen,
    MissingLocation,
    Classified(ClassifiedListing),
}

/// Runs scrape cycles: fetch, dedup, annotate, classify, persist, notify.
pub struct Scout {
    config: Config,
    source: Arc<dyn ListingSource>,
    store: Arc<dyn ListingStore>,
    notifier: Arc<dyn Notifier>,
}

impl Scout {
    pub fn new(
        config: Config,
        source: Arc<dyn ListingSource>,
        store: Arc<dyn ListingStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            source,
            store,
            notifier,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// One full pass over every configured area.
    ///
    /// Only store failures other than duplicates abort the cycle. Listings already
    /// persisted or posted before an abort stay that way.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        for area in &self.config.search.areas {
            self.scrape_area(area, &mut report).await?;
        }

        info!(
            "Got {} good results, ignoring {} results",
            report.accepted.len(),
            report.ignored.len()
        );

        let slack = &self.config.slack;
        report.stats.notify_failures += self.post_all(&report.accepted, &slack.channel).await;
        report.stats.notify_failures += self.post_all(&report.ignored, &slack.ignored_channel).await;

        match self.store.count().await {
            Ok(total) => {
                report.stats.stored_total = total;
                info!("{} listings recorded so far", total);
            }
            Err(e) => warn!("Could not count recorded listings: {}", e),
        }

        Ok(report)
    }

    async fn scrape_area(&self, area: &str, report: &mut CycleReport) -> Result<()> {
        let query = self.config.search.query_for(area);
        info!("Scraping {} from {}", area, self.source.source_name());

        let results = match self.source.fetch_listings(&query).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Search for area {} failed, skipping it: {}", area, e);
                report.stats.areas_failed += 1;
                return Ok(());
            }
        };

        for result in results {
            let raw = match result {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Skipping listing in {}: {}", area, e);
                    report.stats.fetch_errors += 1;
                    continue;
                }
            };
            report.stats.fetched += 1;

            match self.process(raw).await? {
                Outcome::AlreadySeen => report.stats.already_seen += 1,
                Outcome::MissingLocation => report.stats.missing_location += 1,
                Outcome::Classified(listing) => match listing.bucket {
                    Bucket::Accepted => report.accepted.push(listing),
                    Bucket::Ignored => report.ignored.push(listing),
                },
            }
        }

        Ok(())
    }

    /// Dedup, annotate, classify and persist one listing.
    ///
    /// Listings without a location string are dropped before persisting, so
    /// they come back in later cycles.
    pub async fn process(&self, raw: RawListing) -> Result<Outcome> {
        let novel = dedup::is_novel(self.store.as_ref(), &raw.id)
            .await
            .with_context(|| format!("Failed to look up listing {}", raw.id))?;
        if !novel {
            debug!("Already seen {}", raw.id);
            return Ok(Outcome::AlreadySeen);
        }

        let Some(location) = raw.location.as_deref() else {
            debug!("No location for {}, skipping", raw.id);
            return Ok(Outcome::MissingLocation);
        };

        let geo = annotate(raw.coordinate, location, &self.config.geo);
        let listing = classify(raw, geo, &self.config.classifier);
        debug!(
            id = %listing.raw.id,
            bucket = ?listing.bucket,
            pets = ?listing.pet_policy,
            region = listing.geo.region_name(),
            near_transit = listing.geo.near_transit,
            "Classified listing"
        );

        match dedup::record(self.store.as_ref(), &listing).await {
            Ok(()) => Ok(Outcome::Classified(listing)),
            Err(e) if e.is_duplicate() => {
                debug!("{} was recorded concurrently", listing.raw.id);
                Ok(Outcome::AlreadySeen)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to record listing {}", listing.raw.id)),
        }
    }

    /// Post each listing as its own message; returns how many posts failed.
    async fn post_all(&self, listings: &[ClassifiedListing], channel: &str) -> usize {
        let mut failures = 0;
        for listing in listings {
            let text = render_listing(listing);
            if let Err(e) = self.notifier.post_message(channel, &text).await {
                warn!("Failed to post {} to {}: {}", listing.raw.id, channel, e);
                failures += 1;
            }
        }
        failures
    }
}
