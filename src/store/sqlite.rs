//! SQLite listing store.
//!
//! One row per external id; the `UNIQUE` constraint on `external_id` is the
//! dedup mechanism and the only uniqueness key. Reposts can share a link.

use super::ListingStore;
use crate::error::StoreError;
use crate::models::PersistedListing;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::debug;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect and create the schema if needed.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - In-memory database (ephemeral)
    /// - `sqlite://listings.db?mode=rwc` - File-based, created if missing
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        // A single connection keeps `sqlite::memory:` pointing at one database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        debug!("Listing store ready at {}", database_url);
        Ok(store)
    }

    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect("sqlite::memory:").await
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS listings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id TEXT NOT NULL UNIQUE,
                link TEXT NOT NULL,
                created TEXT NOT NULL,
                lat REAL NOT NULL,
                lon REAL NOT NULL,
                title TEXT NOT NULL,
                price REAL NOT NULL,
                location TEXT NOT NULL,
                area TEXT,
                region TEXT NOT NULL,
                station TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, external_id: &str) -> Result<Option<PersistedListing>, StoreError> {
        let row = sqlx::query_as::<_, ListingRow>(
            "SELECT external_id, link, created, lat, lon, title, price, location, area, region, station
             FROM listings WHERE external_id = ?",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ListingRow::into_persisted).transpose()
    }

    /// Close the pool; pending writes are flushed first.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(Debug, FromRow)]
struct ListingRow {
    external_id: String,
    link: String,
    created: String,
    lat: f64,
    lon: f64,
    title: String,
    price: f64,
    location: String,
    area: Option<String>,
    region: String,
    station: String,
}

impl ListingRow {
    fn into_persisted(self) -> Result<PersistedListing, StoreError> {
        let created = DateTime::parse_from_rfc3339(&self.created)
            .map_err(|e| StoreError::Corrupt {
                reason: format!("invalid created timestamp for {}: {e}", self.external_id),
            })?
            .with_timezone(&Utc);

        Ok(PersistedListing {
            external_id: self.external_id,
            link: self.link,
            created,
            lat: self.lat,
            lon: self.lon,
            title: self.title,
            price: self.price,
            location: self.location,
            area: self.area,
            region: self.region,
            station: self.station,
        })
    }
}

#[async_trait]
impl ListingStore for SqliteStore {
    async fn exists(&self, external_id: &str) -> Result<bool, StoreError> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM listings WHERE external_id = ? LIMIT 1")
                .bind(external_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    async fn insert(&self, listing: &PersistedListing) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO listings
                (external_id, link, created, lat, lon, title, price, location, area, region, station)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&listing.external_id)
        .bind(&listing.link)
        .bind(listing.created.to_rfc3339())
        .bind(listing.lat)
        .bind(listing.lon)
        .bind(&listing.title)
        .bind(listing.price)
        .bind(&listing.location)
        .bind(&listing.area)
        .bind(&listing.region)
        .bind(&listing.station)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::Duplicate {
                external_id: listing.external_id.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
