//! Geocode cache repository.
//!
//! One row per distinct address text. Writes are a single
//! `INSERT ... ON CONFLICT DO UPDATE`, so concurrent resolutions of the same
//! address never produce duplicate rows; the last writer wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use pizzeria_core::{Coordinate, GeocodeCacheEntry, ZoneId};

use super::RepositoryError;
use crate::delivery::GeocodeCacheStore;

/// Row shape of `storefront.geocode_cache`.
#[derive(Debug, sqlx::FromRow)]
struct CacheRow {
    address_key: String,
    formatted_address: String,
    latitude: f64,
    longitude: f64,
    distance_km: Option<f64>,
    zone_id: Option<ZoneId>,
    deliverable: bool,
    last_verified_at: DateTime<Utc>,
}

impl From<CacheRow> for GeocodeCacheEntry {
    fn from(row: CacheRow) -> Self {
        Self {
            address_key: row.address_key,
            formatted_address: row.formatted_address,
            coordinate: Coordinate::new(row.latitude, row.longitude),
            distance_km: row.distance_km,
            zone_id: row.zone_id,
            deliverable: row.deliverable,
            last_verified_at: row.last_verified_at,
        }
    }
}

/// Repository for geocode cache rows.
#[derive(Clone)]
pub struct GeocodeCacheRepository {
    pool: PgPool,
}

impl GeocodeCacheRepository {
    /// Create a new geocode cache repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GeocodeCacheStore for GeocodeCacheRepository {
    #[instrument(skip(self))]
    async fn find(&self, address_key: &str) -> Result<Option<GeocodeCacheEntry>, RepositoryError> {
        let row: Option<CacheRow> = sqlx::query_as(
            r"
            SELECT address_key, formatted_address, latitude, longitude, distance_km,
                   zone_id, deliverable, last_verified_at
            FROM storefront.geocode_cache
            WHERE address_key = $1
            ",
        )
        .bind(address_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(GeocodeCacheEntry::from))
    }

    #[instrument(skip(self, entry), fields(address = %entry.address_key, deliverable = entry.deliverable))]
    async fn upsert(&self, entry: &GeocodeCacheEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.geocode_cache
                (address_key, formatted_address, latitude, longitude, distance_km,
                 zone_id, deliverable, last_verified_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (address_key) DO UPDATE SET
                formatted_address = EXCLUDED.formatted_address,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                distance_km = EXCLUDED.distance_km,
                zone_id = EXCLUDED.zone_id,
                deliverable = EXCLUDED.deliverable,
                last_verified_at = EXCLUDED.last_verified_at
            ",
        )
        .bind(&entry.address_key)
        .bind(&entry.formatted_address)
        .bind(entry.coordinate.latitude)
        .bind(entry.coordinate.longitude)
        .bind(entry.distance_km)
        .bind(entry.zone_id)
        .bind(entry.deliverable)
        .bind(entry.last_verified_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
