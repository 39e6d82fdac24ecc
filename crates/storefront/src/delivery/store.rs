//! Row-store interfaces consumed by the resolver.
//!
//! Postgres implementations live in [`crate::db`]; tests supply in-memory ones.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use pizzeria_core::{DeliveryZone, GeocodeCacheEntry, ZoneId};

use crate::db::RepositoryError;

/// Source of the delivery settings key/value set.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// All `delivery.*` settings.
    async fn delivery_settings(&self) -> Result<HashMap<String, JsonValue>, RepositoryError>;
}

/// Read access to delivery zones.
#[async_trait]
pub trait ZoneStore: Send + Sync {
    /// Active zones ordered by ascending `min_distance_km` (ties by id).
    async fn active_zones(&self) -> Result<Vec<DeliveryZone>, RepositoryError>;

    /// A zone by id, whether active or not.
    async fn zone_by_id(&self, id: ZoneId) -> Result<Option<DeliveryZone>, RepositoryError>;
}

/// Raw geocode cache rows keyed by address text.
#[async_trait]
pub trait GeocodeCacheStore: Send + Sync {
    /// The row for `address_key`, regardless of age.
    async fn find(&self, address_key: &str) -> Result<Option<GeocodeCacheEntry>, RepositoryError>;

    /// Insert or replace the row for `entry.address_key` in one atomic write.
    async fn upsert(&self, entry: &GeocodeCacheEntry) -> Result<(), RepositoryError>;
}
