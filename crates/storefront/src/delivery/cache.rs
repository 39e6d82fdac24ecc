//! Freshness-bounded geocode cache.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use pizzeria_core::{GeocodeCacheEntry, freshness_window};

use super::store::GeocodeCacheStore;

/// Geocode cache over a [`GeocodeCacheStore`].
///
/// Storage errors never reach the caller: a failed read is a miss and a
/// failed write is logged and dropped.
#[derive(Clone)]
pub struct GeocodeCache {
    store: Arc<dyn GeocodeCacheStore>,
    window: Duration,
}

impl GeocodeCache {
    /// Create a cache with the standard seven-day freshness window.
    #[must_use]
    pub fn new(store: Arc<dyn GeocodeCacheStore>) -> Self {
        Self::with_window(store, freshness_window())
    }

    #[must_use]
    pub const fn with_window(store: Arc<dyn GeocodeCacheStore>, window: Duration) -> Self {
        Self { store, window }
    }

    /// The fresh entry for `address_text`, if any.
    pub async fn lookup(&self, address_text: &str) -> Option<GeocodeCacheEntry> {
        self.lookup_at(address_text, Utc::now()).await
    }

    /// [`Self::lookup`] evaluated at `now`.
    pub async fn lookup_at(
        &self,
        address_text: &str,
        now: DateTime<Utc>,
    ) -> Option<GeocodeCacheEntry> {
        match self.store.find(address_text).await {
            Ok(Some(entry)) if entry.is_fresh_at(now, self.window) => Some(entry),
            Ok(Some(entry)) => {
                debug!(
                    address = %address_text,
                    last_verified_at = %entry.last_verified_at,
                    "Stale geocode cache entry ignored"
                );
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(address = %address_text, error = %e, "Geocode cache read failed");
                None
            }
        }
    }

    /// Insert or replace the entry for `entry.address_key`.
    pub async fn upsert(&self, entry: &GeocodeCacheEntry) {
        if let Err(e) = self.store.upsert(entry).await {
            warn!(address = %entry.address_key, error = %e, "Geocode cache write failed");
        }
    }
}
