//! Geocode cache entries and their freshness rule.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::geo::Coordinate;
use super::id::ZoneId;

/// Entries older than this are never trusted for a delivery decision.
pub const FRESHNESS_WINDOW_DAYS: i64 = 7;

/// The freshness window as a `chrono::Duration`.
#[must_use]
pub fn freshness_window() -> Duration {
    Duration::days(FRESHNESS_WINDOW_DAYS)
}

/// The last resolution outcome for one address text.
///
/// One row per distinct `address_key`, overwritten on every resolution of the
/// same text whether the outcome was deliverable or not. Expiry is logical
/// (via `last_verified_at`), rows are never deleted by the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCacheEntry {
    /// Address text exactly as the caller supplied it.
    pub address_key: String,
    pub formatted_address: String,
    pub coordinate: Coordinate,
    /// Distance from the pizzeria, if one was computed.
    pub distance_km: Option<f64>,
    /// Matched zone; `None` for fallback-fee and out-of-range outcomes.
    pub zone_id: Option<ZoneId>,
    pub deliverable: bool,
    pub last_verified_at: DateTime<Utc>,
}

impl GeocodeCacheEntry {
    /// Whether this entry may still be used at `now`.
    ///
    /// Fresh means strictly younger than `window`. Entries stamped in the
    /// future (clock skew between app servers) count as fresh.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now.signed_duration_since(self.last_verified_at) < window
    }

    /// Whether this entry is fresh under the default seven-day window.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.is_fresh_at(now, freshness_window())
    }

    /// The cached zone and distance, when both were resolved.
    #[must_use]
    pub fn resolved_zone(&self) -> Option<(ZoneId, f64)> {
        match (self.zone_id, self.distance_km) {
            (Some(zone_id), Some(distance)) => Some((zone_id, distance)),
            _ => None,
        }
    }
}
