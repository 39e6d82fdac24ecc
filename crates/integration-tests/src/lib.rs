//! Integration test support for the delivery engine.
//!
//! In-memory implementations of the row-store traits and a scripted geocoder,
//! each counting its calls so tests can assert which dependencies a
//! resolution touched.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pizzeria-integration-tests
//! ```
//!
//! No database or network access is needed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value as JsonValue, json};

use pizzeria_core::{Coordinate, DeliveryZone, GeocodeCacheEntry, ZoneId};
use pizzeria_storefront::db::RepositoryError;
use pizzeria_storefront::delivery::{
    DeliveryResolver, GeocodeCache, GeocodeCacheStore, SettingsStore, ZoneStore, keys,
};
use pizzeria_storefront::geocoding::{GeocodeError, GeocodeResult, Geocoder};

/// Pizzeria location used throughout the tests (São Paulo, Praça da Sé).
pub const HOME: Coordinate = Coordinate::new(-23.5505, -46.6333);

/// About 1.5 km from [`HOME`].
pub const NEAR: Coordinate = Coordinate::new(-23.5605, -46.6433);

/// About 50 km north of [`HOME`].
pub const FAR: Coordinate = Coordinate::new(-23.1005, -46.6333);

/// Credential stored in the default settings.
pub const TEST_KEY: &str = "test-key";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn unavailable() -> RepositoryError {
    RepositoryError::Unavailable(sqlx::Error::PoolTimedOut)
}

// =============================================================================
// Settings
// =============================================================================

/// In-memory settings store.
#[derive(Default)]
pub struct InMemorySettings {
    values: Mutex<HashMap<String, JsonValue>>,
    failing: AtomicBool,
    reads: AtomicUsize,
}

impl InMemorySettings {
    /// Geolocation on, home at [`HOME`], 15 km radius, 5.00 fallback fee.
    #[must_use]
    pub fn enabled() -> Self {
        let settings = Self::default();
        settings.set(keys::HOME_LATITUDE, json!(HOME.latitude));
        settings.set(keys::HOME_LONGITUDE, json!(HOME.longitude));
        settings.set(keys::HOME_ADDRESS, json!("Praça da Sé, São Paulo"));
        settings.set(keys::MAX_RADIUS_KM, json!(15));
        settings.set(keys::GEOLOCATION_ENABLED, json!(true));
        settings.set(keys::FALLBACK_FEE, json!("5.00"));
        settings.set(keys::GEOCODING_API_KEY, json!(TEST_KEY));
        settings
    }

    pub fn set(&self, key: &str, value: JsonValue) {
        lock(&self.values).insert(key.to_string(), value);
    }

    pub fn remove(&self, key: &str) {
        lock(&self.values).remove(key);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsStore for InMemorySettings {
    async fn delivery_settings(&self) -> Result<HashMap<String, JsonValue>, RepositoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(lock(&self.values).clone())
    }
}

// =============================================================================
// Zones
// =============================================================================

/// A zone with the given band, fee in cents and ETA.
#[must_use]
pub fn zone(id: i32, min_km: f64, max_km: f64, fee_cents: i64, eta_minutes: u32) -> DeliveryZone {
    DeliveryZone {
        id: ZoneId::new(id),
        min_distance_km: min_km,
        max_distance_km: max_km,
        fee: Decimal::new(fee_cents, 2),
        estimated_time_minutes: eta_minutes,
        display_name: format!("Zone {id}"),
        display_color: "#4caf50".to_string(),
        active: true,
    }
}

/// Four contiguous bands covering `[0, 15]` km.
#[must_use]
pub fn standard_zones() -> Vec<DeliveryZone> {
    vec![
        zone(1, 0.0, 3.0, 600, 30),
        zone(2, 3.0, 6.0, 800, 40),
        zone(3, 6.0, 10.0, 1200, 50),
        zone(4, 10.0, 15.0, 1800, 60),
    ]
}

/// In-memory zone store.
#[derive(Default)]
pub struct InMemoryZones {
    zones: Mutex<Vec<DeliveryZone>>,
    failing: AtomicBool,
    list_calls: AtomicUsize,
    lookups: AtomicUsize,
}

impl InMemoryZones {
    #[must_use]
    pub fn with(zones: Vec<DeliveryZone>) -> Self {
        let store = Self::default();
        *lock(&store.zones) = zones;
        store
    }

    pub fn insert(&self, zone: DeliveryZone) {
        lock(&self.zones).push(zone);
    }

    /// Edit zone `id` in place, as the back office would.
    pub fn update(&self, id: i32, edit: impl FnOnce(&mut DeliveryZone)) {
        if let Some(zone) = lock(&self.zones).iter_mut().find(|z| z.id == ZoneId::new(id)) {
            edit(zone);
        }
    }

    pub fn remove(&self, id: i32) {
        lock(&self.zones).retain(|z| z.id != ZoneId::new(id));
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ZoneStore for InMemoryZones {
    async fn active_zones(&self) -> Result<Vec<DeliveryZone>, RepositoryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut active: Vec<DeliveryZone> =
            lock(&self.zones).iter().filter(|z| z.active).cloned().collect();
        active.sort_by(|a, b| {
            a.min_distance_km
                .total_cmp(&b.min_distance_km)
                .then(a.id.as_i32().cmp(&b.id.as_i32()))
        });
        Ok(active)
    }

    async fn zone_by_id(&self, id: ZoneId) -> Result<Option<DeliveryZone>, RepositoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(lock(&self.zones).iter().find(|z| z.id == id).cloned())
    }
}

// =============================================================================
// Geocode cache
// =============================================================================

/// In-memory geocode cache rows.
#[derive(Default)]
pub struct InMemoryCache {
    rows: Mutex<HashMap<String, GeocodeCacheEntry>>,
    failing: AtomicBool,
    finds: AtomicUsize,
    upserts: AtomicUsize,
}

impl InMemoryCache {
    #[must_use]
    pub fn get(&self, address_key: &str) -> Option<GeocodeCacheEntry> {
        lock(&self.rows).get(address_key).cloned()
    }

    /// Insert a row directly, bypassing the upsert counter.
    pub fn insert(&self, entry: GeocodeCacheEntry) {
        lock(&self.rows).insert(entry.address_key.clone(), entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.rows).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodeCacheStore for InMemoryCache {
    async fn find(&self, address_key: &str) -> Result<Option<GeocodeCacheEntry>, RepositoryError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.get(address_key))
    }

    async fn upsert(&self, entry: &GeocodeCacheEntry) -> Result<(), RepositoryError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.insert(entry.clone());
        Ok(())
    }
}

// =============================================================================
// Geocoder
// =============================================================================

/// Geocoder answering from a script; unknown addresses get `ZERO_RESULTS`.
#[derive(Default)]
pub struct FakeGeocoder {
    script: Mutex<HashMap<String, Result<GeocodeResult, GeocodeError>>>,
    calls: AtomicUsize,
}

impl FakeGeocoder {
    /// Answer `address` with `coordinate`.
    pub fn knows(&self, address: &str, coordinate: Coordinate) {
        let result = GeocodeResult {
            coordinate,
            formatted_address: format!("{address} - São Paulo - SP, Brazil"),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            postal_code: String::new(),
        };
        lock(&self.script).insert(address.to_string(), Ok(result));
    }

    /// Answer `address` with `error`.
    pub fn fails(&self, address: &str, error: GeocodeError) {
        lock(&self.script).insert(address.to_string(), Err(error));
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(
        &self,
        address: &str,
        _credential: &SecretString,
    ) -> Result<GeocodeResult, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.script)
            .get(address)
            .cloned()
            .unwrap_or_else(|| Err(GeocodeError::AddressNotFound("ZERO_RESULTS".to_string())))
    }
}

// =============================================================================
// Harness
// =============================================================================

/// A resolver wired to in-memory dependencies.
pub struct Harness {
    pub settings: Arc<InMemorySettings>,
    pub zones: Arc<InMemoryZones>,
    pub cache: Arc<InMemoryCache>,
    pub geocoder: Arc<FakeGeocoder>,
    pub resolver: DeliveryResolver,
}

impl Harness {
    /// Enabled settings and the standard zones.
    #[must_use]
    pub fn new() -> Self {
        Self::build(InMemorySettings::enabled(), standard_zones(), None)
    }

    /// Full control over settings, zones and the environment credential.
    #[must_use]
    pub fn build(
        settings: InMemorySettings,
        zones: Vec<DeliveryZone>,
        fallback_credential: Option<&str>,
    ) -> Self {
        let settings = Arc::new(settings);
        let zones = Arc::new(InMemoryZones::with(zones));
        let cache = Arc::new(InMemoryCache::default());
        let geocoder = Arc::new(FakeGeocoder::default());

        let resolver = DeliveryResolver::new(
            settings.clone(),
            zones.clone(),
            GeocodeCache::new(cache.clone()),
            geocoder.clone(),
            fallback_credential.map(|key| SecretString::from(key.to_string())),
        );

        Self {
            settings,
            zones,
            cache,
            geocoder,
            resolver,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
