//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::{GeocodeCacheRepository, SettingsRepository, ZoneRepository};
use crate::delivery::{DeliveryResolver, GeocodeCache};
use crate::geocoding::{GeocodeError, GoogleGeocoder};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    zones: ZoneRepository,
    resolver: DeliveryResolver,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the geocoding HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, GeocodeError> {
        let geocoder = GoogleGeocoder::new(&config.geocoding)?;
        let zones = ZoneRepository::new(pool.clone());

        let resolver = DeliveryResolver::new(
            Arc::new(SettingsRepository::new(pool.clone())),
            Arc::new(zones.clone()),
            GeocodeCache::new(Arc::new(GeocodeCacheRepository::new(pool.clone()))),
            Arc::new(geocoder),
            config.geocoding.fallback_api_key.clone(),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                zones,
                resolver,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn zones(&self) -> &ZoneRepository {
        &self.inner.zones
    }

    /// The delivery resolver.
    #[must_use]
    pub fn resolver(&self) -> &DeliveryResolver {
        &self.inner.resolver
    }
}
