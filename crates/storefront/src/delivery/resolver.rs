//! The delivery resolver, sole entry point for checkout.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use pizzeria_core::{Coordinate, GeocodeCacheEntry, ZoneId, match_zone};

use super::cache::GeocodeCache;
use super::decision::{DeliveryDecision, ResolutionMethod};
use super::settings::Configuration;
use super::store::{SettingsStore, ZoneStore};
use crate::geocoding::{GeocodeError, Geocoder};

/// The only hard failure of [`DeliveryResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Neither a usable address nor a valid coordinate was supplied.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// What checkout sends: an address, a coordinate, or both.
///
/// When both are present the coordinate is used for the distance and the
/// address text only keys the cache and echoes back as `formattedAddress`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveInput {
    #[serde(default)]
    pub address_text: Option<String>,
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
}

impl ResolveInput {
    #[must_use]
    pub fn address(text: impl Into<String>) -> Self {
        Self {
            address_text: Some(text.into()),
            coordinate: None,
        }
    }

    #[must_use]
    pub const fn coordinate(coordinate: Coordinate) -> Self {
        Self {
            address_text: None,
            coordinate: Some(coordinate),
        }
    }

    fn validate(self) -> Result<Request, ResolveError> {
        let address = self.address_text.filter(|text| !text.trim().is_empty());
        if let Some(coordinate) = &self.coordinate {
            coordinate
                .validate()
                .map_err(|e| ResolveError::InvalidInput(e.to_string()))?;
        }
        match (address, self.coordinate) {
            (None, None) => Err(ResolveError::InvalidInput(
                "an address or a coordinate is required".to_string(),
            )),
            (address, Some(coordinate)) => Ok(Request::Coordinate {
                address,
                coordinate,
            }),
            (Some(address), None) => Ok(Request::Address(address)),
        }
    }
}

/// Validated input.
enum Request {
    Coordinate {
        address: Option<String>,
        coordinate: Coordinate,
    },
    Address(String),
}

/// Outcome of looking up an address: a coordinate to decide on, or a
/// finished decision (cached zone hit or geocoding failure).
enum Lookup {
    Located(Located),
    Decided(Box<DeliveryDecision>),
}

/// A coordinate and where it came from.
struct Located {
    coordinate: Coordinate,
    formatted_address: Option<String>,
    /// Timestamp for the cache row; reused coordinates keep their original one.
    verified_at: DateTime<Utc>,
}

/// Resolves delivery availability, zone, fee and ETA.
///
/// Holds only shared handles; configuration, cache entries and zones are read
/// fresh on every call, so one resolver serves any number of concurrent
/// requests. Dropping a `resolve` future cancels the in-flight store or
/// provider call with it.
#[derive(Clone)]
pub struct DeliveryResolver {
    settings: Arc<dyn SettingsStore>,
    zones: Arc<dyn ZoneStore>,
    cache: GeocodeCache,
    geocoder: Arc<dyn Geocoder>,
    fallback_credential: Option<SecretString>,
}

impl DeliveryResolver {
    /// Create a resolver.
    ///
    /// `fallback_credential` is the provider key used when the settings table
    /// carries none.
    #[must_use]
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        zones: Arc<dyn ZoneStore>,
        cache: GeocodeCache,
        geocoder: Arc<dyn Geocoder>,
        fallback_credential: Option<SecretString>,
    ) -> Self {
        Self {
            settings,
            zones,
            cache,
            geocoder,
            fallback_credential,
        }
    }

    /// Load the delivery configuration, degrading to the conservative
    /// snapshot when settings are unreadable.
    pub async fn load_configuration(&self) -> Configuration {
        match self.settings.delivery_settings().await {
            Ok(settings) => {
                Configuration::from_settings(&settings, self.fallback_credential.as_ref())
            }
            Err(e) => {
                warn!(error = %e, "Delivery settings unavailable, using conservative defaults");
                Configuration::unavailable(self.fallback_credential.as_ref())
            }
        }
    }

    /// Resolve `input` against freshly loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidInput` if neither an address nor a valid
    /// coordinate was supplied. Every other failure is reported inside the
    /// returned decision.
    pub async fn resolve(&self, input: ResolveInput) -> Result<DeliveryDecision, ResolveError> {
        let request = input.validate()?;
        let config = self.load_configuration().await;
        Ok(self.resolve_request(&config, request).await)
    }

    /// Resolve `input` against an explicit configuration snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidInput` if neither an address nor a valid
    /// coordinate was supplied.
    pub async fn resolve_with(
        &self,
        config: &Configuration,
        input: ResolveInput,
    ) -> Result<DeliveryDecision, ResolveError> {
        let request = input.validate()?;
        Ok(self.resolve_request(config, request).await)
    }

    #[instrument(skip_all, fields(address = tracing::field::Empty))]
    async fn resolve_request(&self, config: &Configuration, request: Request) -> DeliveryDecision {
        if !config.geolocation_enabled {
            debug!("Geolocation disabled, quoting fallback fee");
            return DeliveryDecision::fallback(config, None, None);
        }

        let now = Utc::now();
        let (address, located) = match request {
            Request::Coordinate {
                address,
                coordinate,
            } => {
                let located = Located {
                    coordinate,
                    formatted_address: address.clone(),
                    verified_at: now,
                };
                (address, located)
            }
            Request::Address(address) => {
                tracing::Span::current().record("address", address.as_str());
                match self.locate_address(config, &address, now).await {
                    Lookup::Located(located) => (Some(address), located),
                    Lookup::Decided(decision) => return *decision,
                }
            }
        };

        let decision = self.decide(config, address.as_deref(), located).await;
        info!(
            method = %decision.method,
            deliverable = decision.deliverable,
            distance_km = ?decision.distance_km,
            zone_id = ?decision.zone_id,
            "Delivery resolved"
        );
        decision
    }

    /// Coordinates for an address, from the cache or the provider.
    async fn locate_address(
        &self,
        config: &Configuration,
        address: &str,
        now: DateTime<Utc>,
    ) -> Lookup {
        if let Some(entry) = self.cache.lookup_at(address, now).await {
            if let Some(decision) = self.cached_zone_decision(config, &entry).await {
                info!(
                    method = %decision.method,
                    zone_id = ?decision.zone_id,
                    "Delivery resolved from cache"
                );
                return Lookup::Decided(Box::new(decision));
            }
            if entry.zone_id.is_none() {
                debug!("Reusing cached coordinates");
                return Lookup::Located(Located {
                    coordinate: entry.coordinate,
                    formatted_address: Some(entry.formatted_address),
                    verified_at: entry.last_verified_at,
                });
            }
            debug!(zone_id = ?entry.zone_id, "Cached zone no longer valid, re-resolving");
        }

        if !config.has_credential() {
            warn!("No geocoding credential configured");
            return Lookup::Decided(Box::new(DeliveryDecision::geocoding_failed(
                &GeocodeError::ConfigurationMissing,
            )));
        }

        match self
            .geocoder
            .geocode(address, &config.provider_credential)
            .await
        {
            Ok(result) => Lookup::Located(Located {
                coordinate: result.coordinate,
                formatted_address: Some(result.formatted_address),
                verified_at: now,
            }),
            Err(e) => {
                warn!(error = %e, "Geocoding failed");
                Lookup::Decided(Box::new(DeliveryDecision::geocoding_failed(&e)))
            }
        }
    }

    /// A `cache` decision when the entry's zone is still valid.
    ///
    /// Valid means the zone exists, is active, its band contains the distance
    /// from the current home to the cached coordinate, and that distance is
    /// within the current radius.
    async fn cached_zone_decision(
        &self,
        config: &Configuration,
        entry: &GeocodeCacheEntry,
    ) -> Option<DeliveryDecision> {
        let (zone_id, _) = entry.resolved_zone()?;
        if !entry.deliverable {
            return None;
        }

        let distance = config.home.distance_to(&entry.coordinate);
        if distance > config.max_radius_km {
            return None;
        }

        let zone = match self.zones.zone_by_id(zone_id).await {
            Ok(Some(zone)) => zone,
            Ok(None) => return None,
            Err(e) => {
                warn!(zone_id = %zone_id, error = %e, "Cached zone lookup failed");
                return None;
            }
        };
        if !zone.active || !zone.contains(distance) {
            return None;
        }

        Some(DeliveryDecision::zone(
            ResolutionMethod::Cache,
            config,
            &zone,
            distance,
            Some(entry.formatted_address.clone()),
        ))
    }

    /// Radius check, zone match and cache write for a known coordinate.
    async fn decide(
        &self,
        config: &Configuration,
        address: Option<&str>,
        located: Located,
    ) -> DeliveryDecision {
        let distance = config.home.distance_to(&located.coordinate);

        if distance > config.max_radius_km {
            if let Some(address) = address {
                self.remember(address, &located, distance, None, false).await;
            }
            return DeliveryDecision::out_of_range(config, distance, located.formatted_address);
        }

        let zones = match self.zones.active_zones().await {
            Ok(zones) => zones,
            Err(e) => {
                warn!(error = %e, "Delivery zones unavailable, quoting fallback fee");
                Vec::new()
            }
        };
        let matched = match_zone(distance, &zones);

        if let Some(address) = address {
            self.remember(address, &located, distance, matched.map(|z| z.id), true)
                .await;
        }

        match matched {
            Some(zone) => DeliveryDecision::zone(
                ResolutionMethod::ZoneMatch,
                config,
                zone,
                distance,
                located.formatted_address,
            ),
            None => DeliveryDecision::fallback(config, Some(distance), located.formatted_address),
        }
    }

    async fn remember(
        &self,
        address: &str,
        located: &Located,
        distance_km: f64,
        zone_id: Option<ZoneId>,
        deliverable: bool,
    ) {
        let entry = GeocodeCacheEntry {
            address_key: address.to_string(),
            formatted_address: located
                .formatted_address
                .clone()
                .unwrap_or_else(|| address.to_string()),
            coordinate: located.coordinate,
            distance_km: Some(distance_km),
            zone_id,
            deliverable,
            last_verified_at: located.verified_at,
        };
        self.cache.upsert(&entry).await;
    }
}
