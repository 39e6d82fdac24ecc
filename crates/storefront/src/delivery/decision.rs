//! The answer returned to checkout.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pizzeria_core::{DeliveryZone, ZoneId};

use super::settings::{Configuration, FALLBACK_ETA_MINUTES};
use crate::geocoding::GeocodeError;

/// How a decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Flat fee: geolocation disabled or no zone matched.
    Fallback,
    /// Zone reused from a fresh cache entry.
    Cache,
    ZoneMatch,
    OutOfRange,
    GeocodingFailed,
    /// The request itself was rejected.
    Error,
}

impl ResolutionMethod {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fallback => "fallback",
            Self::Cache => "cache",
            Self::ZoneMatch => "zone_match",
            Self::OutOfRange => "out_of_range",
            Self::GeocodingFailed => "geocoding_failed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable reason attached to non-deliverable failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    InvalidInput,
    ConfigurationMissing,
    ProviderUnavailable,
    AddressNotFound,
}

impl From<&GeocodeError> for FailureReason {
    fn from(err: &GeocodeError) -> Self {
        match err {
            GeocodeError::ConfigurationMissing => Self::ConfigurationMissing,
            GeocodeError::ProviderUnavailable(_) => Self::ProviderUnavailable,
            GeocodeError::AddressNotFound(_) => Self::AddressNotFound,
        }
    }
}

/// Result of one delivery resolution.
///
/// Optional fields are omitted from JSON when not applicable to `method`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDecision {
    pub method: ResolutionMethod,
    pub deliverable: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<Decimal>,
    /// `fee` with its currency symbol, e.g. `R$ 8.00`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_formatted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_minutes: Option<u32>,
    /// Distance from the pizzeria, rounded to two decimals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_radius_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<ZoneId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureReason>,
}

impl DeliveryDecision {
    fn bare(method: ResolutionMethod, deliverable: bool, message: String) -> Self {
        Self {
            method,
            deliverable,
            message,
            fee: None,
            fee_formatted: None,
            eta_minutes: None,
            distance_km: None,
            max_radius_km: None,
            zone_id: None,
            zone_name: None,
            zone_color: None,
            formatted_address: None,
            error: None,
        }
    }

    fn with_fee(mut self, config: &Configuration, fee: Decimal, eta_minutes: u32) -> Self {
        let money = config.money(fee);
        self.fee = Some(money.rounded());
        self.fee_formatted = Some(money.to_string());
        self.eta_minutes = Some(eta_minutes);
        self
    }

    /// Flat fallback fee with the fixed ETA.
    #[must_use]
    pub fn fallback(
        config: &Configuration,
        distance_km: Option<f64>,
        formatted_address: Option<String>,
    ) -> Self {
        let fee = config.money(config.fallback_fee);
        let mut decision = Self::bare(
            ResolutionMethod::Fallback,
            true,
            format!("Delivery available for a flat fee of {fee}"),
        )
        .with_fee(config, config.fallback_fee, FALLBACK_ETA_MINUTES);
        decision.distance_km = distance_km.map(round_km);
        decision.formatted_address = formatted_address;
        decision
    }

    /// Fee and ETA from `zone`; `method` is either `ZoneMatch` or `Cache`.
    #[must_use]
    pub fn zone(
        method: ResolutionMethod,
        config: &Configuration,
        zone: &DeliveryZone,
        distance_km: f64,
        formatted_address: Option<String>,
    ) -> Self {
        let fee = config.money(zone.fee);
        let mut decision = Self::bare(
            method,
            true,
            format!(
                "Delivery to {} in about {} min for {fee}",
                zone.display_name, zone.estimated_time_minutes
            ),
        )
        .with_fee(config, zone.fee, zone.estimated_time_minutes);
        decision.distance_km = Some(round_km(distance_km));
        decision.zone_id = Some(zone.id);
        decision.zone_name = Some(zone.display_name.clone());
        decision.zone_color = Some(zone.display_color.clone());
        decision.formatted_address = formatted_address;
        decision
    }

    /// Beyond the service radius.
    #[must_use]
    pub fn out_of_range(
        config: &Configuration,
        distance_km: f64,
        formatted_address: Option<String>,
    ) -> Self {
        let distance = round_km(distance_km);
        let mut decision = Self::bare(
            ResolutionMethod::OutOfRange,
            false,
            format!(
                "Address is {distance:.2} km away; we deliver up to {} km",
                config.max_radius_km
            ),
        );
        decision.distance_km = Some(distance);
        decision.max_radius_km = Some(config.max_radius_km);
        decision.formatted_address = formatted_address;
        decision
    }

    /// The address could not be geocoded.
    #[must_use]
    pub fn geocoding_failed(err: &GeocodeError) -> Self {
        let message = match err {
            GeocodeError::AddressNotFound(_) => {
                "We could not find this address. Please check it and try again."
            }
            GeocodeError::ProviderUnavailable(_) | GeocodeError::ConfigurationMissing => {
                "Address lookup is unavailable right now. Please try again shortly."
            }
        };
        let mut decision = Self::bare(
            ResolutionMethod::GeocodingFailed,
            false,
            message.to_string(),
        );
        decision.error = Some(FailureReason::from(err));
        decision
    }

    /// The request was rejected before resolution.
    #[must_use]
    pub fn invalid_input(detail: &str) -> Self {
        let mut decision = Self::bare(ResolutionMethod::Error, false, detail.to_string());
        decision.error = Some(FailureReason::InvalidInput);
        decision
    }
}

/// Round a distance to two decimals for display.
#[must_use]
pub fn round_km(distance_km: f64) -> f64 {
    (distance_km * 100.0).round() / 100.0
}
