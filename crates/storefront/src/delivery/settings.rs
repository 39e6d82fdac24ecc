//! Delivery configuration snapshot.
//!
//! Loaded from the settings table at the start of every resolution and never
//! mutated afterwards. Values may have been typed into the back office as JSON
//! numbers or as strings (including Brazilian decimal commas), so every field
//! is parsed leniently and falls back to a safe default when unusable.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use tracing::warn;

use pizzeria_core::{Coordinate, CurrencyCode, Money};

/// Settings keys read by the delivery engine.
pub mod keys {
    pub const HOME_LATITUDE: &str = "delivery.home_latitude";
    pub const HOME_LONGITUDE: &str = "delivery.home_longitude";
    pub const HOME_ADDRESS: &str = "delivery.home_address";
    pub const MAX_RADIUS_KM: &str = "delivery.max_radius_km";
    pub const GEOLOCATION_ENABLED: &str = "delivery.geolocation_enabled";
    pub const FALLBACK_FEE: &str = "delivery.fallback_fee";
    pub const CURRENCY: &str = "delivery.currency";
    pub const GEOCODING_API_KEY: &str = "delivery.geocoding_api_key";
}

/// Service radius used when none is configured.
pub const DEFAULT_MAX_RADIUS_KM: f64 = 15.0;

/// Flat fee (5.00) used when none is configured.
pub const DEFAULT_FALLBACK_FEE: Decimal = Decimal::from_parts(500, 0, 0, false, 2);

/// ETA quoted whenever the flat fallback fee applies.
pub const FALLBACK_ETA_MINUTES: u32 = 45;

/// Delivery settings for one resolution.
#[derive(Clone)]
pub struct Configuration {
    /// Pizzeria location; distances are measured from here.
    pub home: Coordinate,
    pub max_radius_km: f64,
    /// When false, every request gets the fallback fee without geocoding.
    pub geolocation_enabled: bool,
    pub fallback_fee: Decimal,
    pub currency: CurrencyCode,
    /// Geocoding provider key; may be empty, in which case geocoding fails
    /// with `ConfigurationMissing`.
    pub provider_credential: SecretString,
    pub home_address_label: String,
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("home", &self.home)
            .field("max_radius_km", &self.max_radius_km)
            .field("geolocation_enabled", &self.geolocation_enabled)
            .field("fallback_fee", &self.fallback_fee)
            .field("currency", &self.currency)
            .field("provider_credential", &"[REDACTED]")
            .field("home_address_label", &self.home_address_label)
            .finish()
    }
}

impl Configuration {
    /// Build a snapshot from the `delivery.*` settings.
    ///
    /// `fallback_credential` (from the process environment) is used when the
    /// settings carry no geocoding key. Geolocation is forced off when it is
    /// enabled but the home coordinates are missing or invalid.
    #[must_use]
    pub fn from_settings(
        settings: &HashMap<String, JsonValue>,
        fallback_credential: Option<&SecretString>,
    ) -> Self {
        let max_radius_km = match settings.get(keys::MAX_RADIUS_KM).map(parse_number) {
            None => DEFAULT_MAX_RADIUS_KM,
            Some(Some(radius)) if radius.is_finite() && radius >= 0.0 => radius,
            Some(_) => {
                warn!(key = keys::MAX_RADIUS_KM, "Invalid max radius setting, using default");
                DEFAULT_MAX_RADIUS_KM
            }
        };

        let fallback_fee = match settings.get(keys::FALLBACK_FEE).map(parse_decimal) {
            None => DEFAULT_FALLBACK_FEE,
            Some(Some(fee)) if !fee.is_sign_negative() => fee,
            Some(_) => {
                warn!(key = keys::FALLBACK_FEE, "Invalid fallback fee setting, using default");
                DEFAULT_FALLBACK_FEE
            }
        };

        let currency = settings
            .get(keys::CURRENCY)
            .and_then(|v| serde_json::from_value::<CurrencyCode>(v.clone()).ok())
            .unwrap_or_default();

        let requested = settings
            .get(keys::GEOLOCATION_ENABLED)
            .and_then(parse_bool)
            .unwrap_or(false);

        let home = match (
            settings.get(keys::HOME_LATITUDE).and_then(parse_number),
            settings.get(keys::HOME_LONGITUDE).and_then(parse_number),
        ) {
            (Some(lat), Some(lon)) => Coordinate::try_new(lat, lon).ok(),
            _ => None,
        };

        let geolocation_enabled = requested && home.is_some();
        if requested && home.is_none() {
            warn!("Geolocation enabled but home coordinates are missing or invalid; using fallback fee");
        }

        let provider_credential = settings
            .get(keys::GEOCODING_API_KEY)
            .and_then(JsonValue::as_str)
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| SecretString::from(key.to_owned()))
            .or_else(|| fallback_credential.cloned())
            .unwrap_or_else(|| SecretString::from(String::new()));

        let home_address_label = settings
            .get(keys::HOME_ADDRESS)
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_owned();

        Self {
            home: home.unwrap_or(Coordinate::new(0.0, 0.0)),
            max_radius_km,
            geolocation_enabled,
            fallback_fee,
            currency,
            provider_credential,
            home_address_label,
        }
    }

    /// The conservative snapshot used when settings cannot be read:
    /// geolocation off, default fallback fee.
    #[must_use]
    pub fn unavailable(fallback_credential: Option<&SecretString>) -> Self {
        Self::from_settings(&HashMap::new(), fallback_credential)
    }

    /// Whether a non-empty provider credential is configured.
    #[must_use]
    pub fn has_credential(&self) -> bool {
        !self.provider_credential.expose_secret().trim().is_empty()
    }

    /// `amount` in the configured currency.
    #[must_use]
    pub const fn money(&self, amount: Decimal) -> Money {
        Money::new(amount, self.currency)
    }
}

// =============================================================================
// Lenient value parsing
// =============================================================================

fn parse_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn parse_decimal(value: &JsonValue) -> Option<Decimal> {
    match value {
        JsonValue::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        JsonValue::String(s) => Decimal::from_str(&s.trim().replace(',', ".")).ok(),
        _ => None,
    }
}

fn parse_bool(value: &JsonValue) -> Option<bool> {
    match value {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::Number(n) => n.as_i64().map(|n| n != 0),
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn settings(pairs: &[(&str, JsonValue)]) -> HashMap<String, JsonValue> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn enabled_settings() -> HashMap<String, JsonValue> {
        settings(&[
            (keys::HOME_LATITUDE, json!(-23.5505)),
            (keys::HOME_LONGITUDE, json!("-46.6333")),
            (keys::MAX_RADIUS_KM, json!("12,5")),
            (keys::GEOLOCATION_ENABLED, json!("1")),
            (keys::FALLBACK_FEE, json!("7,90")),
            (keys::GEOCODING_API_KEY, json!("settings-key")),
            (keys::HOME_ADDRESS, json!("Rua da Pizza, 42")),
        ])
    }

    #[test]
    fn test_from_settings_parses_lenient_values() {
        let config = Configuration::from_settings(&enabled_settings(), None);
        assert!(config.geolocation_enabled);
        assert_eq!(config.home, Coordinate::new(-23.5505, -46.6333));
        assert!((config.max_radius_km - 12.5).abs() < f64::EPSILON);
        assert_eq!(config.fallback_fee, Decimal::new(790, 2));
        assert_eq!(config.provider_credential.expose_secret(), "settings-key");
        assert_eq!(config.home_address_label, "Rua da Pizza, 42");
        assert_eq!(config.currency, CurrencyCode::BRL);
    }

    #[test]
    fn test_empty_settings_are_conservative() {
        let config = Configuration::from_settings(&HashMap::new(), None);
        assert!(!config.geolocation_enabled);
        assert!((config.max_radius_km - DEFAULT_MAX_RADIUS_KM).abs() < f64::EPSILON);
        assert_eq!(config.fallback_fee, DEFAULT_FALLBACK_FEE);
        assert!(!config.has_credential());
    }

    #[test]
    fn test_enabled_without_home_is_disabled() {
        let mut s = enabled_settings();
        s.remove(keys::HOME_LONGITUDE);
        assert!(!Configuration::from_settings(&s, None).geolocation_enabled);

        let mut s = enabled_settings();
        s.insert(keys::HOME_LATITUDE.to_string(), json!(123.0));
        assert!(!Configuration::from_settings(&s, None).geolocation_enabled);
    }

    #[test]
    fn test_invalid_radius_and_fee_fall_back_to_defaults() {
        let mut s = enabled_settings();
        s.insert(keys::MAX_RADIUS_KM.to_string(), json!("far"));
        s.insert(keys::FALLBACK_FEE.to_string(), json!(-3));
        let config = Configuration::from_settings(&s, None);
        assert!((config.max_radius_km - DEFAULT_MAX_RADIUS_KM).abs() < f64::EPSILON);
        assert_eq!(config.fallback_fee, DEFAULT_FALLBACK_FEE);
    }

    #[test]
    fn test_credential_falls_back_to_environment_key() {
        let env_key = SecretString::from("env-key");

        let mut s = enabled_settings();
        s.insert(keys::GEOCODING_API_KEY.to_string(), json!("  "));
        let config = Configuration::from_settings(&s, Some(&env_key));
        assert_eq!(config.provider_credential.expose_secret(), "env-key");

        let config = Configuration::from_settings(&enabled_settings(), Some(&env_key));
        assert_eq!(config.provider_credential.expose_secret(), "settings-key");
    }

    #[test]
    fn test_unavailable_keeps_geolocation_off() {
        let env_key = SecretString::from("env-key");
        let config = Configuration::unavailable(Some(&env_key));
        assert!(!config.geolocation_enabled);
        assert!(config.has_credential());
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool(&json!(true)), Some(true));
        assert_eq!(parse_bool(&json!(0)), Some(false));
        assert_eq!(parse_bool(&json!("ON")), Some(true));
        assert_eq!(parse_bool(&json!("nope")), None);
        assert_eq!(parse_bool(&json!(null)), None);
    }

    #[test]
    fn test_debug_redacts_credential() {
        let config = Configuration::from_settings(&enabled_settings(), None);
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("settings-key"));
    }
}
