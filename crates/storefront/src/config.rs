//! Storefront configuration loaded from environment variables.
//!
//! This is process-level configuration (where to listen, which database, how to
//! reach the geocoding provider). Delivery business settings such as the home
//! coordinates and fallback fee live in the settings table and are loaded per
//! request by [`crate::delivery::Configuration`].
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_TRUST_PROXY_HEADERS` - Key rate limits on `cf-connecting-ip` /
//!   `x-forwarded-for` / `x-real-ip` (default: false). Only enable behind a proxy
//!   that overwrites these headers.
//! - `GEOCODING_BASE_URL` - Geocoding endpoint (default: Google Geocoding JSON API)
//! - `GEOCODING_REGION` - Region bias, ccTLD form (e.g. `br`)
//! - `GEOCODING_LANGUAGE` - Response language (e.g. `pt-BR`)
//! - `GEOCODING_TIMEOUT_SECS` - Transport timeout for provider calls (default: 10)
//! - `GOOGLE_MAPS_API_KEY` - Provider credential used when the settings table has none
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Google Geocoding API JSON endpoint.
pub const DEFAULT_GEOCODING_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

const DEFAULT_GEOCODING_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Whether a proxy in front of the service sets the client IP headers
    pub trust_proxy_headers: bool,
    /// Geocoding provider configuration
    pub geocoding: GeocodingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. `production`, `staging`)
    pub sentry_environment: Option<String>,
}

/// Geocoding provider transport configuration.
///
/// Implements `Debug` manually to redact the fallback credential.
#[derive(Clone)]
pub struct GeocodingConfig {
    /// Provider endpoint
    pub base_url: Url,
    /// Region bias passed to the provider
    pub region: Option<String>,
    /// Response language passed to the provider
    pub language: Option<String>,
    /// Transport timeout per provider call
    pub timeout: Duration,
    /// Credential used when `delivery.geocoding_api_key` is not set
    pub fallback_api_key: Option<SecretString>,
}

impl std::fmt::Debug for GeocodingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodingConfig")
            .field("base_url", &self.base_url.as_str())
            .field("region", &self.region)
            .field("language", &self.language)
            .field("timeout", &self.timeout)
            .field(
                "fallback_api_key",
                &self.fallback_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_url(),
            region: None,
            language: None,
            timeout: Duration::from_secs(DEFAULT_GEOCODING_TIMEOUT_SECS),
            fallback_api_key: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;

        let trust_proxy_headers = get_flag("STOREFRONT_TRUST_PROXY_HEADERS")?;

        let geocoding = GeocodingConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            trust_proxy_headers,
            geocoding,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl GeocodingConfig {
    /// Load the geocoding section from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for a malformed URL or timeout.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = match get_optional_env("GEOCODING_BASE_URL") {
            Some(raw) => Url::parse(&raw).map_err(|e| {
                ConfigError::InvalidEnvVar("GEOCODING_BASE_URL".to_string(), e.to_string())
            })?,
            None => default_geocoding_url(),
        };
        let timeout_secs = get_env_or_default(
            "GEOCODING_TIMEOUT_SECS",
            &DEFAULT_GEOCODING_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("GEOCODING_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        Ok(Self {
            base_url,
            region: get_optional_env("GEOCODING_REGION"),
            language: get_optional_env("GEOCODING_LANGUAGE"),
            timeout: Duration::from_secs(timeout_secs),
            fallback_api_key: get_optional_env("GOOGLE_MAPS_API_KEY")
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::from),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

#[allow(clippy::expect_used)]
fn default_geocoding_url() -> Url {
    Url::parse(DEFAULT_GEOCODING_BASE_URL).expect("default geocoding URL is a valid URL")
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a boolean flag; unset means false.
fn get_flag(key: &str) -> Result<bool, ConfigError> {
    get_optional_env(key).map_or(Ok(false), |raw| {
        parse_flag(&raw).ok_or_else(|| {
            ConfigError::InvalidEnvVar(key.to_string(), format!("expected a boolean, got {raw:?}"))
        })
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
