//! Geocoding provider adapter.
//!
//! Converts free-text addresses into coordinates through a single external
//! call. There is no caching here; [`crate::delivery::GeocodeCache`] sits above
//! this layer. Failures are reported, never retried.
//!
//! # Example
//!
//! ```rust,ignore
//! use pizzeria_storefront::geocoding::{Geocoder, GoogleGeocoder};
//!
//! let geocoder = GoogleGeocoder::new(&config.geocoding)?;
//! let result = geocoder.geocode("Av. Paulista, 1000", &credential).await?;
//! println!("{} -> {:?}", result.formatted_address, result.coordinate);
//! ```

mod google;
pub mod response;

pub use google::GoogleGeocoder;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pizzeria_core::Coordinate;

/// Errors that can occur when geocoding an address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    /// No provider credential is configured; no request was made.
    #[error("geocoding credential is not configured")]
    ConfigurationMissing,

    /// Transport failure or unusable provider response.
    #[error("geocoding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider answered but found nothing (zero results or non-OK status).
    #[error("address not found: {0}")]
    AddressNotFound(String),
}

impl From<reqwest::Error> for GeocodeError {
    /// The request URL carries the credential, so it is stripped first.
    fn from(err: reqwest::Error) -> Self {
        Self::ProviderUnavailable(err.without_url().to_string())
    }
}

/// The provider's best match for an address.
///
/// Locality fields are empty strings when the provider omits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub coordinate: Coordinate,
    pub formatted_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// A geocoding provider.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocode `address` using `credential`.
    ///
    /// # Errors
    ///
    /// - `GeocodeError::ConfigurationMissing` if `credential` is empty
    /// - `GeocodeError::ProviderUnavailable` on transport failure
    /// - `GeocodeError::AddressNotFound` if the provider has no match
    async fn geocode(
        &self,
        address: &str,
        credential: &SecretString,
    ) -> Result<GeocodeResult, GeocodeError>;
}
