//! Google Geocoding API client.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};
use url::Url;

use super::{GeocodeError, GeocodeResult, Geocoder, response};
use crate::config::GeocodingConfig;

/// Client for the Google Geocoding JSON API.
///
/// The credential is supplied per call because it is a delivery setting that
/// may change between requests.
#[derive(Clone)]
pub struct GoogleGeocoder {
    client: reqwest::Client,
    base_url: Url,
    region: Option<String>,
    language: Option<String>,
}

impl GoogleGeocoder {
    /// Create a new geocoding client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            region: config.region.clone(),
            language: config.language.clone(),
        })
    }

    /// Build the request URL for `address`.
    fn request_url(&self, address: &str, credential: &SecretString) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("address", address);
            query.append_pair("key", credential.expose_secret());
            if let Some(region) = &self.region {
                query.append_pair("region", region);
            }
            if let Some(language) = &self.language {
                query.append_pair("language", language);
            }
        }
        url
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    #[instrument(skip(self, credential))]
    async fn geocode(
        &self,
        address: &str,
        credential: &SecretString,
    ) -> Result<GeocodeResult, GeocodeError> {
        if credential.expose_secret().trim().is_empty() {
            return Err(GeocodeError::ConfigurationMissing);
        }

        let response = self
            .client
            .get(self.request_url(address, credential))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(
                status = %status,
                body = %body.chars().take(200).collect::<String>(),
                "Geocoding provider returned non-success status"
            );
            return Err(GeocodeError::ProviderUnavailable(format!("HTTP {status}")));
        }

        let result = response::parse(&body)?;
        debug!(
            formatted_address = %result.formatted_address,
            city = %result.city,
            "Address geocoded"
        );
        Ok(result)
    }
}
