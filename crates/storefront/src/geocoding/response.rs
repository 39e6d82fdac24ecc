//! Typed parsing of Google Geocoding API responses.
//!
//! The raw response is deserialized into narrow structs with defaults for
//! every optional part, then reduced to a [`GeocodeResult`] or a typed error.
//! Address component lookups are total: a missing component is an empty string.

use serde::Deserialize;

use pizzeria_core::Coordinate;

use super::{GeocodeError, GeocodeResult};

/// Provider status for a successful lookup.
const STATUS_OK: &str = "OK";

/// Top-level geocoding response.
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<ApiResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResult {
    #[serde(default)]
    formatted_address: String,
    geometry: Geometry,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// One structured address component (e.g. `locality`, `postal_code`).
#[derive(Debug, Clone, Deserialize)]
pub struct AddressComponent {
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// Which spelling of a component to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameForm {
    Long,
    Short,
}

/// Value of the first component tagged `kind`, or an empty string.
#[must_use]
pub fn component(components: &[AddressComponent], kind: &str, form: NameForm) -> String {
    components
        .iter()
        .find(|c| c.types.iter().any(|t| t == kind))
        .map(|c| match form {
            NameForm::Long => c.long_name.clone(),
            NameForm::Short => c.short_name.clone(),
        })
        .unwrap_or_default()
}

/// First non-empty value among `kinds`, in order, or an empty string.
#[must_use]
pub fn first_component(components: &[AddressComponent], kinds: &[&str], form: NameForm) -> String {
    kinds
        .iter()
        .map(|kind| component(components, kind, form))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

/// Parse a response body into the provider's best match.
///
/// # Errors
///
/// - `GeocodeError::ProviderUnavailable` if the body is not a geocoding response
///   or the best match has unusable coordinates
/// - `GeocodeError::AddressNotFound` for a non-OK status or zero results
pub fn parse(body: &str) -> Result<GeocodeResult, GeocodeError> {
    let response: GeocodeResponse = serde_json::from_str(body).map_err(|e| {
        GeocodeError::ProviderUnavailable(format!("malformed geocoding response: {e}"))
    })?;

    if response.status != STATUS_OK {
        let detail = response.error_message.map_or_else(
            || response.status.clone(),
            |message| format!("{}: {message}", response.status),
        );
        return Err(GeocodeError::AddressNotFound(detail));
    }

    let best = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::AddressNotFound("no results".to_string()))?;

    let coordinate = Coordinate::try_new(best.geometry.location.lat, best.geometry.location.lng)
        .map_err(|e| GeocodeError::ProviderUnavailable(format!("invalid coordinates: {e}")))?;

    let components = &best.address_components;
    Ok(GeocodeResult {
        coordinate,
        formatted_address: best.formatted_address,
        city: first_component(
            components,
            &["locality", "administrative_area_level_2"],
            NameForm::Long,
        ),
        state: component(components, "administrative_area_level_1", NameForm::Short),
        postal_code: component(components, "postal_code", NameForm::Long),
    })
}
