//! Geographic coordinates and great-circle distance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius used by the Haversine formula, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
///
/// Accepts the short `lat`/`lon`/`lng` spellings when deserializing, since
/// checkout clients and map widgets disagree on naming.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    pub longitude: f64,
}

/// Reasons a coordinate is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("coordinate components must be finite numbers")]
    NotFinite,
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

impl Coordinate {
    /// Create a coordinate without validation.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a coordinate, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns `CoordinateError` if either component is NaN/infinite or outside
    /// the valid degree range.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        let coordinate = Self::new(latitude, longitude);
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Check that this coordinate lies on the globe.
    ///
    /// # Errors
    ///
    /// Returns `CoordinateError` describing the first invalid component.
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }

    /// Great-circle distance to another coordinate, in kilometers.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        distance_km(*self, *other)
    }
}

/// Haversine great-circle distance between two coordinates, in kilometers.
///
/// Symmetric in its arguments and exactly zero for identical inputs.
#[must_use]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }

    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h marginally past 1.0 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAO_PAULO: Coordinate = Coordinate::new(-23.5505, -46.6333);

    #[test]
    fn test_distance_to_self_is_zero() {
        assert!(distance_km(SAO_PAULO, SAO_PAULO).abs() < f64::EPSILON);
        let origin = Coordinate::new(0.0, 0.0);
        assert!(distance_km(origin, origin).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let points = [
            SAO_PAULO,
            Coordinate::new(-23.5605, -46.6433),
            Coordinate::new(40.7128, -74.0060),
            Coordinate::new(51.5074, -0.1278),
            Coordinate::new(-33.8688, 151.2093),
            Coordinate::new(89.9, 179.9),
        ];
        for a in points {
            for b in points {
                assert!((distance_km(a, b) - distance_km(b, a)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_distance_short_hop_in_sao_paulo() {
        let target = Coordinate::new(-23.5605, -46.6433);
        let d = distance_km(SAO_PAULO, target);
        assert!((d - 1.5).abs() < 0.1, "expected ~1.5 km, got {d}");
    }

    #[test]
    fn test_distance_one_degree_of_latitude() {
        // One degree of arc on a 6371 km sphere is ~111.19 km.
        let d = distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn test_distance_antipodal_is_half_circumference() {
        let d = distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert_eq!(
            Coordinate::try_new(91.0, 0.0),
            Err(CoordinateError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            Coordinate::try_new(0.0, -180.5),
            Err(CoordinateError::LongitudeOutOfRange(-180.5))
        );
        assert_eq!(
            Coordinate::try_new(f64::NAN, 0.0),
            Err(CoordinateError::NotFinite)
        );
        assert!(Coordinate::try_new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_deserialize_accepts_short_names() {
        let c: Coordinate = serde_json::from_str(r#"{"lat": -23.5, "lon": -46.6}"#).unwrap();
        assert_eq!(c, Coordinate::new(-23.5, -46.6));

        let c: Coordinate = serde_json::from_str(r#"{"latitude": 1.0, "lng": 2.0}"#).unwrap();
        assert_eq!(c, Coordinate::new(1.0, 2.0));
    }
}
