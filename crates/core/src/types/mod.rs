//! Core types for the pizzeria delivery engine.
//!
//! This module provides type-safe wrappers for delivery concepts.

pub mod cache;
pub mod geo;
pub mod id;
pub mod price;
pub mod zone;

pub use cache::{FRESHNESS_WINDOW_DAYS, GeocodeCacheEntry, freshness_window};
pub use geo::{Coordinate, CoordinateError, EARTH_RADIUS_KM, distance_km};
pub use id::*;
pub use price::{CurrencyCode, Money};
pub use zone::{CoverageIssue, DeliveryZone, analyze_coverage, match_zone};
