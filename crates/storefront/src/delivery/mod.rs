//! Delivery zone resolution.
//!
//! Given an address or coordinates, decide whether the pizzeria delivers
//! there, which zone applies, the fee and the ETA, while keeping calls to the
//! paid geocoding provider to a minimum.
//!
//! # Flow
//!
//! ```text
//! Configuration load -> feature flag -> coordinate (input | cache | provider)
//!   -> distance -> radius check -> zone match -> cache upsert -> decision
//! ```
//!
//! Every dependency is fetched fresh per call; there is no shared mutable
//! state between resolutions. Degraded dependencies narrow the answer (forced
//! geocoding, fallback fee, non-deliverable with a reason) instead of failing it.

mod cache;
mod settings;
mod store;

pub mod decision;
pub mod resolver;

pub use cache::GeocodeCache;
pub use decision::{DeliveryDecision, FailureReason, ResolutionMethod};
pub use resolver::{DeliveryResolver, ResolveError, ResolveInput};
pub use settings::{
    Configuration, DEFAULT_FALLBACK_FEE, DEFAULT_MAX_RADIUS_KM, FALLBACK_ETA_MINUTES, keys,
};
pub use store::{GeocodeCacheStore, SettingsStore, ZoneStore};
