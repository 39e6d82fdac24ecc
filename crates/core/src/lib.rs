//! Pizzeria Core - Shared delivery types library.
//!
//! This crate provides the types used by every pizzeria component:
//! - `storefront` - Checkout-facing delivery resolution service
//! - `cli` - Command-line tools for migrations, seeding and zone checks
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Distance and zone matching live here so they can be
//! used (and tested) anywhere.
//!
//! # Modules
//!
//! - [`types`] - Coordinates, delivery zones, money, cache entries and type-safe IDs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
