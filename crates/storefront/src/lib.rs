//! Pizzeria storefront library.
//!
//! Delivery zone resolution for checkout: configuration, Postgres row stores,
//! the geocoding adapter, the resolver, and its HTTP surface. The binary in
//! `main.rs` wires these together; the CLI and integration tests reuse them.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod delivery;
pub mod error;
pub mod geocoding;
pub mod middleware;
pub mod routes;
pub mod state;
