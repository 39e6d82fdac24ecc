//! Database operations for storefront `PostgreSQL`.
//!
//! # Database: `pizzeria`
//!
//! ## Tables
//!
//! - `settings` - Key/value delivery settings (JSONB values)
//! - `delivery_zone` - Distance bands with fee and ETA, edited by the back office
//! - `geocode_cache` - Last resolution outcome per address text
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p pizzeria-cli -- migrate
//! ```

pub mod geocode_cache;
pub mod settings;
pub mod zones;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use geocode_cache::GeocodeCacheRepository;
pub use settings::SettingsRepository;
pub use zones::{NewZone, ZoneRepository};

/// Errors that can occur during repository operations.
///
/// Callers in the delivery path treat every variant as "store unavailable"
/// and degrade instead of failing the request.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The store could not be reached or the query failed.
    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
