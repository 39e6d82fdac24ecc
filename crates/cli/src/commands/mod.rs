//! CLI subcommands.

pub mod migrate;
pub mod resolve;
pub mod seed;
pub mod zones;

use pizzeria_storefront::config::StorefrontConfig;
use pizzeria_storefront::db;
use sqlx::PgPool;

/// Load configuration from the environment (and `.env`) and connect.
async fn connect() -> Result<(StorefrontConfig, PgPool), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;
    Ok((config, pool))
}
