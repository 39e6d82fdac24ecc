//! Seed default delivery settings and zone bands.
//!
//! Existing settings are never overwritten except the home location when it
//! is passed explicitly. Zones are only inserted into an empty table.

use rust_decimal::Decimal;
use serde_json::{Value as JsonValue, json};
use tracing::info;

use pizzeria_core::Coordinate;
use pizzeria_storefront::db::{NewZone, SettingsRepository, ZoneRepository};
use pizzeria_storefront::delivery::{DEFAULT_MAX_RADIUS_KM, keys};

/// Settings inserted when absent.
fn default_settings() -> Vec<(&'static str, JsonValue)> {
    vec![
        (keys::GEOLOCATION_ENABLED, json!(false)),
        (keys::MAX_RADIUS_KM, json!(DEFAULT_MAX_RADIUS_KM)),
        (keys::FALLBACK_FEE, json!("5.00")),
        (keys::CURRENCY, json!("BRL")),
    ]
}

/// Bands covering `[0, 15]` km with no gaps.
fn default_zones() -> Vec<NewZone> {
    [
        (0.0, 3.0, 500, 30, "Centro", "#4caf50"),
        (3.0, 6.0, 800, 40, "Intermediária", "#ffc107"),
        (6.0, 10.0, 1200, 50, "Distante", "#ff9800"),
        (10.0, 15.0, 1800, 60, "Limite", "#f44336"),
    ]
    .into_iter()
    .map(|(min, max, fee_cents, eta, name, color)| NewZone {
        min_distance_km: min,
        max_distance_km: max,
        fee: Decimal::new(fee_cents, 2),
        estimated_time_minutes: eta,
        display_name: name.to_string(),
        display_color: color.to_string(),
    })
    .collect()
}

/// Seed settings and zones.
///
/// When `home` is given, the home coordinates are written and geolocation is
/// switched on.
///
/// # Errors
///
/// Returns an error if `home` is not a valid coordinate or a database
/// operation fails.
pub async fn run(
    home: Option<(f64, f64)>,
    home_address: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some((lat, lon)) = home {
        Coordinate::try_new(lat, lon)?;
    }

    let (_config, pool) = super::connect().await?;
    let settings = SettingsRepository::new(pool.clone());
    let zones = ZoneRepository::new(pool);

    for (key, value) in default_settings() {
        if settings.set_if_absent(key, &value).await? {
            info!(key, %value, "Setting inserted");
        }
    }

    if let Some((lat, lon)) = home {
        settings.set(keys::HOME_LATITUDE, &json!(lat)).await?;
        settings.set(keys::HOME_LONGITUDE, &json!(lon)).await?;
        settings.set(keys::GEOLOCATION_ENABLED, &json!(true)).await?;
        info!(lat, lon, "Home location set, geolocation enabled");
    }
    if let Some(address) = home_address {
        settings.set(keys::HOME_ADDRESS, &json!(address)).await?;
    }

    if zones.count().await? == 0 {
        for zone in default_zones() {
            let created = zones.insert(&zone).await?;
            info!(zone_id = %created.id, name = %created.display_name, "Zone inserted");
        }
    } else {
        info!("Zones already present, skipping default bands");
    }

    info!("Seeding complete!");
    Ok(())
}
