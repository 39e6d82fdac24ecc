//! Delivery zone inspection commands.

use pizzeria_core::{CoverageIssue, DeliveryZone, analyze_coverage};
use pizzeria_storefront::db::{SettingsRepository, ZoneRepository};
use pizzeria_storefront::delivery::{Configuration, SettingsStore};

/// Print every zone, active or not, nearest band first.
///
/// # Errors
///
/// Returns an error if the database cannot be reached.
pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let (_config, pool) = super::connect().await?;
    let zones = ZoneRepository::new(pool).list_all().await?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "{:>4}  {:>7}  {:>7}  {:>8}  {:>5}  {:<8}  {:<7}  name",
            "id", "min_km", "max_km", "fee", "eta", "color", "active"
        );
        for zone in &zones {
            println!("{}", format_zone(zone));
        }
        println!("{} zone(s)", zones.len());
    }
    Ok(())
}

/// Check active zones against the configured radius.
///
/// # Errors
///
/// Returns an error if the database cannot be reached or any coverage issue
/// is found, so the command can gate deployments.
pub async fn check() -> Result<(), Box<dyn std::error::Error>> {
    let (config, pool) = super::connect().await?;
    let settings = SettingsRepository::new(pool.clone()).delivery_settings().await?;
    let delivery = Configuration::from_settings(&settings, config.geocoding.fallback_api_key.as_ref());
    let zones = ZoneRepository::new(pool).list_all().await?;

    let issues = analyze_coverage(&zones, delivery.max_radius_km);

    #[allow(clippy::print_stdout)]
    {
        println!(
            "Checking {} zone(s) against a {} km radius",
            zones.iter().filter(|z| z.active).count(),
            delivery.max_radius_km
        );
        for issue in &issues {
            println!("  - {}", describe(issue));
        }
    }

    if issues.is_empty() {
        tracing::info!("Zone coverage OK");
        Ok(())
    } else {
        Err(format!("{} coverage issue(s) found", issues.len()).into())
    }
}

fn format_zone(zone: &DeliveryZone) -> String {
    format!(
        "{:>4}  {:>7.2}  {:>7.2}  {:>8}  {:>5}  {:<8}  {:<7}  {}",
        zone.id.as_i32(),
        zone.min_distance_km,
        zone.max_distance_km,
        zone.fee.to_string(),
        zone.estimated_time_minutes,
        zone.display_color,
        zone.active,
        zone.display_name
    )
}

fn describe(issue: &CoverageIssue) -> String {
    match issue {
        CoverageIssue::Inverted { zone } => {
            format!("zone {zone} has min distance above max distance and never matches")
        }
        CoverageIssue::Gap { from_km, to_km } => {
            format!("no zone covers {from_km:.2}-{to_km:.2} km (fallback fee applies)")
        }
        CoverageIssue::Overlap {
            winner,
            shadowed,
            from_km,
            to_km,
        } => format!("zone {shadowed} is shadowed by zone {winner} over {from_km:.2}-{to_km:.2} km"),
    }
}
