//! End-to-end resolver behaviour against in-memory stores and a scripted
//! geocoder.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use pizzeria_core::{Coordinate, GeocodeCacheEntry, ZoneId};
use pizzeria_integration_tests::{
    FAR, HOME, Harness, InMemorySettings, NEAR, TEST_KEY, standard_zones, zone,
};
use pizzeria_storefront::delivery::{
    FALLBACK_ETA_MINUTES, FailureReason, ResolutionMethod, ResolveError, ResolveInput, keys,
};
use pizzeria_storefront::geocoding::GeocodeError;

const ADDRESS: &str = "Rua Vergueiro, 1000";

fn fee(cents: i64) -> Option<Decimal> {
    Some(Decimal::new(cents, 2))
}

// ============================================================================
// Feature flag
// ============================================================================

#[tokio::test]
async fn test_disabled_geolocation_returns_fallback_without_io() {
    let settings = InMemorySettings::enabled();
    settings.set(keys::GEOLOCATION_ENABLED, json!(false));
    settings.set(keys::FALLBACK_FEE, json!("7.50"));
    let h = Harness::build(settings, standard_zones(), None);
    h.geocoder.knows(ADDRESS, NEAR);

    for input in [ResolveInput::address(ADDRESS), ResolveInput::coordinate(FAR)] {
        let decision = h.resolver.resolve(input).await.unwrap();
        assert_eq!(decision.method, ResolutionMethod::Fallback);
        assert!(decision.deliverable);
        assert_eq!(decision.fee, fee(750));
        assert_eq!(decision.eta_minutes, Some(FALLBACK_ETA_MINUTES));
        assert_eq!(decision.zone_id, None);
        assert_eq!(decision.distance_km, None);
    }

    assert_eq!(h.geocoder.calls(), 0);
    assert_eq!(h.cache.finds(), 0);
    assert_eq!(h.cache.upserts(), 0);
    assert_eq!(h.zones.list_calls(), 0);
}

#[tokio::test]
async fn test_enabled_without_home_behaves_as_disabled() {
    let settings = InMemorySettings::enabled();
    settings.remove(keys::HOME_LATITUDE);
    let h = Harness::build(settings, standard_zones(), None);

    let decision = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();
    assert_eq!(decision.method, ResolutionMethod::Fallback);
    assert_eq!(h.geocoder.calls(), 0);
}

#[tokio::test]
async fn test_configuration_is_read_on_every_call() {
    let h = Harness::new();
    h.resolver.resolve(ResolveInput::coordinate(NEAR)).await.unwrap();

    h.settings.set(keys::GEOLOCATION_ENABLED, json!("false"));
    let decision = h.resolver.resolve(ResolveInput::coordinate(NEAR)).await.unwrap();

    assert_eq!(decision.method, ResolutionMethod::Fallback);
    assert_eq!(h.settings.reads(), 2);
}

#[tokio::test]
async fn test_explicit_snapshot_skips_settings_read() {
    let h = Harness::new();
    let mut config = h.resolver.load_configuration().await;
    config.max_radius_km = 1.0;

    let decision = h
        .resolver
        .resolve_with(&config, ResolveInput::coordinate(NEAR))
        .await
        .unwrap();

    assert_eq!(decision.method, ResolutionMethod::OutOfRange);
    assert_eq!(h.settings.reads(), 1);
}

// ============================================================================
// Input
// ============================================================================

#[tokio::test]
async fn test_missing_input_is_rejected() {
    let h = Harness::new();

    let err = h.resolver.resolve(ResolveInput::default()).await.unwrap_err();
    assert!(matches!(err, ResolveError::InvalidInput(_)));

    let err = h.resolver.resolve(ResolveInput::address("  \t")).await.unwrap_err();
    assert!(matches!(err, ResolveError::InvalidInput(_)));

    assert_eq!(h.geocoder.calls(), 0);
}

#[tokio::test]
async fn test_invalid_coordinate_is_rejected() {
    let h = Harness::new();
    let err = h
        .resolver
        .resolve(ResolveInput::coordinate(Coordinate::new(-23.5, 200.0)))
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::InvalidInput(_)));
}

// ============================================================================
// Coordinates supplied directly
// ============================================================================

#[tokio::test]
async fn test_coordinate_in_first_band_matches_zone() {
    let h = Harness::new();

    let decision = h.resolver.resolve(ResolveInput::coordinate(NEAR)).await.unwrap();

    assert_eq!(decision.method, ResolutionMethod::ZoneMatch);
    assert!(decision.deliverable);
    assert_eq!(decision.zone_id, Some(ZoneId::new(1)));
    assert_eq!(decision.fee, fee(600));
    assert_eq!(decision.eta_minutes, Some(30));
    let distance = decision.distance_km.unwrap();
    assert!((1.4..1.6).contains(&distance), "distance was {distance}");
    assert_eq!(decision.formatted_address, None);

    // No address text, nothing to key the cache on.
    assert_eq!(h.cache.finds(), 0);
    assert_eq!(h.cache.upserts(), 0);
    assert_eq!(h.geocoder.calls(), 0);
}

#[tokio::test]
async fn test_coordinate_with_address_skips_geocoding_and_caches() {
    let h = Harness::new();

    let decision = h
        .resolver
        .resolve(ResolveInput {
            address_text: Some(ADDRESS.to_string()),
            coordinate: Some(NEAR),
        })
        .await
        .unwrap();

    assert_eq!(decision.method, ResolutionMethod::ZoneMatch);
    assert_eq!(decision.formatted_address.as_deref(), Some(ADDRESS));
    assert_eq!(h.geocoder.calls(), 0);

    let entry = h.cache.get(ADDRESS).unwrap();
    assert_eq!(entry.zone_id, Some(ZoneId::new(1)));
    assert_eq!(entry.coordinate, NEAR);
    assert!(entry.deliverable);
}

#[tokio::test]
async fn test_beyond_radius_is_out_of_range_regardless_of_zones() {
    let h = Harness::build(
        InMemorySettings::enabled(),
        vec![zone(9, 0.0, 100.0, 500, 30)],
        None,
    );

    let decision = h.resolver.resolve(ResolveInput::coordinate(FAR)).await.unwrap();

    assert_eq!(decision.method, ResolutionMethod::OutOfRange);
    assert!(!decision.deliverable);
    assert_eq!(decision.max_radius_km, Some(15.0));
    assert_eq!(decision.fee, None);
    let distance = decision.distance_km.unwrap();
    assert!((distance - 50.0).abs() < 0.5, "distance was {distance}");
    assert_eq!(h.zones.list_calls(), 0);
}

#[tokio::test]
async fn test_distance_equal_to_radius_is_deliverable() {
    let h = Harness::new();
    let mut config = h.resolver.load_configuration().await;
    config.max_radius_km = config.home.distance_to(&NEAR);

    let decision = h
        .resolver
        .resolve_with(&config, ResolveInput::coordinate(NEAR))
        .await
        .unwrap();
    assert_eq!(decision.method, ResolutionMethod::ZoneMatch);
    assert!(decision.deliverable);

    config.max_radius_km = config.home.distance_to(&NEAR) - 1e-6;
    let decision = h
        .resolver
        .resolve_with(&config, ResolveInput::coordinate(NEAR))
        .await
        .unwrap();
    assert_eq!(decision.method, ResolutionMethod::OutOfRange);
}

#[tokio::test]
async fn test_home_itself_is_deliverable() {
    let h = Harness::new();
    let decision = h.resolver.resolve(ResolveInput::coordinate(HOME)).await.unwrap();
    assert_eq!(decision.method, ResolutionMethod::ZoneMatch);
    assert_eq!(decision.distance_km, Some(0.0));
}

#[tokio::test]
async fn test_overlapping_bands_first_match_wins() {
    let h = Harness::build(
        InMemorySettings::enabled(),
        vec![zone(2, 1.0, 8.0, 900, 45), zone(1, 0.0, 5.0, 400, 25)],
        None,
    );

    let decision = h.resolver.resolve(ResolveInput::coordinate(NEAR)).await.unwrap();

    assert_eq!(decision.zone_id, Some(ZoneId::new(1)));
    assert_eq!(decision.fee, fee(400));
}

#[tokio::test]
async fn test_no_matching_band_quotes_fallback_fee() {
    let h = Harness::build(
        InMemorySettings::enabled(),
        vec![zone(1, 3.0, 15.0, 900, 45)],
        None,
    );

    let decision = h.resolver.resolve(ResolveInput::coordinate(NEAR)).await.unwrap();

    assert_eq!(decision.method, ResolutionMethod::Fallback);
    assert!(decision.deliverable);
    assert_eq!(decision.fee, fee(500));
    assert_eq!(decision.eta_minutes, Some(FALLBACK_ETA_MINUTES));
    assert!(decision.distance_km.is_some());
}

// ============================================================================
// Geocoding and the cache
// ============================================================================

#[tokio::test]
async fn test_address_is_geocoded_matched_and_cached() {
    let h = Harness::new();
    h.geocoder.knows(ADDRESS, NEAR);

    let decision = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    assert_eq!(decision.method, ResolutionMethod::ZoneMatch);
    assert_eq!(
        decision.formatted_address.as_deref(),
        Some("Rua Vergueiro, 1000 - São Paulo - SP, Brazil")
    );
    assert_eq!(h.geocoder.calls(), 1);
    assert_eq!(h.cache.upserts(), 1);

    let entry = h.cache.get(ADDRESS).unwrap();
    assert_eq!(entry.zone_id, Some(ZoneId::new(1)));
    assert!(entry.deliverable);
    assert!(entry.distance_km.is_some());
    assert!(Utc::now() - entry.last_verified_at < Duration::minutes(1));
}

#[tokio::test]
async fn test_second_resolution_is_served_from_cache() {
    let h = Harness::new();
    h.geocoder.knows(ADDRESS, NEAR);

    let first = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();
    let second = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    assert_eq!(first.method, ResolutionMethod::ZoneMatch);
    assert_eq!(second.method, ResolutionMethod::Cache);
    assert_eq!(second.fee, first.fee);
    assert_eq!(second.eta_minutes, first.eta_minutes);
    assert_eq!(second.zone_id, first.zone_id);
    assert_eq!(second.formatted_address, first.formatted_address);
    assert_eq!(h.geocoder.calls(), 1);
    // Cache hits do not rewrite the row.
    assert_eq!(h.cache.upserts(), 1);
}

#[tokio::test]
async fn test_cache_hit_reports_current_zone_fee() {
    let h = Harness::new();
    h.geocoder.knows(ADDRESS, NEAR);
    h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    h.zones.update(1, |z| {
        z.fee = Decimal::new(650, 2);
        z.estimated_time_minutes = 35;
    });
    let decision = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    assert_eq!(decision.method, ResolutionMethod::Cache);
    assert_eq!(decision.fee, fee(650));
    assert_eq!(decision.eta_minutes, Some(35));
}

#[tokio::test]
async fn test_stale_entry_triggers_provider_call() {
    let h = Harness::new();
    h.geocoder.knows(ADDRESS, NEAR);
    h.cache.insert(GeocodeCacheEntry {
        address_key: ADDRESS.to_string(),
        formatted_address: "old".to_string(),
        coordinate: NEAR,
        distance_km: Some(1.5),
        zone_id: Some(ZoneId::new(1)),
        deliverable: true,
        last_verified_at: Utc::now() - Duration::days(8),
    });

    let decision = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    assert_eq!(decision.method, ResolutionMethod::ZoneMatch);
    assert_eq!(h.geocoder.calls(), 1);
    let entry = h.cache.get(ADDRESS).unwrap();
    assert_ne!(entry.formatted_address, "old");
    assert!(entry.is_fresh(Utc::now()));
}

#[tokio::test]
async fn test_inactive_cached_zone_forces_re_resolution() {
    let h = Harness::new();
    h.geocoder.knows(ADDRESS, NEAR);
    h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    h.zones.update(1, |z| z.active = false);
    let decision = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    // Nothing else covers 1.5 km, so the fallback fee applies.
    assert_eq!(decision.method, ResolutionMethod::Fallback);
    assert_eq!(h.geocoder.calls(), 2);
    assert_eq!(h.cache.get(ADDRESS).unwrap().zone_id, None);
}

#[tokio::test]
async fn test_deleted_cached_zone_forces_re_resolution() {
    let h = Harness::new();
    h.geocoder.knows(ADDRESS, NEAR);
    h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    h.zones.remove(1);
    h.zones.insert(zone(7, 0.0, 3.0, 550, 25));
    let decision = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    assert_eq!(decision.method, ResolutionMethod::ZoneMatch);
    assert_eq!(decision.zone_id, Some(ZoneId::new(7)));
    assert_eq!(h.geocoder.calls(), 2);
}

#[tokio::test]
async fn test_narrowed_cached_zone_forces_re_resolution() {
    let h = Harness::new();
    h.geocoder.knows(ADDRESS, NEAR);
    h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    h.zones.update(1, |z| z.max_distance_km = 1.0);
    h.zones.update(2, |z| z.min_distance_km = 1.0);
    let decision = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    assert_eq!(decision.method, ResolutionMethod::ZoneMatch);
    assert_eq!(decision.zone_id, Some(ZoneId::new(2)));
    assert_eq!(h.geocoder.calls(), 2);
}

#[tokio::test]
async fn test_cached_fallback_outcome_reuses_coordinates() {
    let h = Harness::build(InMemorySettings::enabled(), Vec::new(), None);
    h.geocoder.knows(ADDRESS, NEAR);

    let first = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();
    assert_eq!(first.method, ResolutionMethod::Fallback);
    let verified_at = h.cache.get(ADDRESS).unwrap().last_verified_at;

    h.zones.insert(zone(1, 0.0, 3.0, 600, 30));
    let second = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    assert_eq!(second.method, ResolutionMethod::ZoneMatch);
    assert_eq!(second.formatted_address, first.formatted_address);
    assert_eq!(h.geocoder.calls(), 1);
    // Reused coordinates keep the original verification time.
    let entry = h.cache.get(ADDRESS).unwrap();
    assert_eq!(entry.zone_id, Some(ZoneId::new(1)));
    assert_eq!(entry.last_verified_at, verified_at);
}

#[tokio::test]
async fn test_out_of_range_address_is_cached_as_not_deliverable() {
    let h = Harness::new();
    h.geocoder.knows(ADDRESS, FAR);

    let decision = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    assert_eq!(decision.method, ResolutionMethod::OutOfRange);
    assert!(!decision.deliverable);
    let entry = h.cache.get(ADDRESS).unwrap();
    assert!(!entry.deliverable);
    assert_eq!(entry.zone_id, None);
    assert!((entry.distance_km.unwrap() - 50.0).abs() < 0.5);

    // Still out of range from the cached coordinates, without a new lookup.
    let again = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();
    assert_eq!(again.method, ResolutionMethod::OutOfRange);
    assert_eq!(h.geocoder.calls(), 1);
}

#[tokio::test]
async fn test_radius_change_applies_to_cached_zone() {
    let h = Harness::new();
    h.geocoder.knows(ADDRESS, NEAR);
    h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    h.settings.set(keys::MAX_RADIUS_KM, json!(1));
    let decision = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    assert_eq!(decision.method, ResolutionMethod::OutOfRange);
    assert_eq!(decision.max_radius_km, Some(1.0));
}

#[tokio::test]
async fn test_same_address_text_is_keyed_exactly() {
    let h = Harness::new();
    h.geocoder.knows(ADDRESS, NEAR);
    h.geocoder.knows("rua vergueiro, 1000", NEAR);

    h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();
    h.resolver
        .resolve(ResolveInput::address("rua vergueiro, 1000"))
        .await
        .unwrap();

    assert_eq!(h.geocoder.calls(), 2);
    assert_eq!(h.cache.len(), 2);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_unknown_address_fails_without_cache_write() {
    let h = Harness::new();

    let decision = h
        .resolver
        .resolve(ResolveInput::address("asdkjh qwe 000"))
        .await
        .unwrap();

    assert_eq!(decision.method, ResolutionMethod::GeocodingFailed);
    assert!(!decision.deliverable);
    assert_eq!(decision.error, Some(FailureReason::AddressNotFound));
    assert_eq!(h.geocoder.calls(), 1);
    assert_eq!(h.cache.upserts(), 0);
    assert!(h.cache.is_empty());
}

#[tokio::test]
async fn test_provider_outage_is_reported_and_not_cached() {
    let h = Harness::new();
    h.geocoder.fails(
        ADDRESS,
        GeocodeError::ProviderUnavailable("connection reset".to_string()),
    );

    let decision = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();
    assert_eq!(decision.error, Some(FailureReason::ProviderUnavailable));
    assert!(h.cache.is_empty());

    // Once the provider recovers the address resolves normally.
    h.geocoder.knows(ADDRESS, NEAR);
    let decision = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();
    assert_eq!(decision.method, ResolutionMethod::ZoneMatch);
    assert_eq!(h.geocoder.calls(), 2);
}

#[tokio::test]
async fn test_missing_credential_fails_without_provider_call() {
    let settings = InMemorySettings::enabled();
    settings.remove(keys::GEOCODING_API_KEY);
    let h = Harness::build(settings, standard_zones(), None);
    h.geocoder.knows(ADDRESS, NEAR);

    let decision = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    assert_eq!(decision.method, ResolutionMethod::GeocodingFailed);
    assert_eq!(decision.error, Some(FailureReason::ConfigurationMissing));
    assert_eq!(h.geocoder.calls(), 0);
    assert!(h.cache.is_empty());

    // Coordinates still work without a credential.
    let decision = h.resolver.resolve(ResolveInput::coordinate(NEAR)).await.unwrap();
    assert_eq!(decision.method, ResolutionMethod::ZoneMatch);
}

#[tokio::test]
async fn test_environment_credential_is_used_when_settings_have_none() {
    let settings = InMemorySettings::enabled();
    settings.remove(keys::GEOCODING_API_KEY);
    let h = Harness::build(settings, standard_zones(), Some(TEST_KEY));
    h.geocoder.knows(ADDRESS, NEAR);

    let decision = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    assert_eq!(decision.method, ResolutionMethod::ZoneMatch);
    assert_eq!(h.geocoder.calls(), 1);
}

#[tokio::test]
async fn test_settings_outage_degrades_to_fallback() {
    let h = Harness::new();
    h.geocoder.knows(ADDRESS, NEAR);
    h.settings.set_failing(true);

    let decision = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    assert_eq!(decision.method, ResolutionMethod::Fallback);
    assert_eq!(decision.fee, fee(500));
    assert_eq!(h.geocoder.calls(), 0);
    assert_eq!(h.cache.finds(), 0);
}

#[tokio::test]
async fn test_zone_outage_degrades_to_fallback_fee() {
    let h = Harness::new();
    h.zones.set_failing(true);

    let decision = h.resolver.resolve(ResolveInput::coordinate(NEAR)).await.unwrap();

    assert_eq!(decision.method, ResolutionMethod::Fallback);
    assert!(decision.deliverable);
    assert_eq!(decision.eta_minutes, Some(FALLBACK_ETA_MINUTES));
    assert!(decision.distance_km.is_some());
}

#[tokio::test]
async fn test_zone_lookup_outage_on_cache_hit_re_resolves() {
    let h = Harness::new();
    h.geocoder.knows(ADDRESS, NEAR);
    h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    h.zones.set_failing(true);
    let decision = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    assert_eq!(decision.method, ResolutionMethod::Fallback);
    assert_eq!(h.zones.lookups(), 1);
    assert_eq!(h.geocoder.calls(), 2);
}

#[tokio::test]
async fn test_cache_outage_forces_live_resolution() {
    let h = Harness::new();
    h.geocoder.knows(ADDRESS, NEAR);
    h.cache.set_failing(true);

    let first = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();
    let second = h.resolver.resolve(ResolveInput::address(ADDRESS)).await.unwrap();

    assert_eq!(first.method, ResolutionMethod::ZoneMatch);
    assert_eq!(second.method, ResolutionMethod::ZoneMatch);
    assert_eq!(h.geocoder.calls(), 2);
    assert_eq!(h.cache.upserts(), 2);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_concurrent_resolutions_of_same_address() {
    let h = Harness::new();
    h.geocoder.knows(ADDRESS, NEAR);

    let (a, b) = tokio::join!(
        h.resolver.resolve(ResolveInput::address(ADDRESS)),
        h.resolver.resolve(ResolveInput::address(ADDRESS)),
    );

    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.fee, b.fee);
    assert_eq!(a.zone_id, b.zone_id);
    assert_eq!(h.cache.len(), 1);
    assert!(h.cache.get(ADDRESS).unwrap().deliverable);
}
