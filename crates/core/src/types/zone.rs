//! Delivery zones (distance bands) and zone matching.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ZoneId;

/// A closed distance band `[min_distance_km, max_distance_km]` with its fee and ETA.
///
/// Zones are edited by the back office; the resolver only reads active zones
/// ordered by ascending `min_distance_km`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryZone {
    pub id: ZoneId,
    pub min_distance_km: f64,
    pub max_distance_km: f64,
    pub fee: Decimal,
    pub estimated_time_minutes: u32,
    pub display_name: String,
    /// CSS color used by the checkout fee table (e.g. `#4caf50`).
    pub display_color: String,
    pub active: bool,
}

impl DeliveryZone {
    /// Whether `distance_km` falls inside this band (both ends inclusive).
    #[must_use]
    pub fn contains(&self, distance_km: f64) -> bool {
        self.min_distance_km <= distance_km && distance_km <= self.max_distance_km
    }
}

/// Return the first zone whose band contains `distance_km`.
///
/// `zones` must already be filtered to active zones and sorted ascending by
/// `min_distance_km`; when bands overlap the earlier zone wins. No match is a
/// normal outcome and the caller applies the flat fallback fee.
#[must_use]
pub fn match_zone(distance_km: f64, zones: &[DeliveryZone]) -> Option<&DeliveryZone> {
    zones.iter().find(|zone| zone.contains(distance_km))
}

/// A problem found in a zone set by [`analyze_coverage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoverageIssue {
    /// `min_distance_km > max_distance_km`; the zone can never match.
    Inverted { zone: ZoneId },
    /// No zone covers `(from_km, to_km)`; distances there get the fallback fee.
    Gap { from_km: f64, to_km: f64 },
    /// `shadowed` starts inside distances already claimed by `winner`, the
    /// furthest-reaching earlier band. Bands that only touch at an edge are fine.
    Overlap {
        winner: ZoneId,
        shadowed: ZoneId,
        from_km: f64,
        to_km: f64,
    },
}

/// Check a zone set for inverted bands, gaps within `[0, max_radius_km]` and overlaps.
///
/// Inactive zones are ignored. The zones are sorted internally, so any order is
/// accepted. Overlaps are legal (first match wins) but are reported so the
/// back office can see which band shadows which.
#[must_use]
pub fn analyze_coverage(zones: &[DeliveryZone], max_radius_km: f64) -> Vec<CoverageIssue> {
    let mut issues = Vec::new();

    let mut active: Vec<&DeliveryZone> = zones.iter().filter(|z| z.active).collect();
    for zone in &active {
        if zone.min_distance_km > zone.max_distance_km {
            issues.push(CoverageIssue::Inverted { zone: zone.id });
        }
    }
    active.retain(|z| z.min_distance_km <= z.max_distance_km);
    active.sort_by(|a, b| {
        a.min_distance_km
            .total_cmp(&b.min_distance_km)
            .then(a.id.as_i32().cmp(&b.id.as_i32()))
    });

    // Furthest distance covered so far, and the zone that reached it.
    let mut covered_to = 0.0_f64;
    let mut reach: Option<&DeliveryZone> = None;

    for zone in active {
        if zone.min_distance_km >= max_radius_km && reach.is_some() {
            break;
        }
        match reach {
            Some(prev) if zone.min_distance_km < covered_to => {
                issues.push(CoverageIssue::Overlap {
                    winner: prev.id,
                    shadowed: zone.id,
                    from_km: zone.min_distance_km,
                    to_km: covered_to.min(zone.max_distance_km),
                });
            }
            _ if zone.min_distance_km > covered_to => {
                issues.push(CoverageIssue::Gap {
                    from_km: covered_to,
                    to_km: zone.min_distance_km.min(max_radius_km),
                });
            }
            _ => {}
        }
        if reach.is_none() || zone.max_distance_km > covered_to {
            covered_to = covered_to.max(zone.max_distance_km);
            reach = Some(zone);
        }
    }

    if covered_to < max_radius_km {
        issues.push(CoverageIssue::Gap {
            from_km: covered_to,
            to_km: max_radius_km,
        });
    }

    issues
}
