//! Delivery API used by checkout.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use pizzeria_core::{DeliveryZone, ZoneId};

use crate::delivery::{DeliveryDecision, ResolveInput, ZoneStore};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Resolve delivery availability, fee and ETA for an address or coordinate.
///
/// Malformed bodies and missing input are answered with `400` and a decision
/// of method `error`; every other outcome is a `200` decision.
#[instrument(skip_all)]
pub async fn resolve(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ResolveInput>, JsonRejection>,
) -> Result<Json<DeliveryDecision>> {
    let Json(input) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let decision = state.resolver().resolve(input).await?;
    Ok(Json(decision))
}

/// One row of the checkout fee table.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneView {
    pub id: ZoneId,
    pub min_distance_km: f64,
    pub max_distance_km: f64,
    pub fee: Decimal,
    pub eta_minutes: u32,
    pub name: String,
    pub color: String,
}

impl From<DeliveryZone> for ZoneView {
    fn from(zone: DeliveryZone) -> Self {
        Self {
            id: zone.id,
            min_distance_km: zone.min_distance_km,
            max_distance_km: zone.max_distance_km,
            fee: zone.fee,
            eta_minutes: zone.estimated_time_minutes,
            name: zone.display_name,
            color: zone.display_color,
        }
    }
}

/// Active delivery zones, nearest band first.
#[instrument(skip_all)]
pub async fn zones(State(state): State<AppState>) -> Result<Json<Vec<ZoneView>>> {
    let zones = state.zones().active_zones().await?;
    Ok(Json(zones.into_iter().map(ZoneView::from).collect()))
}
