//! Delivery zone repository.
//!
//! Zones are maintained by the back office. The storefront only reads them,
//! apart from the seed path used by the CLI.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use pizzeria_core::{DeliveryZone, ZoneId};

use super::RepositoryError;
use crate::delivery::ZoneStore;

/// Row shape of `storefront.delivery_zone`.
#[derive(Debug, sqlx::FromRow)]
struct ZoneRow {
    id: i32,
    min_distance_km: f64,
    max_distance_km: f64,
    fee: Decimal,
    estimated_time_minutes: i32,
    display_name: String,
    display_color: String,
    active: bool,
}

impl TryFrom<ZoneRow> for DeliveryZone {
    type Error = RepositoryError;

    fn try_from(row: ZoneRow) -> Result<Self, Self::Error> {
        let estimated_time_minutes = u32::try_from(row.estimated_time_minutes).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "zone {} has negative estimated time {}",
                row.id, row.estimated_time_minutes
            ))
        })?;

        Ok(Self {
            id: ZoneId::new(row.id),
            min_distance_km: row.min_distance_km,
            max_distance_km: row.max_distance_km,
            fee: row.fee,
            estimated_time_minutes,
            display_name: row.display_name,
            display_color: row.display_color,
            active: row.active,
        })
    }
}

/// A zone to be inserted (the database assigns the id).
#[derive(Debug, Clone)]
pub struct NewZone {
    pub min_distance_km: f64,
    pub max_distance_km: f64,
    pub fee: Decimal,
    pub estimated_time_minutes: u32,
    pub display_name: String,
    pub display_color: String,
}

/// Repository for delivery zone database operations.
#[derive(Clone)]
pub struct ZoneRepository {
    pool: PgPool,
}

impl ZoneRepository {
    /// Create a new zone repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all zones, active or not, ordered by band start.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Unavailable` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row cannot be converted.
    pub async fn list_all(&self) -> Result<Vec<DeliveryZone>, RepositoryError> {
        let rows: Vec<ZoneRow> = sqlx::query_as(
            r"
            SELECT id, min_distance_km, max_distance_km, fee, estimated_time_minutes,
                   display_name, display_color, active
            FROM storefront.delivery_zone
            ORDER BY min_distance_km ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DeliveryZone::try_from).collect()
    }

    /// Count zones (active or not).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Unavailable` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM storefront.delivery_zone")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Insert a new active zone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Unavailable` if the insert fails (including the
    /// `min_distance_km <= max_distance_km` check constraint).
    pub async fn insert(&self, zone: &NewZone) -> Result<DeliveryZone, RepositoryError> {
        let estimated_time_minutes = i32::try_from(zone.estimated_time_minutes).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "estimated time {} does not fit the column",
                zone.estimated_time_minutes
            ))
        })?;

        let row: ZoneRow = sqlx::query_as(
            r"
            INSERT INTO storefront.delivery_zone
                (min_distance_km, max_distance_km, fee, estimated_time_minutes,
                 display_name, display_color, active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING id, min_distance_km, max_distance_km, fee, estimated_time_minutes,
                      display_name, display_color, active
            ",
        )
        .bind(zone.min_distance_km)
        .bind(zone.max_distance_km)
        .bind(zone.fee)
        .bind(estimated_time_minutes)
        .bind(&zone.display_name)
        .bind(&zone.display_color)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }
}

#[async_trait]
impl ZoneStore for ZoneRepository {
    #[instrument(skip(self))]
    async fn active_zones(&self) -> Result<Vec<DeliveryZone>, RepositoryError> {
        let rows: Vec<ZoneRow> = sqlx::query_as(
            r"
            SELECT id, min_distance_km, max_distance_km, fee, estimated_time_minutes,
                   display_name, display_color, active
            FROM storefront.delivery_zone
            WHERE active = TRUE
            ORDER BY min_distance_km ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DeliveryZone::try_from).collect()
    }

    #[instrument(skip(self), fields(zone_id = %id))]
    async fn zone_by_id(&self, id: ZoneId) -> Result<Option<DeliveryZone>, RepositoryError> {
        let row: Option<ZoneRow> = sqlx::query_as(
            r"
            SELECT id, min_distance_km, max_distance_km, fee, estimated_time_minutes,
                   display_name, display_color, active
            FROM storefront.delivery_zone
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DeliveryZone::try_from).transpose()
    }
}
