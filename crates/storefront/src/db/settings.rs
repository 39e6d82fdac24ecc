//! Settings database operations.
//!
//! Settings are global key/value pairs with JSONB values. The delivery engine
//! reads every key under the `delivery.` prefix in a single query.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::instrument;

use super::RepositoryError;
use crate::delivery::SettingsStore;

/// Prefix shared by all delivery settings keys.
pub const DELIVERY_PREFIX: &str = "delivery.";

/// Repository for the `storefront.settings` table.
#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get all settings whose key starts with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Unavailable` if the query fails.
    pub async fn get_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<HashMap<String, JsonValue>, RepositoryError> {
        let pattern = format!("{prefix}%");
        let rows: Vec<(String, JsonValue)> = sqlx::query_as(
            r"
            SELECT key, value FROM storefront.settings
            WHERE key LIKE $1
            ",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Set a setting value, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Unavailable` if the query fails.
    pub async fn set(&self, key: &str, value: &JsonValue) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            ",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Set a setting value only if the key does not exist yet.
    ///
    /// Returns `true` if the value was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Unavailable` if the query fails.
    pub async fn set_if_absent(&self, key: &str, value: &JsonValue) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO storefront.settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO NOTHING
            ",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SettingsStore for SettingsRepository {
    #[instrument(skip(self))]
    async fn delivery_settings(&self) -> Result<HashMap<String, JsonValue>, RepositoryError> {
        self.get_by_prefix(DELIVERY_PREFIX).await
    }
}
