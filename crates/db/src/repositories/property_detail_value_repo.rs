//! Repository for `property_detail_values` and the multi-option junction
//! `property_detail_value_options`.
//!
//! Exactly one value row exists per (property, group detail); it is
//! created lazily by [`PropertyDetailValueRepo::get_or_create`].

use std::collections::HashMap;

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tripwix_core::detail_value::StoredValue;
use tripwix_core::types::DbId;

use crate::models::property_detail_value::PropertyDetailValue;
use crate::repositories::PropertyRepo;

const COLUMNS: &str = "\
    id, property_id, property_group_detail_id, value_text, value_boolean, \
    value_description, value_number, value_integer, value_date, value_time, \
    value_translations, detail_option_id, created_at, updated_at";

/// Provides data access for property detail values.
pub struct PropertyDetailValueRepo;

impl PropertyDetailValueRepo {
    /// Fetch the value row for (property, binding), inserting an empty one
    /// if it does not exist yet.
    pub async fn get_or_create(
        conn: &mut PgConnection,
        property_id: DbId,
        binding_id: DbId,
    ) -> Result<PropertyDetailValue, sqlx::Error> {
        let query = format!(
            "INSERT INTO property_detail_values (property_id, property_group_detail_id) \
             VALUES ($1, $2) \
             ON CONFLICT (property_id, property_group_detail_id) \
             DO UPDATE SET property_id = EXCLUDED.property_id \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PropertyDetailValue>(&query)
            .bind(property_id)
            .bind(binding_id)
            .fetch_one(conn)
            .await
    }

    /// Write every typed column of `stored` into the row and replace its
    /// option set.
    pub async fn write(
        conn: &mut PgConnection,
        value_id: DbId,
        stored: &StoredValue,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE property_detail_values SET \
                 value_text = $2, value_boolean = $3, value_description = $4, \
                 value_number = $5, value_integer = $6, value_date = $7, \
                 value_time = $8, value_translations = $9, detail_option_id = $10 \
             WHERE id = $1",
        )
        .bind(value_id)
        .bind(&stored.value_text)
        .bind(stored.value_boolean)
        .bind(&stored.value_description)
        .bind(stored.value_number)
        .bind(stored.value_integer)
        .bind(stored.value_date)
        .bind(stored.value_time)
        .bind(Json(&stored.value_translations))
        .bind(stored.detail_option_id)
        .execute(&mut *conn)
        .await?;

        sqlx::query("DELETE FROM property_detail_value_options WHERE value_id = $1")
            .bind(value_id)
            .execute(&mut *conn)
            .await?;

        if !stored.detail_option_ids.is_empty() {
            sqlx::query(
                "INSERT INTO property_detail_value_options (value_id, detail_option_id) \
                 SELECT $1, UNNEST($2::BIGINT[]) \
                 ON CONFLICT (value_id, detail_option_id) DO NOTHING",
            )
            .bind(value_id)
            .bind(&stored.detail_option_ids)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Persist a batch of values for one property, and optionally replace
    /// its related properties, in a single transaction.
    pub async fn save_values(
        pool: &PgPool,
        property_id: DbId,
        values: &[(DbId, StoredValue)],
        related: Option<&[DbId]>,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        for (binding_id, stored) in values {
            let row = Self::get_or_create(&mut *tx, property_id, *binding_id).await?;
            Self::write(&mut *tx, row.id, stored).await?;
        }
        if let Some(related) = related {
            PropertyRepo::replace_related(&mut *tx, property_id, related).await?;
        }

        tx.commit().await?;
        tracing::debug!(property_id, count = values.len(), "Property detail values saved");
        Ok(())
    }

    /// All stored values of a property, keyed by group-detail id.
    pub async fn list_for_property(
        pool: &PgPool,
        property_id: DbId,
    ) -> Result<HashMap<DbId, StoredValue>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM property_detail_values WHERE property_id = $1 ORDER BY id"
        );
        let rows = sqlx::query_as::<_, PropertyDetailValue>(&query)
            .bind(property_id)
            .fetch_all(pool)
            .await?;

        let links: Vec<(DbId, DbId)> = sqlx::query_as(
            "SELECT o.value_id, o.detail_option_id \
             FROM property_detail_value_options o \
             JOIN property_detail_values v ON v.id = o.value_id \
             WHERE v.property_id = $1 \
             ORDER BY o.value_id, o.detail_option_id",
        )
        .bind(property_id)
        .fetch_all(pool)
        .await?;

        let mut options: HashMap<DbId, Vec<DbId>> = HashMap::new();
        for (value_id, option_id) in links {
            options.entry(value_id).or_default().push(option_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let ids = options.remove(&row.id).unwrap_or_default();
                (row.property_group_detail_id, row.into_stored(ids))
            })
            .collect())
    }

    pub async fn count_for_property(pool: &PgPool, property_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM property_detail_values WHERE property_id = $1",
        )
        .bind(property_id)
        .fetch_one(pool)
        .await
    }
}
