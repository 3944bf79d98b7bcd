//! Repository for `properties` and `property_related`.
//!
//! The slug is derived from location, tagline and reference and is
//! rewritten on every save.

use sqlx::{PgConnection, PgPool};
use tripwix_core::slug::property_slug;
use tripwix_core::types::DbId;

use crate::models::property::{CreateProperty, Property, UpdateProperty};

const COLUMNS: &str = "\
    id, property_group_id, reference, tagline, location, slug, created_at, updated_at";

/// Provides data access for properties.
pub struct PropertyRepo;

impl PropertyRepo {
    /// Insert a property and its related links in one transaction.
    pub async fn create(pool: &PgPool, input: &CreateProperty) -> Result<Property, sqlx::Error> {
        let slug = property_slug(
            input.location.as_deref(),
            input.tagline.as_deref(),
            &input.reference,
        );

        let mut tx = pool.begin().await?;
        let query = format!(
            "INSERT INTO properties (property_group_id, reference, tagline, location, slug) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let property = sqlx::query_as::<_, Property>(&query)
            .bind(input.property_group_id)
            .bind(&input.reference)
            .bind(&input.tagline)
            .bind(&input.location)
            .bind(&slug)
            .fetch_one(&mut *tx)
            .await?;

        Self::replace_related(&mut *tx, property.id, &input.related).await?;
        tx.commit().await?;

        tracing::debug!(property_id = property.id, slug = %property.slug, "Property inserted");
        Ok(property)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Property>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM properties WHERE id = $1");
        sqlx::query_as::<_, Property>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Property>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM properties WHERE slug = $1");
        sqlx::query_as::<_, Property>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Property>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM properties WHERE id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, Property>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update and regenerate the slug from the merged row.
    ///
    /// Returns `None` if no property with the given ID exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProperty,
    ) -> Result<Option<Property>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM properties WHERE id = $1 FOR UPDATE");
        let Some(mut property) = sqlx::query_as::<_, Property>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        if let Some(reference) = &input.reference {
            property.reference = reference.clone();
        }
        if input.tagline.is_some() {
            property.tagline = input.tagline.clone();
        }
        if input.location.is_some() {
            property.location = input.location.clone();
        }
        let slug = property.expected_slug();

        let query = format!(
            "UPDATE properties SET reference = $2, tagline = $3, location = $4, slug = $5 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let property = sqlx::query_as::<_, Property>(&query)
            .bind(id)
            .bind(&property.reference)
            .bind(&property.tagline)
            .bind(&property.location)
            .bind(&slug)
            .fetch_one(&mut *tx)
            .await?;

        if let Some(related) = &input.related {
            Self::replace_related(&mut *tx, id, related).await?;
        }
        tx.commit().await?;

        Ok(Some(property))
    }

    // -----------------------------------------------------------------------
    // Related properties
    // -----------------------------------------------------------------------

    pub async fn list_related(pool: &PgPool, id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT related_id FROM property_related WHERE property_id = $1 ORDER BY related_id",
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }

    /// Replace the related set. Self references are skipped.
    pub async fn replace_related(
        conn: &mut PgConnection,
        id: DbId,
        related: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM property_related WHERE property_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        let related: Vec<DbId> = related.iter().copied().filter(|r| *r != id).collect();
        if related.is_empty() {
            return Ok(());
        }
        sqlx::query(
            "INSERT INTO property_related (property_id, related_id) \
             SELECT $1, UNNEST($2::BIGINT[]) \
             ON CONFLICT (property_id, related_id) DO NOTHING",
        )
        .bind(id)
        .bind(&related)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
