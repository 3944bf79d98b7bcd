//! Repositories for `detail_categories`, `details` and `detail_options`.

use sqlx::PgPool;
use tripwix_core::types::DbId;

use crate::models::detail::{
    CreateDetail, CreateDetailCategory, CreateDetailOption, Detail, DetailCategory, DetailOption,
    UpdateDetail,
};

const CATEGORY_COLUMNS: &str = "id, name, slug, sort_order, created_at, updated_at";

const DETAIL_COLUMNS: &str = "\
    id, category_id, name, slug, detail_type, unit, help_text, created_at, updated_at";

const OPTION_COLUMNS: &str = "id, detail_id, name, slug, sort_order, created_at, updated_at";

/// Provides data access for detail categories.
pub struct DetailCategoryRepo;

impl DetailCategoryRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateDetailCategory,
    ) -> Result<DetailCategory, sqlx::Error> {
        let query = format!(
            "INSERT INTO detail_categories (name, slug, sort_order) \
             VALUES ($1, $2, COALESCE($3, 0)) \
             RETURNING {CATEGORY_COLUMNS}"
        );
        sqlx::query_as::<_, DetailCategory>(&query)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(input.sort_order)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<DetailCategory>, sqlx::Error> {
        let query = format!("SELECT {CATEGORY_COLUMNS} FROM detail_categories WHERE id = $1");
        sqlx::query_as::<_, DetailCategory>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All categories in tab order.
    pub async fn list(pool: &PgPool) -> Result<Vec<DetailCategory>, sqlx::Error> {
        let query =
            format!("SELECT {CATEGORY_COLUMNS} FROM detail_categories ORDER BY sort_order, name");
        sqlx::query_as::<_, DetailCategory>(&query)
            .fetch_all(pool)
            .await
    }
}

/// Provides data access for detail definitions and their options.
pub struct DetailRepo;

impl DetailRepo {
    pub async fn create(pool: &PgPool, input: &CreateDetail) -> Result<Detail, sqlx::Error> {
        let query = format!(
            "INSERT INTO details (category_id, name, slug, detail_type, unit, help_text) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {DETAIL_COLUMNS}"
        );
        let detail = sqlx::query_as::<_, Detail>(&query)
            .bind(input.category_id)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(input.detail_type.as_str())
            .bind(&input.unit)
            .bind(&input.help_text)
            .fetch_one(pool)
            .await?;
        tracing::debug!(detail_id = detail.id, slug = %detail.slug, "Detail inserted");
        Ok(detail)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Detail>, sqlx::Error> {
        let query = format!("SELECT {DETAIL_COLUMNS} FROM details WHERE id = $1");
        sqlx::query_as::<_, Detail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All details, optionally restricted to one category.
    pub async fn list(
        pool: &PgPool,
        category_id: Option<DbId>,
    ) -> Result<Vec<Detail>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS} FROM details \
             WHERE ($1::BIGINT IS NULL OR category_id = $1) \
             ORDER BY category_id, name"
        );
        sqlx::query_as::<_, Detail>(&query)
            .bind(category_id)
            .fetch_all(pool)
            .await
    }

    /// Update a detail. Returns `None` if no detail with the given ID exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDetail,
    ) -> Result<Option<Detail>, sqlx::Error> {
        let query = format!(
            "UPDATE details SET \
                 category_id = COALESCE($2, category_id), \
                 name = COALESCE($3, name), \
                 detail_type = COALESCE($4, detail_type), \
                 unit = COALESCE($5, unit), \
                 help_text = COALESCE($6, help_text) \
             WHERE id = $1 \
             RETURNING {DETAIL_COLUMNS}"
        );
        sqlx::query_as::<_, Detail>(&query)
            .bind(id)
            .bind(input.category_id)
            .bind(&input.name)
            .bind(input.detail_type.map(|t| t.as_str()))
            .bind(&input.unit)
            .bind(&input.help_text)
            .fetch_optional(pool)
            .await
    }

    /// Whether any property stores a value for this detail.
    pub async fn has_values(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                 SELECT 1 FROM property_detail_values v \
                 JOIN property_group_details pgd ON pgd.id = v.property_group_detail_id \
                 WHERE pgd.detail_id = $1 \
             )",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Options
    // -----------------------------------------------------------------------

    pub async fn create_option(
        pool: &PgPool,
        detail_id: DbId,
        input: &CreateDetailOption,
    ) -> Result<DetailOption, sqlx::Error> {
        let query = format!(
            "INSERT INTO detail_options (detail_id, name, slug, sort_order) \
             VALUES ($1, $2, $3, COALESCE($4, 0)) \
             RETURNING {OPTION_COLUMNS}"
        );
        sqlx::query_as::<_, DetailOption>(&query)
            .bind(detail_id)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(input.sort_order)
            .fetch_one(pool)
            .await
    }

    pub async fn list_options(
        pool: &PgPool,
        detail_id: DbId,
    ) -> Result<Vec<DetailOption>, sqlx::Error> {
        let query = format!(
            "SELECT {OPTION_COLUMNS} FROM detail_options \
             WHERE detail_id = $1 ORDER BY sort_order, name"
        );
        sqlx::query_as::<_, DetailOption>(&query)
            .bind(detail_id)
            .fetch_all(pool)
            .await
    }

    /// Options for many details in one round trip.
    pub async fn list_options_for(
        pool: &PgPool,
        detail_ids: &[DbId],
    ) -> Result<Vec<DetailOption>, sqlx::Error> {
        let query = format!(
            "SELECT {OPTION_COLUMNS} FROM detail_options \
             WHERE detail_id = ANY($1) ORDER BY detail_id, sort_order, name"
        );
        sqlx::query_as::<_, DetailOption>(&query)
            .bind(detail_ids)
            .fetch_all(pool)
            .await
    }
}
