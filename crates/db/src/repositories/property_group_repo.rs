//! Repository for `property_groups` and `property_group_details`.
//!
//! [`PropertyGroupRepo::list_bindings`] assembles the core
//! [`GroupDetail`] view (binding + detail + options) in two queries.

use std::collections::HashMap;

use sqlx::{FromRow, PgPool};
use tripwix_core::detail_type::DetailType;
use tripwix_core::grouping::{DetailDef, GroupDetail, OptionDef};
use tripwix_core::types::DbId;

use crate::models::property_group::{
    BindDetail, CreatePropertyGroup, PropertyGroup, PropertyGroupDetail,
};
use crate::repositories::DetailRepo;

const GROUP_COLUMNS: &str = "id, name, slug, created_at, updated_at";

const BINDING_COLUMNS: &str = "\
    id, property_group_id, detail_id, section, is_required, is_filter, sort_order, \
    created_at, updated_at";

/// Binding joined with its detail definition.
#[derive(Debug, FromRow)]
struct BindingRow {
    binding_id: DbId,
    property_group_id: DbId,
    section: Option<String>,
    is_required: bool,
    is_filter: bool,
    sort_order: i32,
    detail_id: DbId,
    category_id: DbId,
    name: String,
    slug: String,
    detail_type: String,
    unit: Option<String>,
    help_text: Option<String>,
}

/// Provides data access for property groups and their detail bindings.
pub struct PropertyGroupRepo;

impl PropertyGroupRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreatePropertyGroup,
    ) -> Result<PropertyGroup, sqlx::Error> {
        let query = format!(
            "INSERT INTO property_groups (name, slug) VALUES ($1, $2) RETURNING {GROUP_COLUMNS}"
        );
        sqlx::query_as::<_, PropertyGroup>(&query)
            .bind(&input.name)
            .bind(&input.slug)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PropertyGroup>, sqlx::Error> {
        let query = format!("SELECT {GROUP_COLUMNS} FROM property_groups WHERE id = $1");
        sqlx::query_as::<_, PropertyGroup>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Bind a detail to a group, or update the existing binding.
    pub async fn bind_detail(
        pool: &PgPool,
        group_id: DbId,
        input: &BindDetail,
    ) -> Result<PropertyGroupDetail, sqlx::Error> {
        let query = format!(
            "INSERT INTO property_group_details \
                 (property_group_id, detail_id, section, is_required, is_filter, sort_order) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 0)) \
             ON CONFLICT (property_group_id, detail_id) DO UPDATE SET \
                 section = EXCLUDED.section, \
                 is_required = EXCLUDED.is_required, \
                 is_filter = EXCLUDED.is_filter, \
                 sort_order = EXCLUDED.sort_order \
             RETURNING {BINDING_COLUMNS}"
        );
        sqlx::query_as::<_, PropertyGroupDetail>(&query)
            .bind(group_id)
            .bind(input.detail_id)
            .bind(&input.section)
            .bind(input.is_required)
            .bind(input.is_filter)
            .bind(input.sort_order)
            .fetch_one(pool)
            .await
    }

    /// Ids of the groups a detail is bound to.
    pub async fn group_ids_for_detail(
        pool: &PgPool,
        detail_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT property_group_id FROM property_group_details \
             WHERE detail_id = $1 ORDER BY property_group_id",
        )
        .bind(detail_id)
        .fetch_all(pool)
        .await
    }

    /// All bindings of a group with their details and options.
    pub async fn list_bindings(
        pool: &PgPool,
        group_id: DbId,
    ) -> Result<Vec<GroupDetail>, sqlx::Error> {
        let rows = sqlx::query_as::<_, BindingRow>(
            "SELECT \
                 pgd.id AS binding_id, pgd.property_group_id, pgd.section, \
                 pgd.is_required, pgd.is_filter, pgd.sort_order, \
                 d.id AS detail_id, d.category_id, d.name, d.slug, d.detail_type, \
                 d.unit, d.help_text \
             FROM property_group_details pgd \
             JOIN details d ON d.id = pgd.detail_id \
             WHERE pgd.property_group_id = $1 \
             ORDER BY pgd.sort_order, d.name",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;

        let detail_ids: Vec<DbId> = rows.iter().map(|r| r.detail_id).collect();
        let mut options: HashMap<DbId, Vec<OptionDef>> = HashMap::new();
        for option in DetailRepo::list_options_for(pool, &detail_ids).await? {
            options
                .entry(option.detail_id)
                .or_default()
                .push(option.into());
        }

        rows.into_iter()
            .map(|row| {
                let detail_type = row
                    .detail_type
                    .parse::<DetailType>()
                    .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
                Ok(GroupDetail {
                    id: row.binding_id,
                    property_group_id: row.property_group_id,
                    options: options.remove(&row.detail_id).unwrap_or_default(),
                    detail: DetailDef {
                        id: row.detail_id,
                        category_id: row.category_id,
                        name: row.name,
                        slug: row.slug,
                        detail_type,
                        unit: row.unit,
                        help_text: row.help_text,
                    },
                    section: row.section,
                    is_required: row.is_required,
                    is_filter: row.is_filter,
                    sort_order: row.sort_order,
                })
            })
            .collect()
    }
}
