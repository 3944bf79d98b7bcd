//! Property groups and the details bound to them.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tripwix_core::types::{DbId, Timestamp};
use validator::Validate;

use crate::models::validation::validate_slug;

/// A row from the `property_groups` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PropertyGroup {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `property_group_details` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PropertyGroupDetail {
    pub id: DbId,
    pub property_group_id: DbId,
    pub detail_id: DbId,
    pub section: Option<String>,
    pub is_required: bool,
    pub is_filter: bool,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePropertyGroup {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
}

/// DTO for binding a detail to a group.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BindDetail {
    pub detail_id: DbId,
    pub section: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_filter: bool,
    pub sort_order: Option<i32>,
}
