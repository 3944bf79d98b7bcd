//! Detail definitions: categories, details and options.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tripwix_core::detail_type::DetailType;
use tripwix_core::error::CoreError;
use tripwix_core::grouping::{CategoryDef, DetailDef, OptionDef};
use tripwix_core::types::{DbId, Timestamp};
use validator::Validate;

use crate::models::validation::validate_slug;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `detail_categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DetailCategory {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<DetailCategory> for CategoryDef {
    fn from(row: DetailCategory) -> Self {
        CategoryDef {
            id: row.id,
            name: row.name,
            slug: row.slug,
            sort_order: row.sort_order,
        }
    }
}

/// A row from the `details` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Detail {
    pub id: DbId,
    pub category_id: DbId,
    pub name: String,
    pub slug: String,
    pub detail_type: String,
    pub unit: Option<String>,
    pub help_text: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Detail {
    pub fn kind(&self) -> Result<DetailType, CoreError> {
        self.detail_type
            .parse::<DetailType>()
            .map_err(|e| CoreError::Internal(e.to_string()))
    }

    pub fn to_def(&self) -> Result<DetailDef, CoreError> {
        Ok(DetailDef {
            id: self.id,
            category_id: self.category_id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            detail_type: self.kind()?,
            unit: self.unit.clone(),
            help_text: self.help_text.clone(),
        })
    }
}

/// A row from the `detail_options` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DetailOption {
    pub id: DbId,
    pub detail_id: DbId,
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<DetailOption> for OptionDef {
    fn from(row: DetailOption) -> Self {
        OptionDef {
            id: row.id,
            detail_id: row.detail_id,
            name: row.name,
            slug: row.slug,
            sort_order: row.sort_order,
        }
    }
}

// ---------------------------------------------------------------------------
// DTOs (request payloads)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDetailCategory {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDetail {
    pub category_id: DbId,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    pub detail_type: DetailType,
    pub unit: Option<String>,
    pub help_text: Option<String>,
}

/// DTO for updating a detail. A type change is refused once values exist.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDetail {
    pub category_id: Option<DbId>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub detail_type: Option<DetailType>,
    pub unit: Option<String>,
    pub help_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDetailOption {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    pub sort_order: Option<i32>,
}
