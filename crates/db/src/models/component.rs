//! Components, component fields, collections and media images.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use tripwix_core::component::{CollectionKind, ComponentFieldType, FieldOptionDef};
use tripwix_core::error::CoreError;
use tripwix_core::types::{DbId, Timestamp};
use validator::Validate;

use crate::models::validation::validate_slug;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from the `components` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Component {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `component_fields` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ComponentField {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub field_type: String,
    pub help_text: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A field joined through `component_field_links` for one component.
#[derive(Debug, Clone, FromRow)]
pub struct LinkedField {
    pub component_id: DbId,
    pub field_id: DbId,
    pub name: String,
    pub slug: String,
    pub field_type: String,
    pub help_text: Option<String>,
    pub is_required: bool,
    pub sort_order: i32,
}

impl LinkedField {
    pub fn kind(&self) -> Result<ComponentFieldType, CoreError> {
        self.field_type
            .parse::<ComponentFieldType>()
            .map_err(|e| CoreError::Internal(e.to_string()))
    }
}

/// A row from the `component_field_options` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ComponentFieldOption {
    pub id: DbId,
    pub field_id: DbId,
    pub label: String,
    pub value: String,
    pub sort_order: i32,
}

impl From<ComponentFieldOption> for FieldOptionDef {
    fn from(row: ComponentFieldOption) -> Self {
        FieldOptionDef {
            id: row.id,
            field_id: row.field_id,
            label: row.label,
            value: row.value,
            sort_order: row.sort_order,
        }
    }
}

/// A row from the `collections` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Collection {
    pub id: DbId,
    pub kind: String,
    pub title: String,
    pub slug: String,
    pub fields_data_json: Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Collection {
    pub fn collection_kind(&self) -> Result<CollectionKind, CoreError> {
        CollectionKind::parse(&self.kind)
            .ok_or_else(|| CoreError::Internal(format!("Unknown collection kind: {}", self.kind)))
    }
}

/// A row from the `collection_blocks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CollectionBlock {
    pub id: DbId,
    pub collection_id: DbId,
    pub component_id: DbId,
    pub sort_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `media_images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MediaImage {
    pub id: DbId,
    pub file_path: String,
    pub alt_text: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// DTOs (request payloads)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateComponent {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateComponentField {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    pub field_type: ComponentFieldType,
    pub help_text: Option<String>,
}

/// Placement of a field inside one component.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkComponentField {
    #[serde(default)]
    pub is_required: bool,
    pub sort_order: Option<i32>,
}

/// Create a field and link it to a component in one request.
#[derive(Debug, Clone, Deserialize)]
pub struct AddComponentField {
    #[serde(flatten)]
    pub field: CreateComponentField,
    #[serde(flatten)]
    pub link: LinkComponentField,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFieldOption {
    #[validate(length(min = 1, max = 255))]
    pub label: String,
    #[validate(length(min = 1, max = 255))]
    pub value: String,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCollection {
    pub kind: CollectionKind,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCollectionBlock {
    pub component_id: DbId,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMediaImage {
    #[validate(length(min = 1))]
    pub file_path: String,
    pub alt_text: Option<String>,
}
