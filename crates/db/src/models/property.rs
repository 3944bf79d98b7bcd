//! Property entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tripwix_core::slug::property_slug;
use tripwix_core::types::{DbId, Timestamp};
use validator::Validate;

use crate::models::validation::validate_reference;

/// A row from the `properties` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Property {
    pub id: DbId,
    pub property_group_id: DbId,
    pub reference: String,
    pub tagline: Option<String>,
    pub location: Option<String>,
    pub slug: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Property {
    /// Display title: the tagline when set, otherwise the reference.
    pub fn title(&self) -> &str {
        self.tagline
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.reference)
    }

    pub fn expected_slug(&self) -> String {
        property_slug(self.location.as_deref(), self.tagline.as_deref(), &self.reference)
    }
}

/// A property with its related property ids.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyWithRelated {
    #[serde(flatten)]
    pub property: Property,
    pub related: Vec<DbId>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProperty {
    pub property_group_id: DbId,
    #[validate(length(min = 1, max = 64), custom(function = "validate_reference"))]
    pub reference: String,
    #[validate(length(max = 255))]
    pub tagline: Option<String>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    #[serde(default)]
    pub related: Vec<DbId>,
}

/// DTO for updating a property. All fields are optional; `related`
/// replaces the whole related set when present.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProperty {
    #[validate(length(min = 1, max = 64), custom(function = "validate_reference"))]
    pub reference: Option<String>,
    #[validate(length(max = 255))]
    pub tagline: Option<String>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    pub related: Option<Vec<DbId>>,
}
