//! Lead-capture forms, their fields and submissions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use tripwix_core::component_form::{FormFieldDef, FormInputType};
use tripwix_core::error::CoreError;
use tripwix_core::types::{DbId, Timestamp};
use validator::Validate;

use crate::models::validation::validate_slug;

/// A row from the `component_forms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ComponentForm {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `component_form_fields` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ComponentFormField {
    pub id: DbId,
    pub form_id: DbId,
    pub name: String,
    pub slug: String,
    pub field_type: String,
    pub is_required: bool,
    pub sort_order: i32,
    pub choices: Vec<String>,
}

impl ComponentFormField {
    pub fn to_def(&self) -> Result<FormFieldDef, CoreError> {
        let field_type = FormInputType::parse(&self.field_type).ok_or_else(|| {
            CoreError::Internal(format!("Unknown form field type: {}", self.field_type))
        })?;
        Ok(FormFieldDef {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            field_type,
            is_required: self.is_required,
            sort_order: self.sort_order,
            choices: self.choices.clone(),
        })
    }
}

/// A row from the `component_form_submissions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ComponentFormSubmission {
    pub id: DbId,
    pub form_id: DbId,
    pub data: Value,
    pub created_at: Timestamp,
}

/// A form with its ordered fields.
#[derive(Debug, Clone, Serialize)]
pub struct FormWithFields {
    #[serde(flatten)]
    pub form: ComponentForm,
    pub fields: Vec<ComponentFormField>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateComponentForm {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFormField {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    pub field_type: FormInputType,
    #[serde(default)]
    pub is_required: bool,
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub choices: Vec<String>,
}
