//! Repository for `component_forms`, `component_form_fields` and
//! `component_form_submissions`.

use serde_json::{Map, Value};
use sqlx::PgPool;
use tripwix_core::types::DbId;

use crate::models::component_form::{
    ComponentForm, ComponentFormField, ComponentFormSubmission, CreateComponentForm,
    CreateFormField, FormWithFields,
};

const FORM_COLUMNS: &str = "id, name, slug, created_at, updated_at";

const FIELD_COLUMNS: &str = "id, form_id, name, slug, field_type, is_required, sort_order, choices";

const SUBMISSION_COLUMNS: &str = "id, form_id, data, created_at";

/// Provides data access for lead-capture forms.
pub struct ComponentFormRepo;

impl ComponentFormRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateComponentForm,
    ) -> Result<ComponentForm, sqlx::Error> {
        let query = format!(
            "INSERT INTO component_forms (name, slug) VALUES ($1, $2) RETURNING {FORM_COLUMNS}"
        );
        sqlx::query_as::<_, ComponentForm>(&query)
            .bind(&input.name)
            .bind(&input.slug)
            .fetch_one(pool)
            .await
    }

    pub async fn add_field(
        pool: &PgPool,
        form_id: DbId,
        input: &CreateFormField,
    ) -> Result<ComponentFormField, sqlx::Error> {
        let query = format!(
            "INSERT INTO component_form_fields \
                 (form_id, name, slug, field_type, is_required, sort_order, choices) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 0), $7) \
             RETURNING {FIELD_COLUMNS}"
        );
        sqlx::query_as::<_, ComponentFormField>(&query)
            .bind(form_id)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(input.field_type.as_str())
            .bind(input.is_required)
            .bind(input.sort_order)
            .bind(&input.choices)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<FormWithFields>, sqlx::Error> {
        let query = format!("SELECT {FORM_COLUMNS} FROM component_forms WHERE slug = $1");
        let Some(form) = sqlx::query_as::<_, ComponentForm>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let fields = Self::list_fields(pool, form.id).await?;
        Ok(Some(FormWithFields { form, fields }))
    }

    pub async fn list_fields(
        pool: &PgPool,
        form_id: DbId,
    ) -> Result<Vec<ComponentFormField>, sqlx::Error> {
        let query = format!(
            "SELECT {FIELD_COLUMNS} FROM component_form_fields \
             WHERE form_id = $1 ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, ComponentFormField>(&query)
            .bind(form_id)
            .fetch_all(pool)
            .await
    }

    pub async fn create_submission(
        pool: &PgPool,
        form_id: DbId,
        data: &Map<String, Value>,
    ) -> Result<ComponentFormSubmission, sqlx::Error> {
        let query = format!(
            "INSERT INTO component_form_submissions (form_id, data) VALUES ($1, $2) \
             RETURNING {SUBMISSION_COLUMNS}"
        );
        sqlx::query_as::<_, ComponentFormSubmission>(&query)
            .bind(form_id)
            .bind(Value::Object(data.clone()))
            .fetch_one(pool)
            .await
    }

    /// Submissions for a form, newest first.
    pub async fn list_submissions(
        pool: &PgPool,
        form_id: DbId,
    ) -> Result<Vec<ComponentFormSubmission>, sqlx::Error> {
        let query = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM component_form_submissions \
             WHERE form_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ComponentFormSubmission>(&query)
            .bind(form_id)
            .fetch_all(pool)
            .await
    }
}
