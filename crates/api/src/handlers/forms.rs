//! Handlers for lead-capture forms and their submissions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{Map, Value};
use tripwix_core::component_form::{validate_form_data, FormFieldDef};
use tripwix_db::models::component_form::{CreateComponentForm, CreateFormField, FormWithFields};
use tripwix_db::repositories::ComponentFormRepo;
use tripwix_db::DbPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

async fn find_form(pool: &DbPool, slug: &str) -> AppResult<FormWithFields> {
    ComponentFormRepo::find_by_slug(pool, slug)
        .await?
        .ok_or_else(|| AppError::from(sqlx::Error::RowNotFound))
}

/// POST /api/v1/forms
pub async fn create_form(
    State(state): State<AppState>,
    Json(input): Json<CreateComponentForm>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let form = ComponentFormRepo::create(&state.pool, &input).await?;

    tracing::info!(form_id = form.id, slug = %form.slug, "Form created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: form })))
}

/// GET /api/v1/forms/{slug}
pub async fn get_form(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let form = find_form(&state.pool, &slug).await?;
    Ok(Json(DataResponse { data: form }))
}

/// POST /api/v1/forms/{slug}/fields
pub async fn add_form_field(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<CreateFormField>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let form = find_form(&state.pool, &slug).await?;
    let field = ComponentFormRepo::add_field(&state.pool, form.form.id, &input).await?;

    tracing::info!(form_id = form.form.id, field_id = field.id, "Form field added");

    Ok((StatusCode::CREATED, Json(DataResponse { data: field })))
}

/// POST /api/v1/forms/{slug}/submissions
///
/// The payload is validated against the form's fields; keys matching no
/// field are dropped before the submission is stored.
pub async fn submit_form(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(payload): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let form = find_form(&state.pool, &slug).await?;
    let fields = form
        .fields
        .iter()
        .map(|f| f.to_def())
        .collect::<Result<Vec<FormFieldDef>, _>>()?;

    let data = validate_form_data(&fields, &payload)?;
    let submission = ComponentFormRepo::create_submission(&state.pool, form.form.id, &data).await?;

    tracing::info!(form_id = form.form.id, submission_id = submission.id, "Form submitted");

    Ok((StatusCode::CREATED, Json(DataResponse { data: submission })))
}

/// GET /api/v1/forms/{slug}/submissions
pub async fn list_submissions(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let form = find_form(&state.pool, &slug).await?;
    let submissions = ComponentFormRepo::list_submissions(&state.pool, form.form.id).await?;
    Ok(Json(DataResponse { data: submissions }))
}
