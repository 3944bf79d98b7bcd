//! Handlers for component definitions, their fields and media images.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tripwix_core::component::{ComponentDef, ComponentFieldType};
use tripwix_core::error::CoreError;
use tripwix_core::types::DbId;
use tripwix_db::models::component::{
    AddComponentField, CreateComponent, CreateFieldOption, CreateMediaImage, LinkComponentField,
};
use tripwix_db::repositories::{ComponentRepo, MediaImageRepo};
use tripwix_db::DbPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Load a component with its fields and options, or fail with 404.
async fn load_definition(pool: &DbPool, id: DbId) -> AppResult<ComponentDef> {
    ComponentRepo::load_definitions(pool, &[id])
        .await?
        .remove(&id)
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Component", id }))
}

/// POST /api/v1/components
pub async fn create_component(
    State(state): State<AppState>,
    Json(input): Json<CreateComponent>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let component = ComponentRepo::create(&state.pool, &input).await?;

    tracing::info!(component_id = component.id, slug = %component.slug, "Component created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: component })))
}

/// GET /api/v1/components/{id}
pub async fn get_component(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let definition = load_definition(&state.pool, id).await?;
    Ok(Json(DataResponse { data: definition }))
}

/// POST /api/v1/components/{id}/fields
///
/// Creates a new field and links it to the component.
pub async fn add_field(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AddComponentField>,
) -> AppResult<impl IntoResponse> {
    input.field.validate()?;
    ComponentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Component", id }))?;

    let field = ComponentRepo::create_field(&state.pool, &input.field).await?;
    ComponentRepo::link_field(
        &state.pool,
        id,
        field.id,
        input.link.is_required,
        input.link.sort_order.unwrap_or(0),
    )
    .await?;

    tracing::info!(
        component_id = id,
        field_id = field.id,
        field_type = %field.field_type,
        "Component field created",
    );

    let definition = load_definition(&state.pool, id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: definition })))
}

/// PUT /api/v1/components/{id}/fields/{field_id}
///
/// Links an existing field to the component, or updates its placement.
pub async fn link_field(
    State(state): State<AppState>,
    Path((id, field_id)): Path<(DbId, DbId)>,
    Json(input): Json<LinkComponentField>,
) -> AppResult<impl IntoResponse> {
    ComponentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Component", id }))?;
    ComponentRepo::find_field(&state.pool, field_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ComponentField",
            id: field_id,
        }))?;

    ComponentRepo::link_field(
        &state.pool,
        id,
        field_id,
        input.is_required,
        input.sort_order.unwrap_or(0),
    )
    .await?;

    tracing::info!(component_id = id, field_id, "Component field linked");

    let definition = load_definition(&state.pool, id).await?;
    Ok(Json(DataResponse { data: definition }))
}

/// POST /api/v1/component-fields/{id}/options
///
/// Only `option` and `options` fields take options.
pub async fn create_field_option(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateFieldOption>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let field = ComponentRepo::find_field(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ComponentField",
            id,
        }))?;

    let field_type = field
        .field_type
        .parse::<ComponentFieldType>()
        .map_err(|e| CoreError::Internal(e.to_string()))?;
    if !matches!(field_type, ComponentFieldType::Option | ComponentFieldType::Options) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Field '{}' of type {} does not take options",
            field.slug, field.field_type
        ))));
    }

    let option = ComponentRepo::create_field_option(&state.pool, id, &input).await?;

    tracing::info!(field_id = id, option_id = option.id, "Component field option created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: option })))
}

/// POST /api/v1/media/images
pub async fn create_image(
    State(state): State<AppState>,
    Json(input): Json<CreateMediaImage>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let image = MediaImageRepo::create(&state.pool, &input).await?;

    tracing::info!(image_id = image.id, file_path = %image.file_path, "Media image created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: image })))
}
