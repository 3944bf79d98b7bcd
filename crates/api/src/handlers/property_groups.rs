//! Handlers for property groups and the details bound to them.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tripwix_core::detail_type::DetailType;
use tripwix_core::error::CoreError;
use tripwix_core::form_builder::field_name_clash;
use tripwix_core::grouping::{self, GroupDetail};
use tripwix_core::types::DbId;
use tripwix_db::models::property_group::{BindDetail, CreatePropertyGroup, PropertyGroup};
use tripwix_db::repositories::{DetailRepo, PropertyGroupRepo};
use tripwix_db::DbPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// A display section of a property group.
#[derive(Debug, Serialize)]
pub struct SectionResponse<'a> {
    pub name: &'a str,
    pub details: Vec<&'a GroupDetail>,
}

/// Load a group or fail with 404.
pub(crate) async fn ensure_group_exists(pool: &DbPool, id: DbId) -> AppResult<PropertyGroup> {
    PropertyGroupRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PropertyGroup",
            id,
        }))
}

/// Refuse to bind a detail whose form field names another detail of the
/// group already produces.
pub(crate) async fn ensure_field_names_free(
    state: &AppState,
    group_id: DbId,
    detail_id: DbId,
    slug: &str,
    detail_type: DetailType,
) -> AppResult<()> {
    let bindings = PropertyGroupRepo::list_bindings(&state.pool, group_id).await?;
    let bound = bindings
        .iter()
        .filter(|b| b.detail.id != detail_id)
        .map(|b| (b.detail.slug.as_str(), b.detail.detail_type));

    match field_name_clash((slug, detail_type), bound, &state.config.languages) {
        Some(name) => Err(AppError::Core(CoreError::Conflict(format!(
            "Field '{name}' is already used by another detail of property group {group_id}"
        )))),
        None => Ok(()),
    }
}

/// POST /api/v1/property-groups
pub async fn create_group(
    State(state): State<AppState>,
    Json(input): Json<CreatePropertyGroup>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let group = PropertyGroupRepo::create(&state.pool, &input).await?;

    tracing::info!(group_id = group.id, slug = %group.slug, "Property group created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: group })))
}

/// GET /api/v1/property-groups/{id}
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let group = ensure_group_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: group }))
}

/// POST /api/v1/property-groups/{id}/details
///
/// Binds a detail to the group, or updates the existing binding. A detail
/// whose form field names clash with another bound detail is refused (409).
pub async fn bind_detail(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<BindDetail>,
) -> AppResult<impl IntoResponse> {
    ensure_group_exists(&state.pool, id).await?;
    let detail = DetailRepo::find_by_id(&state.pool, input.detail_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Detail",
            id: input.detail_id,
        }))?;
    ensure_field_names_free(&state, id, detail.id, &detail.slug, detail.kind()?).await?;

    let binding = PropertyGroupRepo::bind_detail(&state.pool, id, &input).await?;

    tracing::info!(
        group_id = id,
        detail_id = input.detail_id,
        binding_id = binding.id,
        "Detail bound to property group",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: binding })))
}

/// GET /api/v1/property-groups/{id}/details
///
/// Bound details partitioned into display sections.
pub async fn list_sections(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_group_exists(&state.pool, id).await?;
    let bindings = PropertyGroupRepo::list_bindings(&state.pool, id).await?;

    let sections: Vec<SectionResponse<'_>> = grouping::sections(&bindings)
        .into_iter()
        .map(|s| SectionResponse {
            name: s.name,
            details: s.details,
        })
        .collect();

    Ok(Json(DataResponse { data: sections }).into_response())
}

/// GET /api/v1/property-groups/{id}/filters
pub async fn list_filters(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_group_exists(&state.pool, id).await?;
    let bindings = PropertyGroupRepo::list_bindings(&state.pool, id).await?;
    let filters = grouping::filterable(&bindings);
    Ok(Json(DataResponse { data: filters }).into_response())
}
