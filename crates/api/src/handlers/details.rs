//! Handlers for detail categories, detail definitions and their options.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tripwix_core::error::CoreError;
use tripwix_core::types::DbId;
use tripwix_db::models::detail::{
    CreateDetail, CreateDetailCategory, CreateDetailOption, UpdateDetail,
};
use tripwix_db::repositories::{DetailCategoryRepo, DetailRepo, PropertyGroupRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::property_groups::ensure_field_names_free;
use crate::query::CategoryParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// GET /api/v1/detail-categories
pub async fn list_categories(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let categories = DetailCategoryRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: categories }))
}

/// POST /api/v1/detail-categories
pub async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<CreateDetailCategory>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let category = DetailCategoryRepo::create(&state.pool, &input).await?;

    tracing::info!(category_id = category.id, slug = %category.slug, "Detail category created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

/// GET /api/v1/details?category=
pub async fn list_details(
    State(state): State<AppState>,
    Query(params): Query<CategoryParams>,
) -> AppResult<impl IntoResponse> {
    let details = DetailRepo::list(&state.pool, params.category).await?;
    Ok(Json(DataResponse { data: details }))
}

/// POST /api/v1/details
pub async fn create_detail(
    State(state): State<AppState>,
    Json(input): Json<CreateDetail>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    DetailCategoryRepo::find_by_id(&state.pool, input.category_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "DetailCategory",
            id: input.category_id,
        }))?;

    let detail = DetailRepo::create(&state.pool, &input).await?;

    tracing::info!(
        detail_id = detail.id,
        slug = %detail.slug,
        detail_type = %detail.detail_type,
        "Detail created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// GET /api/v1/details/{id}
pub async fn get_detail(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = DetailRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Detail", id }))?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/details/{id}
///
/// The type of a detail is frozen once any property stores a value for it.
pub async fn update_detail(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDetail>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let current = DetailRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Detail", id }))?;

    let changes_type = input
        .detail_type
        .is_some_and(|t| t.as_str() != current.detail_type);
    if changes_type && DetailRepo::has_values(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Detail '{}' already has values; its type cannot change",
            current.slug
        ))));
    }

    if let Some(new_type) = input.detail_type.filter(|_| changes_type) {
        for group_id in PropertyGroupRepo::group_ids_for_detail(&state.pool, id).await? {
            ensure_field_names_free(&state, group_id, id, &current.slug, new_type).await?;
        }
    }

    let detail = DetailRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Detail", id }))?;

    tracing::info!(detail_id = id, "Detail updated");

    Ok(Json(DataResponse { data: detail }))
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// GET /api/v1/details/{id}/options
pub async fn list_options(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let options = DetailRepo::list_options(&state.pool, id).await?;
    Ok(Json(DataResponse { data: options }))
}

/// POST /api/v1/details/{id}/options
///
/// Only option-backed detail types accept options.
pub async fn create_option(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateDetailOption>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let detail = DetailRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Detail", id }))?;

    if !detail.kind()?.uses_options() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Detail '{}' of type {} does not take options",
            detail.slug, detail.detail_type
        ))));
    }

    let option = DetailRepo::create_option(&state.pool, id, &input).await?;

    tracing::info!(detail_id = id, option_id = option.id, "Detail option created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: option })))
}
