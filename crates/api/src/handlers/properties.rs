//! Handlers for properties and their rendered detail tree.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tripwix_core::error::CoreError;
use tripwix_core::grouping::{build_detail_tree, CategoryDef};
use tripwix_core::types::DbId;
use tripwix_db::models::property::{CreateProperty, Property, PropertyWithRelated, UpdateProperty};
use tripwix_db::repositories::{
    DetailCategoryRepo, PropertyDetailValueRepo, PropertyGroupRepo, PropertyRepo,
};
use tripwix_db::DbPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::property_groups::ensure_group_exists;
use crate::query::LanguageParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Load a property or fail with 404.
pub(crate) async fn ensure_property_exists(pool: &DbPool, id: DbId) -> AppResult<Property> {
    PropertyRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Property", id }))
}

async fn with_related(pool: &DbPool, property: Property) -> AppResult<PropertyWithRelated> {
    let related = PropertyRepo::list_related(pool, property.id).await?;
    Ok(PropertyWithRelated { property, related })
}

/// POST /api/v1/properties
pub async fn create_property(
    State(state): State<AppState>,
    Json(input): Json<CreateProperty>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    ensure_group_exists(&state.pool, input.property_group_id).await?;

    let property = PropertyRepo::create(&state.pool, &input).await?;

    tracing::info!(
        property_id = property.id,
        reference = %property.reference,
        slug = %property.slug,
        "Property created",
    );

    let data = with_related(&state.pool, property).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// GET /api/v1/properties/{id}
pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let property = ensure_property_exists(&state.pool, id).await?;
    let data = with_related(&state.pool, property).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/properties/slug/{slug}
pub async fn get_property_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let property = PropertyRepo::find_by_slug(&state.pool, &slug)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    let data = with_related(&state.pool, property).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/properties/{id}
///
/// The slug is regenerated from the updated location, tagline and reference.
pub async fn update_property(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProperty>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let property = PropertyRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Property", id }))?;

    tracing::info!(property_id = id, slug = %property.slug, "Property updated");

    let data = with_related(&state.pool, property).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/properties/{id}/details?lang=
///
/// The property's stored values as a category -> section -> detail tree.
/// Without `lang`, translatable details report their default-language text.
pub async fn get_property_details(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<LanguageParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(lang) = params.lang.as_deref() {
        if !state.config.languages.contains(lang) {
            return Err(AppError::BadRequest(format!("Unsupported language: {lang}")));
        }
    }

    let property = ensure_property_exists(&state.pool, id).await?;
    let bindings = PropertyGroupRepo::list_bindings(&state.pool, property.property_group_id).await?;
    let values = PropertyDetailValueRepo::list_for_property(&state.pool, id).await?;
    let categories: Vec<CategoryDef> = DetailCategoryRepo::list(&state.pool)
        .await?
        .into_iter()
        .map(CategoryDef::from)
        .collect();

    let tree = build_detail_tree(&categories, &bindings, &values, params.lang.as_deref());
    Ok(Json(DataResponse { data: tree }))
}
