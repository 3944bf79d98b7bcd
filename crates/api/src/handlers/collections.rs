//! Handlers for collections (pages, blog posts, experiences) and the
//! component blocks laid out on them.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};
use tripwix_core::component::{
    build_component_tree, collect_block_values, collect_references, BlockNode, CollectionKind,
    ComponentFilter,
};
use tripwix_core::error::CoreError;
use tripwix_core::types::DbId;
use tripwix_db::models::component::{Collection, CreateCollection, CreateCollectionBlock};
use tripwix_db::repositories::{CollectionRepo, ComponentRepo, ReferenceRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::query::ComponentFilterParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// A collection with its rendered blocks.
#[derive(Debug, Serialize)]
pub struct CollectionResponse {
    pub id: DbId,
    pub kind: CollectionKind,
    pub title: String,
    pub slug: String,
    pub path: String,
    pub blocks: Vec<BlockNode>,
}

async fn render(
    state: &AppState,
    collection: Collection,
    filter: &ComponentFilter,
) -> AppResult<CollectionResponse> {
    let kind = collection.collection_kind()?;
    let blocks = CollectionRepo::load_blocks(&state.pool, collection.id).await?;
    let empty = Map::new();
    let data = collection.fields_data_json.as_object().unwrap_or(&empty);

    let request = collect_references(&blocks, data, filter);
    let refs = ReferenceRepo::resolve(&state.pool, &request, &state.config.media_url).await?;
    let tree = build_component_tree(&blocks, data, &refs, filter);

    Ok(CollectionResponse {
        id: collection.id,
        kind,
        path: kind.path(&collection.slug),
        title: collection.title,
        slug: collection.slug,
        blocks: tree,
    })
}

/// POST /api/v1/collections
pub async fn create_collection(
    State(state): State<AppState>,
    Json(input): Json<CreateCollection>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let collection = CollectionRepo::create(&state.pool, &input).await?;

    tracing::info!(
        collection_id = collection.id,
        kind = %collection.kind,
        slug = %collection.slug,
        "Collection created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: collection })))
}

/// GET /api/v1/collections/{id}?include=&exclude=
pub async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<ComponentFilterParams>,
) -> AppResult<impl IntoResponse> {
    let collection = CollectionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Collection",
            id,
        }))?;
    let data = render(&state, collection, &params.filter()).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/collections/slug/{slug}?kind=&include=&exclude=
pub async fn get_collection_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<ComponentFilterParams>,
) -> AppResult<impl IntoResponse> {
    let collection = CollectionRepo::find_by_slug(&state.pool, &slug, params.kind)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    let data = render(&state, collection, &params.filter()).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/collections/{id}/blocks
pub async fn add_block(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateCollectionBlock>,
) -> AppResult<impl IntoResponse> {
    CollectionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Collection",
            id,
        }))?;
    ComponentRepo::find_by_id(&state.pool, input.component_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Component",
            id: input.component_id,
        }))?;

    let block = CollectionRepo::add_block(&state.pool, id, &input).await?;

    tracing::info!(
        collection_id = id,
        block_id = block.id,
        component_id = block.component_id,
        "Block added to collection",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: block })))
}

/// PUT /api/v1/collections/{id}/fields
///
/// Validates the submitted `b{block_id}-{field_slug}` values against the
/// collection's blocks and merges them into the stored document.
pub async fn update_fields(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(payload): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    CollectionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Collection",
            id,
        }))?;

    let blocks = CollectionRepo::load_blocks(&state.pool, id).await?;
    let values = collect_block_values(&blocks, &payload)?;

    let collection = CollectionRepo::write_fields_data(&state.pool, id, values)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Collection",
            id,
        }))?;

    tracing::info!(collection_id = id, blocks = blocks.len(), "Collection fields saved");

    let data = render(&state, collection, &ComponentFilter::default()).await?;
    Ok(Json(DataResponse { data }))
}
