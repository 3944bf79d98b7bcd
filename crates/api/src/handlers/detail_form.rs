//! The dynamic per-property detail form: read it, then submit it.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{Map, Value};
use tripwix_core::detail_value::StoredValue;
use tripwix_core::error::CoreError;
use tripwix_core::form_builder::build_detail_form;
use tripwix_core::grouping::{self, GroupDetail};
use tripwix_core::types::DbId;
use tripwix_db::repositories::{PropertyDetailValueRepo, PropertyGroupRepo};

use crate::error::AppResult;
use crate::handlers::properties::ensure_property_exists;
use crate::query::CategoryParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Bindings shown on the form: one category when asked for, otherwise all
/// of them in section order.
fn form_bindings(bindings: &[GroupDetail], category: Option<DbId>) -> Vec<&GroupDetail> {
    match category {
        Some(category_id) => grouping::in_category(bindings, category_id),
        None => grouping::sections(bindings)
            .into_iter()
            .flat_map(|s| s.details)
            .collect(),
    }
}

/// GET /api/v1/properties/{id}/detail-form?category=
pub async fn get_detail_form(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<CategoryParams>,
) -> AppResult<impl IntoResponse> {
    let property = ensure_property_exists(&state.pool, id).await?;
    let bindings = PropertyGroupRepo::list_bindings(&state.pool, property.property_group_id).await?;
    let values = PropertyDetailValueRepo::list_for_property(&state.pool, id).await?;

    let form = build_detail_form(
        &form_bindings(&bindings, params.category),
        &values,
        &state.config.languages,
    );
    Ok(Json(DataResponse { data: form }))
}

/// POST /api/v1/properties/{id}/detail-form?category=
///
/// Cleans the payload against the synthesized form and writes every
/// touched value row in one transaction. A `related` key replaces the
/// property's related set in the same transaction.
pub async fn save_detail_form(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<CategoryParams>,
    Json(payload): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let property = ensure_property_exists(&state.pool, id).await?;
    let bindings = PropertyGroupRepo::list_bindings(&state.pool, property.property_group_id).await?;
    let mut existing = PropertyDetailValueRepo::list_for_property(&state.pool, id).await?;

    let form = build_detail_form(
        &form_bindings(&bindings, params.category),
        &existing,
        &state.config.languages,
    );
    let cleaned = form.clean(&payload)?;

    let mut batch: Vec<(DbId, StoredValue)> = Vec::new();
    for binding_id in cleaned.binding_ids() {
        let mut stored = existing.remove(&binding_id).unwrap_or_default();
        cleaned
            .apply(binding_id, &mut stored)
            .map_err(CoreError::from)?;
        batch.push((binding_id, stored));
    }

    PropertyDetailValueRepo::save_values(&state.pool, id, &batch, cleaned.related.as_deref())
        .await?;

    tracing::info!(
        property_id = id,
        values = batch.len(),
        related_replaced = cleaned.related.is_some(),
        "Property details saved",
    );

    let values = PropertyDetailValueRepo::list_for_property(&state.pool, id).await?;
    let refreshed = build_detail_form(
        &form_bindings(&bindings, params.category),
        &values,
        &state.config.languages,
    );
    Ok(Json(DataResponse { data: refreshed }))
}
