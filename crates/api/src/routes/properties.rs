//! Route definitions for properties and their dynamic detail form.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{detail_form, properties};
use crate::state::AppState;

/// Property routes mounted at `/properties`.
///
/// ```text
/// POST   /                  -> create_property
/// GET    /{id}              -> get_property
/// PUT    /{id}              -> update_property
/// GET    /slug/{slug}       -> get_property_by_slug
/// GET    /{id}/details      -> get_property_details (?lang=)
/// GET    /{id}/detail-form  -> get_detail_form (?category=)
/// POST   /{id}/detail-form  -> save_detail_form (?category=)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(properties::create_property))
        .route(
            "/{id}",
            get(properties::get_property).put(properties::update_property),
        )
        .route("/slug/{slug}", get(properties::get_property_by_slug))
        .route("/{id}/details", get(properties::get_property_details))
        .route(
            "/{id}/detail-form",
            get(detail_form::get_detail_form).post(detail_form::save_detail_form),
        )
}
