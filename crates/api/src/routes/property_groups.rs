//! Route definitions for property groups.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::property_groups;
use crate::state::AppState;

/// Property group routes mounted at `/property-groups`.
///
/// ```text
/// POST   /                  -> create_group
/// GET    /{id}              -> get_group
/// GET    /{id}/details      -> list_sections
/// POST   /{id}/details      -> bind_detail
/// GET    /{id}/filters      -> list_filters
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(property_groups::create_group))
        .route("/{id}", get(property_groups::get_group))
        .route(
            "/{id}/details",
            get(property_groups::list_sections).post(property_groups::bind_detail),
        )
        .route("/{id}/filters", get(property_groups::list_filters))
}
