//! Route definitions for components, component fields and media images.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::components;
use crate::state::AppState;

/// Component routes mounted at `/components`.
///
/// ```text
/// POST   /                        -> create_component
/// GET    /{id}                    -> get_component
/// POST   /{id}/fields             -> add_field
/// PUT    /{id}/fields/{field_id}  -> link_field
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(components::create_component))
        .route("/{id}", get(components::get_component))
        .route("/{id}/fields", post(components::add_field))
        .route("/{id}/fields/{field_id}", put(components::link_field))
}

/// Field routes mounted at `/component-fields`.
///
/// ```text
/// POST   /{id}/options      -> create_field_option
/// ```
pub fn fields_router() -> Router<AppState> {
    Router::new().route("/{id}/options", post(components::create_field_option))
}

/// Media routes mounted at `/media`.
///
/// ```text
/// POST   /images            -> create_image
/// ```
pub fn media_router() -> Router<AppState> {
    Router::new().route("/images", post(components::create_image))
}
