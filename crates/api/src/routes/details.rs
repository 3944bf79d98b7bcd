//! Route definitions for detail categories, details and detail options.

use axum::routing::get;
use axum::Router;

use crate::handlers::details;
use crate::state::AppState;

/// Detail routes mounted at `/details`.
///
/// ```text
/// GET    /                  -> list_details (?category=)
/// POST   /                  -> create_detail
/// GET    /{id}              -> get_detail
/// PUT    /{id}              -> update_detail
/// GET    /{id}/options      -> list_options
/// POST   /{id}/options      -> create_option
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(details::list_details).post(details::create_detail))
        .route("/{id}", get(details::get_detail).put(details::update_detail))
        .route(
            "/{id}/options",
            get(details::list_options).post(details::create_option),
        )
}

/// Category routes mounted at `/detail-categories`.
///
/// ```text
/// GET    /                  -> list_categories
/// POST   /                  -> create_category
/// ```
pub fn categories_router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(details::list_categories).post(details::create_category),
    )
}
