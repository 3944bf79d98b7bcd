//! Route definitions for collections and their blocks.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::collections;
use crate::state::AppState;

/// Collection routes mounted at `/collections`.
///
/// ```text
/// POST   /                  -> create_collection
/// GET    /{id}              -> get_collection (?include=&exclude=)
/// GET    /slug/{slug}       -> get_collection_by_slug (?kind=&include=&exclude=)
/// POST   /{id}/blocks       -> add_block
/// PUT    /{id}/fields       -> update_fields
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(collections::create_collection))
        .route("/{id}", get(collections::get_collection))
        .route("/slug/{slug}", get(collections::get_collection_by_slug))
        .route("/{id}/blocks", post(collections::add_block))
        .route("/{id}/fields", put(collections::update_fields))
}
