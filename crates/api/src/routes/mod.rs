pub mod collections;
pub mod components;
pub mod details;
pub mod forms;
pub mod health;
pub mod properties;
pub mod property_groups;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /detail-categories                               list, create
///
/// /details                                         list (?category=), create
/// /details/{id}                                    get, update
/// /details/{id}/options                            list, create
///
/// /property-groups                                 create
/// /property-groups/{id}                            get
/// /property-groups/{id}/details                    sections, bind detail
/// /property-groups/{id}/filters                    filterable details
///
/// /properties                                      create
/// /properties/{id}                                 get, update
/// /properties/slug/{slug}                          get by slug
/// /properties/{id}/details                         detail tree (?lang=)
/// /properties/{id}/detail-form                     form (?category=), save
///
/// /components                                      create
/// /components/{id}                                 get definition
/// /components/{id}/fields                          create + link field
/// /components/{id}/fields/{field_id}               link existing field
/// /component-fields/{id}/options                   create option
/// /media/images                                    create image
///
/// /collections                                     create
/// /collections/{id}                                rendered blocks (?include=&exclude=)
/// /collections/slug/{slug}                         rendered blocks (?kind=)
/// /collections/{id}/blocks                         add block
/// /collections/{id}/fields                         save block values (PUT)
///
/// /forms                                           create
/// /forms/{slug}                                    get with fields
/// /forms/{slug}/fields                             add field
/// /forms/{slug}/submissions                        list, submit
///
/// /uploads                                         raw upload (?file_name=)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Detail definitions.
        .nest("/detail-categories", details::categories_router())
        .nest("/details", details::router())
        // Property groups and properties.
        .nest("/property-groups", property_groups::router())
        .nest("/properties", properties::router())
        // Component library.
        .nest("/components", components::router())
        .nest("/component-fields", components::fields_router())
        .nest("/media", components::media_router())
        // CMS collections.
        .nest("/collections", collections::router())
        // Lead-capture forms.
        .nest("/forms", forms::router())
        .route("/uploads", post(handlers::uploads::upload_file))
}
