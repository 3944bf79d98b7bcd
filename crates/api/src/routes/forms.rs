//! Route definitions for lead-capture forms.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::forms;
use crate::state::AppState;

/// Form routes mounted at `/forms`.
///
/// ```text
/// POST   /                      -> create_form
/// GET    /{slug}                -> get_form
/// POST   /{slug}/fields         -> add_form_field
/// GET    /{slug}/submissions    -> list_submissions
/// POST   /{slug}/submissions    -> submit_form
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(forms::create_form))
        .route("/{slug}", get(forms::get_form))
        .route("/{slug}/fields", post(forms::add_form_field))
        .route(
            "/{slug}/submissions",
            get(forms::list_submissions).post(forms::submit_form),
        )
}
