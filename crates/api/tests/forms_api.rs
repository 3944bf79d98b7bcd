//! HTTP-level tests for lead-capture forms.

mod common;

use axum::http::StatusCode;
use common::{body_json, create, get, post_json};
use serde_json::json;
use sqlx::PgPool;

async fn seed_contact_form(pool: &PgPool) {
    create(pool, "/api/v1/forms", json!({"name": "Contact", "slug": "contact"})).await;
    for field in [
        json!({"name": "Name", "slug": "name", "field_type": "text", "is_required": true, "sort_order": 1}),
        json!({"name": "Email", "slug": "email", "field_type": "email", "is_required": true, "sort_order": 2}),
        json!({"name": "Budget", "slug": "budget", "field_type": "select", "choices": ["low", "high"], "sort_order": 3}),
        json!({"name": "Newsletter", "slug": "newsletter", "field_type": "boolean", "sort_order": 4}),
    ] {
        create(pool, "/api/v1/forms/contact/fields", field).await;
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn form_lists_fields_in_order(pool: PgPool) {
    seed_contact_form(&pool).await;

    let response = get(common::build_test_app(pool), "/api/v1/forms/contact").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let slugs: Vec<&str> = json["data"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, ["name", "email", "budget", "newsletter"]);
    assert_eq!(json["data"]["fields"][2]["choices"], json!(["low", "high"]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn valid_submission_is_stored(pool: PgPool) {
    seed_contact_form(&pool).await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/forms/contact/submissions",
        json!({"name": "Ana", "email": "Ana@Example.com", "budget": "high", "utm": "x"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(
        json["data"]["data"],
        json!({"name": "Ana", "email": "ana@example.com", "budget": "high", "newsletter": false})
    );

    let response = get(common::build_test_app(pool), "/api/v1/forms/contact/submissions").await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_required_field_returns_400(pool: PgPool) {
    seed_contact_form(&pool).await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/forms/contact/submissions",
        json!({"name": "Ana", "budget": "medium"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["fields"]["email"].is_array());
    assert!(json["fields"]["budget"].is_array());
    assert!(json["fields"].get("name").is_none());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM component_form_submissions")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_form_returns_404(pool: PgPool) {
    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/forms/nope/submissions",
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
