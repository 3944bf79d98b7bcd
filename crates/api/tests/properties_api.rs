//! HTTP-level tests for detail definitions, properties and the dynamic
//! detail form.

mod common;

use axum::http::StatusCode;
use common::{body_json, create, get, id_of, post_json, put_json};
use serde_json::{json, Value};
use sqlx::PgPool;

struct Fixture {
    category_id: i64,
    group_id: i64,
    color_id: i64,
    blue_id: i64,
    red_id: i64,
    property_id: i64,
}

/// A group with three bound details:
/// `color` (option, blue/red), `bedrooms` (integer) and a required
/// translatable `headline`.
async fn seed(pool: &PgPool) -> Fixture {
    let category = create(
        pool,
        "/api/v1/detail-categories",
        json!({"name": "Overview", "slug": "overview"}),
    )
    .await;
    let category_id = id_of(&category);

    let color = create(
        pool,
        "/api/v1/details",
        json!({"category_id": category_id, "name": "Color", "slug": "color", "detail_type": "option"}),
    )
    .await;
    let bedrooms = create(
        pool,
        "/api/v1/details",
        json!({"category_id": category_id, "name": "Bedrooms", "slug": "bedrooms", "detail_type": "integer"}),
    )
    .await;
    let headline = create(
        pool,
        "/api/v1/details",
        json!({"category_id": category_id, "name": "Headline", "slug": "headline", "detail_type": "trans_text"}),
    )
    .await;

    let color_id = id_of(&color);
    let blue = create(
        pool,
        &format!("/api/v1/details/{color_id}/options"),
        json!({"name": "Blue", "slug": "blue", "sort_order": 1}),
    )
    .await;
    let red = create(
        pool,
        &format!("/api/v1/details/{color_id}/options"),
        json!({"name": "Red", "slug": "red", "sort_order": 2}),
    )
    .await;

    let group = create(
        pool,
        "/api/v1/property-groups",
        json!({"name": "Villas", "slug": "villas"}),
    )
    .await;
    let group_id = id_of(&group);

    for (detail, required, filter, sort) in [
        (&color, false, true, 1),
        (&bedrooms, false, true, 2),
        (&headline, true, false, 0),
    ] {
        create(
            pool,
            &format!("/api/v1/property-groups/{group_id}/details"),
            json!({
                "detail_id": id_of(detail),
                "section": "Basics",
                "is_required": required,
                "is_filter": filter,
                "sort_order": sort,
            }),
        )
        .await;
    }

    let property = create(
        pool,
        "/api/v1/properties",
        json!({"property_group_id": group_id, "reference": "TW-104", "tagline": "Casa Azul", "location": "Lagos"}),
    )
    .await;

    Fixture {
        category_id,
        group_id,
        color_id,
        blue_id: id_of(&blue),
        red_id: id_of(&red),
        property_id: id_of(&property),
    }
}

/// Create a detail in the fixture category and bind it to the group.
async fn create_detail(pool: &PgPool, fx: &Fixture, slug: &str, detail_type: &str) -> i64 {
    let detail = create(
        pool,
        "/api/v1/details",
        json!({"category_id": fx.category_id, "name": slug, "slug": slug, "detail_type": detail_type}),
    )
    .await;
    id_of(&detail)
}

async fn bind(pool: &PgPool, fx: &Fixture, detail_id: i64) -> StatusCode {
    post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/property-groups/{}/details", fx.group_id),
        json!({"detail_id": detail_id, "section": "Extra"}),
    )
    .await
    .status()
}

fn form_field<'a>(form: &'a Value, name: &str) -> &'a Value {
    form["fields"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["name"] == name)
        .unwrap_or_else(|| panic!("field {name} missing from form"))
}

fn tree_value<'a>(tree: &'a Value, slug: &str) -> Option<&'a Value> {
    tree.as_array()?
        .iter()
        .flat_map(|c| c["sections"].as_array().into_iter().flatten())
        .flat_map(|s| s["details"].as_array().into_iter().flatten())
        .find(|d| d["slug"] == slug)
        .map(|d| &d["value"])
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn property_slug_is_generated_and_resolvable(pool: PgPool) {
    let fx = seed(&pool).await;

    let response = get(
        common::build_test_app(pool.clone()),
        "/api/v1/properties/slug/lagos-casa-azul-tw-104",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], fx.property_id);
    assert_eq!(json["data"]["related"], json!([]));

    let response = put_json(
        common::build_test_app(pool),
        &format!("/api/v1/properties/{}", fx.property_id),
        json!({"location": "Praia da Luz"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["slug"], "praia-da-luz-casa-azul-tw-104");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_reference_returns_409(pool: PgPool) {
    let fx = seed(&pool).await;

    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/properties",
        json!({"property_group_id": fx.group_id, "reference": "TW-104"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reference_without_slug_characters_is_rejected(pool: PgPool) {
    let fx = seed(&pool).await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/properties",
        json!({"property_group_id": fx.group_id, "reference": "###"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["fields"]["reference"].is_array());

    let response = put_json(
        common::build_test_app(pool),
        &format!("/api/v1/properties/{}", fx.property_id),
        json!({"reference": "--"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn property_in_missing_group_returns_404(pool: PgPool) {
    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/properties",
        json!({"property_group_id": 999999, "reference": "TW-1"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Detail form
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn option_detail_renders_as_choice_field(pool: PgPool) {
    let fx = seed(&pool).await;

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/properties/{}/detail-form", fx.property_id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let form = &json["data"];

    let color = form_field(form, "detail_color");
    assert_eq!(color["widget"], "choice");
    let choices = color["choices"].as_array().unwrap();
    assert_eq!(choices.len(), 2);
    assert_eq!(choices[0]["value"], fx.blue_id);
    assert_eq!(choices[1]["value"], fx.red_id);

    assert_eq!(form_field(form, "detail_headline_en")["required"], true);
    assert_eq!(form_field(form, "detail_headline_pt")["required"], false);
    assert_eq!(form_field(form, "detail_bedrooms")["widget"], "integer");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn saving_the_form_stores_values_and_renders_tree(pool: PgPool) {
    let fx = seed(&pool).await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/properties/{}/detail-form", fx.property_id),
        json!({
            "detail_color": fx.blue_id,
            "detail_bedrooms": "3",
            "detail_headline_en": "Sea view",
            "detail_headline_pt": "Vista mar",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(form_field(&json["data"], "detail_color")["initial"], fx.blue_id);

    let stored: Option<i64> = sqlx::query_scalar(
        "SELECT v.detail_option_id FROM property_detail_values v \
         JOIN property_group_details pgd ON pgd.id = v.property_group_detail_id \
         WHERE v.property_id = $1 AND pgd.detail_id = $2",
    )
    .bind(fx.property_id)
    .bind(fx.color_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(stored, Some(fx.blue_id));

    let response = get(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/properties/{}/details", fx.property_id),
    )
    .await;
    let tree = body_json(response).await["data"].clone();
    assert_eq!(tree_value(&tree, "color").unwrap()["name"], "Blue");
    assert_eq!(tree_value(&tree, "bedrooms").unwrap(), &json!(3));
    assert_eq!(tree_value(&tree, "headline").unwrap(), "Sea view");

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/properties/{}/details?lang=pt", fx.property_id),
    )
    .await;
    let tree = body_json(response).await["data"].clone();
    assert_eq!(tree_value(&tree, "headline").unwrap(), "Vista mar");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_default_language_copy_is_rejected(pool: PgPool) {
    let fx = seed(&pool).await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/properties/{}/detail-form", fx.property_id),
        json!({"detail_headline_pt": "Vista mar", "detail_color": 0}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["fields"]["detail_headline_en"].is_array());
    assert!(json["fields"]["detail_color"].is_array());

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM property_detail_values WHERE property_id = $1")
            .bind(fx.property_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn decimal_beyond_column_precision_is_a_field_error(pool: PgPool) {
    let fx = seed(&pool).await;
    let area_id = create_detail(&pool, &fx, "area", "number").await;
    assert_eq!(bind(&pool, &fx, area_id).await, StatusCode::CREATED);

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/properties/{}/detail-form", fx.property_id),
        json!({"detail_headline_en": "Sea view", "detail_area": "12345678901"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["fields"]["detail_area"].is_array());

    let response = post_json(
        common::build_test_app(pool),
        &format!("/api/v1/properties/{}/detail-form", fx.property_id),
        json!({"detail_headline_en": "Sea view", "detail_area": "1234567890.25"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let area = form_field(&json["data"], "detail_area")["initial"].as_str().unwrap();
    assert!(area.starts_with("1234567890.25"), "unexpected area {area}");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn related_key_replaces_related_properties(pool: PgPool) {
    let fx = seed(&pool).await;
    let b = id_of(
        &create(
            &pool,
            "/api/v1/properties",
            json!({"property_group_id": fx.group_id, "reference": "TW-200"}),
        )
        .await,
    );
    let c = id_of(
        &create(
            &pool,
            "/api/v1/properties",
            json!({"property_group_id": fx.group_id, "reference": "TW-300"}),
        )
        .await,
    );

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/properties/{}/detail-form", fx.property_id),
        json!({"detail_headline_en": "Sea view", "related": [c, b]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/properties/{}", fx.property_id),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["related"], json!([b, c]));

    // An unknown id rolls back the whole save.
    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/properties/{}/detail-form", fx.property_id),
        json!({"detail_headline_en": "Harbour view", "related": [b, 999999]}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/properties/{}", fx.property_id),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["related"], json!([b, c]));

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/properties/{}/details", fx.property_id),
    )
    .await;
    let tree = body_json(response).await["data"].clone();
    assert_eq!(tree_value(&tree, "headline").unwrap(), "Sea view");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unsupported_language_returns_400(pool: PgPool) {
    let fx = seed(&pool).await;

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/properties/{}/details?lang=fr", fx.property_id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Details and groups
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn detail_type_is_frozen_once_values_exist(pool: PgPool) {
    let fx = seed(&pool).await;

    // No values yet: the type may still change, and back.
    let response = put_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/details/{}", fx.color_id),
        json!({"detail_type": "options"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = put_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/details/{}", fx.color_id),
        json!({"detail_type": "option"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/properties/{}/detail-form", fx.property_id),
        json!({"detail_color": fx.red_id, "detail_headline_en": "Sea view"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = put_json(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/details/{}", fx.color_id),
        json!({"detail_type": "text"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Renaming without a type change is still allowed.
    let response = put_json(
        common::build_test_app(pool),
        &format!("/api/v1/details/{}", fx.color_id),
        json!({"name": "Colour", "detail_type": "option"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Colour");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn clashing_field_names_are_refused_on_bind(pool: PgPool) {
    let fx = seed(&pool).await;

    let dashed = create_detail(&pool, &fx, "sea-view", "integer").await;
    let underscored = create_detail(&pool, &fx, "sea_view", "integer").await;
    let headline_en = create_detail(&pool, &fx, "headline_en", "text").await;

    assert_eq!(bind(&pool, &fx, dashed).await, StatusCode::CREATED);
    assert_eq!(bind(&pool, &fx, underscored).await, StatusCode::CONFLICT);
    assert_eq!(bind(&pool, &fx, headline_en).await, StatusCode::CONFLICT);

    // Re-binding the same detail is an update, not a clash.
    assert_eq!(bind(&pool, &fx, dashed).await, StatusCode::CREATED);

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/properties/{}/detail-form", fx.property_id),
    )
    .await;
    let json = body_json(response).await;
    let names: Vec<&str> = json["data"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["name"].as_str())
        .filter(|n| n.starts_with("detail_sea"))
        .collect();
    assert_eq!(names, ["detail_sea_view"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn options_are_refused_for_plain_details(pool: PgPool) {
    let category = create(
        &pool,
        "/api/v1/detail-categories",
        json!({"name": "Overview", "slug": "overview"}),
    )
    .await;
    let detail = create(
        &pool,
        "/api/v1/details",
        json!({"category_id": id_of(&category), "name": "Notes", "slug": "notes", "detail_type": "text"}),
    )
    .await;

    let response = post_json(
        common::build_test_app(pool),
        &format!("/api/v1/details/{}/options", id_of(&detail)),
        json!({"name": "Blue", "slug": "blue"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_detail_slug_reports_field_error(pool: PgPool) {
    let category = create(
        &pool,
        "/api/v1/detail-categories",
        json!({"name": "Overview", "slug": "overview"}),
    )
    .await;

    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/details",
        json!({"category_id": id_of(&category), "name": "Notes", "slug": "Not A Slug", "detail_type": "text"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["fields"]["slug"].is_array());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn group_sections_and_filters(pool: PgPool) {
    let fx = seed(&pool).await;

    let response = get(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/property-groups/{}/details", fx.group_id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let sections = json["data"].as_array().unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0]["name"], "Basics");
    let slugs: Vec<&str> = sections[0]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["detail"]["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, ["headline", "color", "bedrooms"]);

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/property-groups/{}/filters", fx.group_id),
    )
    .await;
    let json = body_json(response).await;
    let filters: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["detail"]["slug"].as_str().unwrap())
        .collect();
    assert_eq!(filters, ["color", "bedrooms"]);
}
