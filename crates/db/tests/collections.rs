//! Integration tests for components, collections and forms.

use serde_json::{json, Map, Value};
use sqlx::PgPool;
use tripwix_core::component::{
    collect_block_values, collect_references, CollectionKind, ComponentFieldType, ComponentFilter,
};
use tripwix_core::component_form::FormInputType;
use tripwix_core::types::DbId;
use tripwix_db::models::component::{
    CreateCollection, CreateCollectionBlock, CreateComponent, CreateComponentField,
    CreateFieldOption, CreateMediaImage,
};
use tripwix_db::models::component_form::{CreateComponentForm, CreateFormField};
use tripwix_db::repositories::{
    CollectionRepo, ComponentFormRepo, ComponentRepo, MediaImageRepo, ReferenceRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn add_field(
    pool: &PgPool,
    component_id: DbId,
    slug: &str,
    field_type: ComponentFieldType,
    required: bool,
    sort_order: i32,
) -> DbId {
    let field = ComponentRepo::create_field(
        pool,
        &CreateComponentField {
            name: slug.to_string(),
            slug: slug.to_string(),
            field_type,
            help_text: None,
        },
    )
    .await
    .unwrap();
    ComponentRepo::link_field(pool, component_id, field.id, required, sort_order)
        .await
        .unwrap();
    field.id
}

/// A "hero" component (title, layout option, image) on a page.
async fn seed_page(pool: &PgPool) -> (DbId, DbId) {
    let hero = ComponentRepo::create(
        pool,
        &CreateComponent {
            name: "Hero".into(),
            slug: "hero".into(),
        },
    )
    .await
    .unwrap();
    add_field(pool, hero.id, "title", ComponentFieldType::Text, true, 0).await;
    let layout = add_field(pool, hero.id, "layout", ComponentFieldType::Option, false, 1).await;
    ComponentRepo::create_field_option(
        pool,
        layout,
        &CreateFieldOption {
            label: "Left".into(),
            value: "left".into(),
            sort_order: None,
        },
    )
    .await
    .unwrap();
    add_field(pool, hero.id, "image", ComponentFieldType::Image, false, 2).await;

    let page = CollectionRepo::create(
        pool,
        &CreateCollection {
            kind: CollectionKind::Page,
            title: "Home".into(),
            slug: "home".into(),
        },
    )
    .await
    .unwrap();
    CollectionRepo::add_block(
        pool,
        page.id,
        &CreateCollectionBlock {
            component_id: hero.id,
            sort_order: None,
        },
    )
    .await
    .unwrap();

    (page.id, hero.id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_load_blocks_assembles_definitions(pool: PgPool) {
    let (page_id, _) = seed_page(&pool).await;

    let blocks = CollectionRepo::load_blocks(&pool, page_id).await.unwrap();
    assert_eq!(blocks.len(), 1);
    let slugs: Vec<&str> = blocks[0]
        .component
        .fields
        .iter()
        .map(|f| f.slug.as_str())
        .collect();
    assert_eq!(slugs, vec!["title", "layout", "image"]);
    assert_eq!(blocks[0].component.fields[1].options.len(), 1);
    assert!(blocks[0].component.fields[0].is_required);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_write_fields_data_merges_and_prunes(pool: PgPool) {
    let (page_id, _) = seed_page(&pool).await;
    let blocks = CollectionRepo::load_blocks(&pool, page_id).await.unwrap();
    let block_id = blocks[0].id;

    sqlx::query("UPDATE collections SET fields_data_json = $2 WHERE id = $1")
        .bind(page_id)
        .bind(json!({ "b999999-title": "Orphan", "seo_title": "Home" }))
        .execute(&pool)
        .await
        .unwrap();

    let mut submitted = Map::new();
    submitted.insert(format!("b{block_id}-title"), json!("Welcome"));
    let values = collect_block_values(&blocks, &submitted).unwrap();
    let collection = CollectionRepo::write_fields_data(&pool, page_id, values)
        .await
        .unwrap()
        .unwrap();

    let data = collection.fields_data_json;
    assert_eq!(data[format!("b{block_id}-title")], "Welcome");
    assert_eq!(data["seo_title"], "Home");
    assert!(data.get("b999999-title").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_write_fields_data_missing_collection(pool: PgPool) {
    let result = CollectionRepo::write_fields_data(&pool, 999_999, Map::new())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_references_resolve_in_batches(pool: PgPool) {
    let (page_id, _) = seed_page(&pool).await;
    let blocks = CollectionRepo::load_blocks(&pool, page_id).await.unwrap();
    let image = MediaImageRepo::create(
        &pool,
        &CreateMediaImage {
            file_path: "images/pool.jpg".into(),
            alt_text: Some("Pool".into()),
        },
    )
    .await
    .unwrap();

    let mut data = Map::new();
    data.insert(format!("b{}-image", blocks[0].id), Value::from(image.id));

    let request = collect_references(&blocks, &data, &ComponentFilter::default());
    let refs = ReferenceRepo::resolve(&pool, &request, "/media/").await.unwrap();
    assert_eq!(refs.images[&image.id].url, "/media/images/pool.jpg");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_by_slug_prefers_pages(pool: PgPool) {
    CollectionRepo::create(
        &pool,
        &CreateCollection {
            kind: CollectionKind::Blog,
            title: "About (blog)".into(),
            slug: "about".into(),
        },
    )
    .await
    .unwrap();
    let page = CollectionRepo::create(
        &pool,
        &CreateCollection {
            kind: CollectionKind::Page,
            title: "About".into(),
            slug: "about".into(),
        },
    )
    .await
    .unwrap();

    let found = CollectionRepo::find_by_slug(&pool, "about", None).await.unwrap().unwrap();
    assert_eq!(found.id, page.id);

    let blog = CollectionRepo::find_by_slug(&pool, "about", Some(CollectionKind::Blog))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(blog.kind, "blog");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_form_fields_and_submissions(pool: PgPool) {
    let form = ComponentFormRepo::create(
        &pool,
        &CreateComponentForm {
            name: "Contact".into(),
            slug: "contact".into(),
        },
    )
    .await
    .unwrap();
    ComponentFormRepo::add_field(
        &pool,
        form.id,
        &CreateFormField {
            name: "Email".into(),
            slug: "email".into(),
            field_type: FormInputType::Email,
            is_required: true,
            sort_order: Some(1),
            choices: vec![],
        },
    )
    .await
    .unwrap();

    let loaded = ComponentFormRepo::find_by_slug(&pool, "contact").await.unwrap().unwrap();
    assert_eq!(loaded.fields.len(), 1);
    assert_eq!(loaded.fields[0].to_def().unwrap().field_type, FormInputType::Email);

    let data = json!({ "email": "ana@example.com" });
    ComponentFormRepo::create_submission(&pool, form.id, data.as_object().unwrap())
        .await
        .unwrap();
    let submissions = ComponentFormRepo::list_submissions(&pool, form.id).await.unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].data["email"], "ana@example.com");
}
