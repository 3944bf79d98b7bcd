//! Repositories for components, their fields and field options, plus the
//! `media_images` table referenced by image fields.

use std::collections::HashMap;

use sqlx::PgPool;
use tripwix_core::component::{ComponentDef, ComponentFieldDef, FieldOptionDef};
use tripwix_core::types::DbId;

use crate::models::component::{
    Component, ComponentField, ComponentFieldOption, CreateComponent, CreateComponentField,
    CreateFieldOption, CreateMediaImage, LinkedField, MediaImage,
};

const COMPONENT_COLUMNS: &str = "id, name, slug, created_at, updated_at";

const FIELD_COLUMNS: &str = "id, name, slug, field_type, help_text, created_at, updated_at";

const OPTION_COLUMNS: &str = "id, field_id, label, value, sort_order";

const IMAGE_COLUMNS: &str = "id, file_path, alt_text, created_at, updated_at";

/// Provides data access for components and their field definitions.
pub struct ComponentRepo;

impl ComponentRepo {
    pub async fn create(pool: &PgPool, input: &CreateComponent) -> Result<Component, sqlx::Error> {
        let query = format!(
            "INSERT INTO components (name, slug) VALUES ($1, $2) RETURNING {COMPONENT_COLUMNS}"
        );
        sqlx::query_as::<_, Component>(&query)
            .bind(&input.name)
            .bind(&input.slug)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Component>, sqlx::Error> {
        let query = format!("SELECT {COMPONENT_COLUMNS} FROM components WHERE id = $1");
        sqlx::query_as::<_, Component>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create_field(
        pool: &PgPool,
        input: &CreateComponentField,
    ) -> Result<ComponentField, sqlx::Error> {
        let query = format!(
            "INSERT INTO component_fields (name, slug, field_type, help_text) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {FIELD_COLUMNS}"
        );
        sqlx::query_as::<_, ComponentField>(&query)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(input.field_type.as_str())
            .bind(&input.help_text)
            .fetch_one(pool)
            .await
    }

    pub async fn find_field(pool: &PgPool, id: DbId) -> Result<Option<ComponentField>, sqlx::Error> {
        let query = format!("SELECT {FIELD_COLUMNS} FROM component_fields WHERE id = $1");
        sqlx::query_as::<_, ComponentField>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Attach a field to a component, or update the existing link.
    pub async fn link_field(
        pool: &PgPool,
        component_id: DbId,
        field_id: DbId,
        is_required: bool,
        sort_order: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO component_field_links (component_id, field_id, is_required, sort_order) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (component_id, field_id) DO UPDATE SET \
                 is_required = EXCLUDED.is_required, \
                 sort_order = EXCLUDED.sort_order",
        )
        .bind(component_id)
        .bind(field_id)
        .bind(is_required)
        .bind(sort_order)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn create_field_option(
        pool: &PgPool,
        field_id: DbId,
        input: &CreateFieldOption,
    ) -> Result<ComponentFieldOption, sqlx::Error> {
        let query = format!(
            "INSERT INTO component_field_options (field_id, label, value, sort_order) \
             VALUES ($1, $2, $3, COALESCE($4, 0)) \
             RETURNING {OPTION_COLUMNS}"
        );
        sqlx::query_as::<_, ComponentFieldOption>(&query)
            .bind(field_id)
            .bind(&input.label)
            .bind(&input.value)
            .bind(input.sort_order)
            .fetch_one(pool)
            .await
    }

    /// Load full definitions (fields and options) for a set of components.
    /// Three queries regardless of how many components are requested.
    pub async fn load_definitions(
        pool: &PgPool,
        component_ids: &[DbId],
    ) -> Result<HashMap<DbId, ComponentDef>, sqlx::Error> {
        let query = format!(
            "SELECT {COMPONENT_COLUMNS} FROM components WHERE id = ANY($1) ORDER BY id"
        );
        let components = sqlx::query_as::<_, Component>(&query)
            .bind(component_ids)
            .fetch_all(pool)
            .await?;

        let fields = sqlx::query_as::<_, LinkedField>(
            "SELECT l.component_id, f.id AS field_id, f.name, f.slug, f.field_type, \
                    f.help_text, l.is_required, l.sort_order \
             FROM component_field_links l \
             JOIN component_fields f ON f.id = l.field_id \
             WHERE l.component_id = ANY($1) \
             ORDER BY l.component_id, l.sort_order, f.id",
        )
        .bind(component_ids)
        .fetch_all(pool)
        .await?;

        let field_ids: Vec<DbId> = fields.iter().map(|f| f.field_id).collect();
        let query = format!(
            "SELECT {OPTION_COLUMNS} FROM component_field_options \
             WHERE field_id = ANY($1) ORDER BY field_id, sort_order, id"
        );
        let mut options: HashMap<DbId, Vec<FieldOptionDef>> = HashMap::new();
        for option in sqlx::query_as::<_, ComponentFieldOption>(&query)
            .bind(&field_ids)
            .fetch_all(pool)
            .await?
        {
            options.entry(option.field_id).or_default().push(option.into());
        }

        let mut defs: HashMap<DbId, ComponentDef> = components
            .into_iter()
            .map(|c| {
                let def = ComponentDef {
                    id: c.id,
                    name: c.name,
                    slug: c.slug,
                    fields: Vec::new(),
                };
                (c.id, def)
            })
            .collect();

        for field in fields {
            let field_type = field.kind().map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
            let Some(def) = defs.get_mut(&field.component_id) else {
                continue;
            };
            def.fields.push(ComponentFieldDef {
                id: field.field_id,
                name: field.name,
                slug: field.slug,
                field_type,
                help_text: field.help_text,
                is_required: field.is_required,
                sort_order: field.sort_order,
                // Shared fields carry the same options in every component.
                options: options.get(&field.field_id).cloned().unwrap_or_default(),
            });
        }

        Ok(defs)
    }
}

/// Provides data access for uploaded images.
pub struct MediaImageRepo;

impl MediaImageRepo {
    pub async fn create(pool: &PgPool, input: &CreateMediaImage) -> Result<MediaImage, sqlx::Error> {
        let query = format!(
            "INSERT INTO media_images (file_path, alt_text) VALUES ($1, $2) \
             RETURNING {IMAGE_COLUMNS}"
        );
        sqlx::query_as::<_, MediaImage>(&query)
            .bind(&input.file_path)
            .bind(&input.alt_text)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<MediaImage>, sqlx::Error> {
        let query = format!("SELECT {IMAGE_COLUMNS} FROM media_images WHERE id = ANY($1)");
        sqlx::query_as::<_, MediaImage>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }
}
