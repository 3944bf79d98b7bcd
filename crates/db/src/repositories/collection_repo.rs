//! Repository for `collections` and `collection_blocks`.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use sqlx::PgPool;
use tripwix_core::component::{merge_fields_data, prune_fields_data, BlockDef, CollectionKind};
use tripwix_core::types::DbId;

use crate::models::component::{Collection, CollectionBlock, CreateCollection, CreateCollectionBlock};
use crate::repositories::ComponentRepo;

const COLUMNS: &str = "id, kind, title, slug, fields_data_json, created_at, updated_at";

const BLOCK_COLUMNS: &str = "id, collection_id, component_id, sort_order, created_at, updated_at";

/// Provides data access for collections and their component blocks.
pub struct CollectionRepo;

impl CollectionRepo {
    pub async fn create(pool: &PgPool, input: &CreateCollection) -> Result<Collection, sqlx::Error> {
        let query = format!(
            "INSERT INTO collections (kind, title, slug) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Collection>(&query)
            .bind(input.kind.as_str())
            .bind(&input.title)
            .bind(&input.slug)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Collection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM collections WHERE id = $1");
        sqlx::query_as::<_, Collection>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Look a collection up by slug. Without a kind, pages win over blogs
    /// and experiences sharing the slug.
    pub async fn find_by_slug(
        pool: &PgPool,
        slug: &str,
        kind: Option<CollectionKind>,
    ) -> Result<Option<Collection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM collections \
             WHERE slug = $1 AND ($2::TEXT IS NULL OR kind = $2) \
             ORDER BY CASE kind WHEN 'page' THEN 0 WHEN 'blog' THEN 1 ELSE 2 END \
             LIMIT 1"
        );
        sqlx::query_as::<_, Collection>(&query)
            .bind(slug)
            .bind(kind.map(|k| k.as_str()))
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Collection>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM collections WHERE id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, Collection>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Blocks
    // -----------------------------------------------------------------------

    pub async fn add_block(
        pool: &PgPool,
        collection_id: DbId,
        input: &CreateCollectionBlock,
    ) -> Result<CollectionBlock, sqlx::Error> {
        let query = format!(
            "INSERT INTO collection_blocks (collection_id, component_id, sort_order) \
             VALUES ($1, $2, COALESCE($3, \
                 (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM collection_blocks WHERE collection_id = $1))) \
             RETURNING {BLOCK_COLUMNS}"
        );
        sqlx::query_as::<_, CollectionBlock>(&query)
            .bind(collection_id)
            .bind(input.component_id)
            .bind(input.sort_order)
            .fetch_one(pool)
            .await
    }

    pub async fn list_blocks(
        pool: &PgPool,
        collection_id: DbId,
    ) -> Result<Vec<CollectionBlock>, sqlx::Error> {
        let query = format!(
            "SELECT {BLOCK_COLUMNS} FROM collection_blocks \
             WHERE collection_id = $1 ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, CollectionBlock>(&query)
            .bind(collection_id)
            .fetch_all(pool)
            .await
    }

    /// Blocks with their full component definitions, in display order.
    pub async fn load_blocks(
        pool: &PgPool,
        collection_id: DbId,
    ) -> Result<Vec<BlockDef>, sqlx::Error> {
        let blocks = Self::list_blocks(pool, collection_id).await?;
        let component_ids: Vec<DbId> = blocks
            .iter()
            .map(|b| b.component_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let components = ComponentRepo::load_definitions(pool, &component_ids).await?;

        Ok(blocks
            .into_iter()
            .filter_map(|block| {
                let component = components.get(&block.component_id)?.clone();
                Some(BlockDef {
                    id: block.id,
                    sort_order: block.sort_order,
                    component,
                })
            })
            .collect())
    }

    /// Merge newly collected block values into `fields_data_json` and drop
    /// keys of blocks that no longer exist. The row is locked for the
    /// read-modify-write.
    ///
    /// Returns `None` if no collection with the given ID exists.
    pub async fn write_fields_data(
        pool: &PgPool,
        id: DbId,
        values: Map<String, Value>,
    ) -> Result<Option<Collection>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let existing: Option<Value> = sqlx::query_scalar(
            "SELECT fields_data_json FROM collections WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(existing) = existing else {
            return Ok(None);
        };

        let live: BTreeSet<DbId> =
            sqlx::query_scalar::<_, DbId>("SELECT id FROM collection_blocks WHERE collection_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .collect();

        let merged = prune_fields_data(&merge_fields_data(&existing, values), &live);

        let query = format!(
            "UPDATE collections SET fields_data_json = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        let collection = sqlx::query_as::<_, Collection>(&query)
            .bind(id)
            .bind(&merged)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(collection_id = id, "Collection fields data written");
        Ok(Some(collection))
    }
}
