//! Batched lookups for entities referenced from component block values.
//!
//! One query per referenced model, whatever the number of blocks.

use std::collections::{BTreeSet, HashMap};

use sqlx::PgPool;
use tripwix_core::component::{EntitySummary, ImageRef, ReferenceRequest, ResolvedReferences};
use tripwix_core::types::DbId;

use crate::repositories::{CollectionRepo, MediaImageRepo, PropertyRepo};

/// Resolves a [`ReferenceRequest`] against the database.
pub struct ReferenceRepo;

impl ReferenceRepo {
    pub async fn resolve(
        pool: &PgPool,
        request: &ReferenceRequest,
        media_url: &str,
    ) -> Result<ResolvedReferences, sqlx::Error> {
        let mut resolved = ResolvedReferences::default();
        if request.is_empty() {
            return Ok(resolved);
        }

        if !request.images.is_empty() {
            resolved.images = Self::images(pool, &to_vec(&request.images), media_url).await?;
        }
        if !request.properties.is_empty() {
            resolved.properties = Self::properties(pool, &to_vec(&request.properties)).await?;
        }
        if !request.collections.is_empty() {
            resolved.collections = Self::collections(pool, &to_vec(&request.collections)).await?;
        }

        tracing::debug!(
            images = resolved.images.len(),
            properties = resolved.properties.len(),
            collections = resolved.collections.len(),
            "References resolved",
        );
        Ok(resolved)
    }

    pub async fn images(
        pool: &PgPool,
        ids: &[DbId],
        media_url: &str,
    ) -> Result<HashMap<DbId, ImageRef>, sqlx::Error> {
        Ok(MediaImageRepo::find_by_ids(pool, ids)
            .await?
            .into_iter()
            .map(|img| {
                let image = ImageRef::new(img.id, &img.file_path, img.alt_text, media_url);
                (img.id, image)
            })
            .collect())
    }

    pub async fn properties(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<HashMap<DbId, EntitySummary>, sqlx::Error> {
        Ok(PropertyRepo::find_by_ids(pool, ids)
            .await?
            .into_iter()
            .map(|p| {
                let summary = EntitySummary::property(p.id, p.title().to_string(), p.slug.clone());
                (p.id, summary)
            })
            .collect())
    }

    /// Collections with an unknown kind are skipped.
    pub async fn collections(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<HashMap<DbId, EntitySummary>, sqlx::Error> {
        Ok(CollectionRepo::find_by_ids(pool, ids)
            .await?
            .into_iter()
            .filter_map(|c| {
                let kind = c.collection_kind().ok()?;
                Some((c.id, EntitySummary::collection(c.id, kind, c.title, c.slug)))
            })
            .collect())
    }
}

fn to_vec(ids: &BTreeSet<DbId>) -> Vec<DbId> {
    ids.iter().copied().collect()
}
