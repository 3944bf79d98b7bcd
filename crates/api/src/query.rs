//! Shared query parameter types for API handlers.

use serde::Deserialize;
use tripwix_core::component::{CollectionKind, ComponentFilter};
use tripwix_core::types::DbId;

/// `?include=hero,text&exclude=footer` on collection reads.
#[derive(Debug, Default, Deserialize)]
pub struct ComponentFilterParams {
    pub include: Option<String>,
    pub exclude: Option<String>,
    /// Narrows slug lookups to one collection kind.
    pub kind: Option<CollectionKind>,
}

impl ComponentFilterParams {
    pub fn filter(&self) -> ComponentFilter {
        ComponentFilter::from_params(self.include.as_deref(), self.exclude.as_deref())
    }
}

/// `?category=` on detail forms and detail listings.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryParams {
    pub category: Option<DbId>,
}

/// `?lang=` on translated reads.
#[derive(Debug, Default, Deserialize)]
pub struct LanguageParams {
    pub lang: Option<String>,
}

/// `?file_name=` on raw uploads.
#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub file_name: String,
}
