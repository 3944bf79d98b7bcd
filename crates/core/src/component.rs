//! Component/collection JSON value pipeline.
//!
//! A collection (page, blog post, experience) is an ordered list of blocks;
//! each block instantiates a component, which is a reusable set of typed
//! fields. Block values live in one JSON object on the collection, keyed by
//! `b{block_id}-{field_slug}`.
//!
//! The write side validates submitted values per field type and normalizes
//! them to JSON. The read side walks the same keys to rebuild a nested
//! block/field/value tree, resolving references (options, images, linked
//! entities, calls to action) against lookups fetched in batches.
//!
//! This module has **zero database dependencies**.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::detail_value::parse_time;
use crate::error::{FieldErrors, INVALID_CHOICE_MESSAGE, REQUIRED_MESSAGE};
use crate::types::DbId;

static BLOCK_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^b([0-9]+)-([A-Za-z0-9_-]+)$").expect("valid regex"));

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Field types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentFieldType {
    Text,
    Textarea,
    RichText,
    Boolean,
    Number,
    Integer,
    Date,
    Time,
    Datetime,
    Color,
    Url,
    Option,
    Options,
    Image,
    File,
    App,
    Cta,
}

const ALL_FIELD_TYPES: [ComponentFieldType; 17] = [
    ComponentFieldType::Text,
    ComponentFieldType::Textarea,
    ComponentFieldType::RichText,
    ComponentFieldType::Boolean,
    ComponentFieldType::Number,
    ComponentFieldType::Integer,
    ComponentFieldType::Date,
    ComponentFieldType::Time,
    ComponentFieldType::Datetime,
    ComponentFieldType::Color,
    ComponentFieldType::Url,
    ComponentFieldType::Option,
    ComponentFieldType::Options,
    ComponentFieldType::Image,
    ComponentFieldType::File,
    ComponentFieldType::App,
    ComponentFieldType::Cta,
];

impl ComponentFieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::RichText => "rich_text",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Date => "date",
            Self::Time => "time",
            Self::Datetime => "datetime",
            Self::Color => "color",
            Self::Url => "url",
            Self::Option => "option",
            Self::Options => "options",
            Self::Image => "image",
            Self::File => "file",
            Self::App => "app",
            Self::Cta => "cta",
        }
    }
}

impl fmt::Display for ComponentFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown component field type: {0}")]
pub struct UnknownFieldType(pub String);

impl FromStr for ComponentFieldType {
    type Err = UnknownFieldType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_FIELD_TYPES
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownFieldType(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOptionDef {
    pub id: DbId,
    pub field_id: DbId,
    pub label: String,
    pub value: String,
    pub sort_order: i32,
}

/// A field as it appears inside one component (definition plus the
/// component-specific required flag and ordering).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentFieldDef {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub field_type: ComponentFieldType,
    pub help_text: Option<String>,
    pub is_required: bool,
    pub sort_order: i32,
    #[serde(default)]
    pub options: Vec<FieldOptionDef>,
}

impl ComponentFieldDef {
    fn find_option(&self, id: DbId) -> Option<&FieldOptionDef> {
        self.options.iter().find(|o| o.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDef {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub fields: Vec<ComponentFieldDef>,
}

/// One block of a collection: a positioned instance of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDef {
    pub id: DbId,
    pub sort_order: i32,
    pub component: ComponentDef,
}

/// Sort blocks by position, then id.
pub fn ordered_blocks(blocks: &[BlockDef]) -> Vec<&BlockDef> {
    let mut out: Vec<&BlockDef> = blocks.iter().collect();
    out.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.cmp(&b.id)));
    out
}

fn ordered_fields(component: &ComponentDef) -> Vec<&ComponentFieldDef> {
    let mut out: Vec<&ComponentFieldDef> = component.fields.iter().collect();
    out.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.cmp(&b.id)));
    out
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// `b{block_id}-{field_slug}`.
pub fn block_field_key(block_id: DbId, field_slug: &str) -> String {
    format!("b{block_id}-{field_slug}")
}

/// Split a `b{block_id}-{field_slug}` key.
pub fn parse_block_field_key(key: &str) -> Option<(DbId, &str)> {
    let caps = BLOCK_KEY_RE.captures(key)?;
    let block_id = caps.get(1)?.as_str().parse().ok()?;
    let slug = caps.get(2)?.as_str();
    Some((block_id, slug))
}

// ---------------------------------------------------------------------------
// Referenceable entities
// ---------------------------------------------------------------------------

/// The kinds of collection a CMS page can be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Page,
    Blog,
    Experience,
}

impl CollectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Blog => "blog",
            Self::Experience => "experience",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "page" => Some(Self::Page),
            "blog" => Some(Self::Blog),
            "experience" => Some(Self::Experience),
            _ => None,
        }
    }

    /// Public path of a collection of this kind.
    pub fn path(self, slug: &str) -> String {
        match self {
            Self::Page => format!("/{slug}"),
            Self::Blog => format!("/blog/{slug}"),
            Self::Experience => format!("/experiences/{slug}"),
        }
    }
}

/// A link to another entity stored by `app` and `cta` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Property(DbId),
    Collection(DbId),
}

/// Display data for a resolved [`EntityRef`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySummary {
    #[serde(rename = "type")]
    pub entity_type: &'static str,
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub path: String,
}

impl EntitySummary {
    pub fn property(id: DbId, title: String, slug: String) -> Self {
        let path = format!("/properties/{slug}");
        Self {
            entity_type: "property",
            id,
            title,
            slug,
            path,
        }
    }

    pub fn collection(id: DbId, kind: CollectionKind, title: String, slug: String) -> Self {
        let path = kind.path(&slug);
        Self {
            entity_type: "collection",
            id,
            title,
            slug,
            path,
        }
    }
}

/// A call to action: a label plus either an internal target or a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cta {
    pub label: String,
    #[serde(default)]
    pub target: Option<EntityRef>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub open_in_new_tab: bool,
}

/// A file already written to media storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upload {
    pub storage_path: String,
}

// ---------------------------------------------------------------------------
// Write side
// ---------------------------------------------------------------------------

/// A validated block field value, before JSON normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    Null,
    Text(String),
    Bool(bool),
    Decimal(Decimal),
    Integer(i64),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(DateTime<Utc>),
    Choice(DbId),
    Choices(Vec<DbId>),
    Upload(Upload),
    ModelRef(DbId),
    Entity(EntityRef),
    Cta(Cta),
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn parse_id(value: &Value) -> Option<DbId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_valid_url(s: &str) -> bool {
    s.starts_with("https://") || s.starts_with("http://") || s.starts_with('/') || s.starts_with("mailto:")
}

impl FieldInput {
    /// Validate a submitted JSON value against the field definition.
    pub fn from_json(field: &ComponentFieldDef, value: &Value) -> Result<Self, String> {
        use ComponentFieldType as F;

        if field.field_type == F::Boolean {
            return match value {
                Value::Null => Ok(Self::Bool(false)),
                Value::Bool(b) => Ok(Self::Bool(*b)),
                _ => Err("Enter a valid boolean.".to_string()),
            };
        }

        if is_empty(value) {
            if field.is_required {
                return Err(REQUIRED_MESSAGE.to_string());
            }
            return Ok(Self::Null);
        }

        match field.field_type {
            F::Text | F::Textarea | F::RichText => value
                .as_str()
                .map(|s| Self::Text(s.to_string()))
                .ok_or_else(|| "Enter a valid text value.".to_string()),
            F::Url => match value.as_str().map(str::trim) {
                Some(s) if is_valid_url(s) => Ok(Self::Text(s.to_string())),
                _ => Err("Enter a valid URL.".to_string()),
            },
            F::Color => match value.as_str() {
                Some(s) if HEX_COLOR_RE.is_match(s) => Ok(Self::Text(s.to_ascii_lowercase())),
                _ => Err("Enter a valid color.".to_string()),
            },
            F::Boolean => Ok(Self::Bool(value.as_bool().unwrap_or(false))),
            F::Number => {
                let parsed = match value {
                    Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
                    Value::String(s) => Decimal::from_str(s.trim()).ok(),
                    _ => None,
                };
                parsed.map(Self::Decimal).ok_or_else(|| "Enter a number.".to_string())
            }
            F::Integer => parse_id(value)
                .map(Self::Integer)
                .ok_or_else(|| "Enter a whole number.".to_string()),
            F::Date => value
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
                .map(Self::Date)
                .ok_or_else(|| "Enter a valid date.".to_string()),
            F::Time => value
                .as_str()
                .and_then(parse_time)
                .map(Self::Time)
                .ok_or_else(|| "Enter a valid time.".to_string()),
            F::Datetime => value
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
                .map(|dt| Self::DateTime(dt.with_timezone(&Utc)))
                .ok_or_else(|| "Enter a valid date/time.".to_string()),
            F::Option => {
                let id = parse_id(value).ok_or(INVALID_CHOICE_MESSAGE)?;
                field
                    .find_option(id)
                    .map(|_| Self::Choice(id))
                    .ok_or_else(|| INVALID_CHOICE_MESSAGE.to_string())
            }
            F::Options => {
                let items = match value {
                    Value::Array(items) => items.as_slice(),
                    other => std::slice::from_ref(other),
                };
                let mut ids = Vec::with_capacity(items.len());
                for item in items {
                    match parse_id(item).filter(|id| field.find_option(*id).is_some()) {
                        Some(id) => ids.push(id),
                        None => return Err(INVALID_CHOICE_MESSAGE.to_string()),
                    }
                }
                Ok(Self::Choices(ids))
            }
            F::Image => parse_id(value)
                .map(Self::ModelRef)
                .ok_or_else(|| "Select a valid image.".to_string()),
            F::File => match value {
                Value::String(path) => Ok(Self::Upload(Upload {
                    storage_path: path.trim().to_string(),
                })),
                Value::Object(_) => serde_json::from_value::<Upload>(value.clone())
                    .map(Self::Upload)
                    .map_err(|_| "Upload a valid file.".to_string()),
                _ => Err("Upload a valid file.".to_string()),
            },
            F::App => serde_json::from_value::<EntityRef>(value.clone())
                .map(Self::Entity)
                .map_err(|_| "Select a valid item.".to_string()),
            F::Cta => {
                let cta: Cta = serde_json::from_value(value.clone())
                    .map_err(|_| "Enter a valid call to action.".to_string())?;
                if cta.label.trim().is_empty() {
                    return Err("A call to action needs a label.".to_string());
                }
                match (&cta.target, cta.url.as_deref()) {
                    (None, None) => Err("A call to action needs a target or a URL.".to_string()),
                    (_, Some(url)) if !is_valid_url(url) => Err("Enter a valid URL.".to_string()),
                    _ => Ok(Self::Cta(cta)),
                }
            }
        }
    }

    /// JSON form stored in `fields_data_json`.
    pub fn normalize(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Text(s) => json!(s),
            Self::Bool(b) => json!(b),
            Self::Decimal(d) => json!(d.to_string()),
            Self::Integer(n) => json!(n),
            Self::Date(d) => json!(d.format("%Y-%m-%d").to_string()),
            Self::Time(t) => json!(t.format("%H:%M:%S").to_string()),
            Self::DateTime(dt) => json!(dt.to_rfc3339()),
            Self::Choice(id) | Self::ModelRef(id) => json!(id),
            Self::Choices(ids) => json!(ids),
            Self::Upload(upload) => json!(upload.storage_path),
            Self::Entity(entity) => serde_json::to_value(entity).unwrap_or(Value::Null),
            Self::Cta(cta) => serde_json::to_value(cta).unwrap_or(Value::Null),
        }
    }
}

/// Validate and normalize submitted values for every field of every
/// block. Errors are keyed by the block field key.
pub fn collect_block_values(
    blocks: &[BlockDef],
    submitted: &Map<String, Value>,
) -> Result<Map<String, Value>, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut out = Map::new();

    for block in ordered_blocks(blocks) {
        for field in ordered_fields(&block.component) {
            let key = block_field_key(block.id, &field.slug);
            let raw = submitted.get(&key).unwrap_or(&Value::Null);
            match FieldInput::from_json(field, raw) {
                Ok(input) => {
                    out.insert(key, input.normalize());
                }
                Err(message) => errors.add(key, message),
            }
        }
    }

    errors.into_result(out)
}

/// Merge newly collected values into the stored document; new keys win.
pub fn merge_fields_data(existing: &Value, new: Map<String, Value>) -> Value {
    let mut merged = existing.as_object().cloned().unwrap_or_default();
    merged.extend(new);
    Value::Object(merged)
}

/// Drop block keys whose block no longer exists. Keys that are not block
/// keys are kept.
pub fn prune_fields_data(data: &Value, live_blocks: &BTreeSet<DbId>) -> Value {
    let Some(obj) = data.as_object() else {
        return Value::Object(Map::new());
    };
    let kept = obj
        .iter()
        .filter(|(key, _)| match parse_block_field_key(key) {
            Some((block_id, _)) => live_blocks.contains(&block_id),
            None => true,
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Value::Object(kept)
}

// ---------------------------------------------------------------------------
// Read side
// ---------------------------------------------------------------------------

/// Which components to render, from `?include=a,b&exclude=c`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentFilter {
    pub include: Option<BTreeSet<String>>,
    pub exclude: BTreeSet<String>,
}

fn split_list(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl ComponentFilter {
    pub fn from_params(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include: include.map(split_list).filter(|set| !set.is_empty()),
            exclude: exclude.map(split_list).unwrap_or_default(),
        }
    }

    pub fn allows(&self, component_slug: &str) -> bool {
        if self.exclude.contains(component_slug) {
            return false;
        }
        self.include
            .as_ref()
            .map_or(true, |include| include.contains(component_slug))
    }
}

/// Ids to fetch before the tree can be built, batched per referenced model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceRequest {
    pub images: BTreeSet<DbId>,
    pub properties: BTreeSet<DbId>,
    pub collections: BTreeSet<DbId>,
}

impl ReferenceRequest {
    fn add_entity(&mut self, entity: EntityRef) {
        match entity {
            EntityRef::Property(id) => self.properties.insert(id),
            EntityRef::Collection(id) => self.collections.insert(id),
        };
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.properties.is_empty() && self.collections.is_empty()
    }
}

/// Resolved image record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRef {
    pub id: DbId,
    pub url: String,
    pub alt_text: Option<String>,
}

impl ImageRef {
    /// Build the public URL by joining `media_url` and the storage path.
    pub fn new(id: DbId, file_path: &str, alt_text: Option<String>, media_url: &str) -> Self {
        let url = format!(
            "{}/{}",
            media_url.trim_end_matches('/'),
            file_path.trim_start_matches('/')
        );
        Self { id, url, alt_text }
    }
}

/// Lookups filled from a [`ReferenceRequest`].
#[derive(Debug, Clone, Default)]
pub struct ResolvedReferences {
    pub images: HashMap<DbId, ImageRef>,
    pub properties: HashMap<DbId, EntitySummary>,
    pub collections: HashMap<DbId, EntitySummary>,
}

impl ResolvedReferences {
    pub fn entity(&self, entity: EntityRef) -> Option<&EntitySummary> {
        match entity {
            EntityRef::Property(id) => self.properties.get(&id),
            EntityRef::Collection(id) => self.collections.get(&id),
        }
    }
}

fn stored_entity(value: &Value) -> Option<EntityRef> {
    serde_json::from_value(value.clone()).ok()
}

fn stored_cta(value: &Value) -> Option<Cta> {
    serde_json::from_value(value.clone()).ok()
}

/// Scan the stored values of the rendered blocks for references.
pub fn collect_references(
    blocks: &[BlockDef],
    data: &Map<String, Value>,
    filter: &ComponentFilter,
) -> ReferenceRequest {
    let mut request = ReferenceRequest::default();

    for block in blocks.iter().filter(|b| filter.allows(&b.component.slug)) {
        for field in &block.component.fields {
            let Some(value) = data.get(&block_field_key(block.id, &field.slug)) else {
                continue;
            };
            match field.field_type {
                ComponentFieldType::Image => {
                    if let Some(id) = parse_id(value) {
                        request.images.insert(id);
                    }
                }
                ComponentFieldType::App => {
                    if let Some(entity) = stored_entity(value) {
                        request.add_entity(entity);
                    }
                }
                ComponentFieldType::Cta => {
                    if let Some(target) = stored_cta(value).and_then(|c| c.target) {
                        request.add_entity(target);
                    }
                }
                _ => {}
            }
        }
    }

    request
}

/// One rendered block.
#[derive(Debug, Clone, Serialize)]
pub struct BlockNode {
    pub id: DbId,
    pub component: String,
    pub name: String,
    pub fields: Map<String, Value>,
}

fn option_json(option: &FieldOptionDef) -> Value {
    json!({ "id": option.id, "label": option.label, "value": option.value })
}

fn resolve_value(field: &ComponentFieldDef, value: &Value, refs: &ResolvedReferences) -> Value {
    match field.field_type {
        ComponentFieldType::Option => parse_id(value)
            .and_then(|id| field.find_option(id))
            .map_or(Value::Null, option_json),
        ComponentFieldType::Options => Value::Array(
            value
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|v| parse_id(v).and_then(|id| field.find_option(id)))
                        .map(option_json)
                        .collect()
                })
                .unwrap_or_default(),
        ),
        ComponentFieldType::Image => parse_id(value)
            .and_then(|id| refs.images.get(&id))
            .map_or(Value::Null, |image| json!(image)),
        ComponentFieldType::App => stored_entity(value)
            .and_then(|entity| refs.entity(entity))
            .map_or(Value::Null, |summary| json!(summary)),
        ComponentFieldType::Cta => match stored_cta(value) {
            Some(cta) => {
                let target = cta.target.and_then(|t| refs.entity(t));
                let url = cta
                    .url
                    .clone()
                    .or_else(|| target.map(|t| t.path.clone()));
                json!({
                    "label": cta.label,
                    "url": url,
                    "style": cta.style,
                    "open_in_new_tab": cta.open_in_new_tab,
                    "target": target,
                })
            }
            None => Value::Null,
        },
        _ => value.clone(),
    }
}

/// Rebuild the nested block -> field -> value tree from the stored
/// document. Missing keys render as `null`.
pub fn build_component_tree(
    blocks: &[BlockDef],
    data: &Map<String, Value>,
    refs: &ResolvedReferences,
    filter: &ComponentFilter,
) -> Vec<BlockNode> {
    ordered_blocks(blocks)
        .into_iter()
        .filter(|block| filter.allows(&block.component.slug))
        .map(|block| {
            let mut fields = Map::new();
            for field in ordered_fields(&block.component) {
                let value = data
                    .get(&block_field_key(block.id, &field.slug))
                    .map_or(Value::Null, |v| resolve_value(field, v, refs));
                fields.insert(field.slug.clone(), value);
            }
            BlockNode {
                id: block.id,
                component: block.component.slug.clone(),
                name: block.component.name.clone(),
                fields,
            }
        })
        .collect()
}
