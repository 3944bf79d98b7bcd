//! Detail grouping: which details a property group exposes, how they are
//! partitioned into sections, and the nested category/section/value tree
//! the API returns for a property.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::detail_type::DetailType;
use crate::detail_value::{DetailValue, StoredValue};
use crate::types::DbId;

/// Section name used when a binding has none.
pub const DEFAULT_SECTION: &str = "General";

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// A detail definition (attribute in the EAV sense).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailDef {
    pub id: DbId,
    pub category_id: DbId,
    pub name: String,
    pub slug: String,
    pub detail_type: DetailType,
    pub unit: Option<String>,
    pub help_text: Option<String>,
}

/// An enumerated choice for option-typed details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDef {
    pub id: DbId,
    pub detail_id: DbId,
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
}

/// An admin tab grouping details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDef {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
}

/// A detail bound to a property group, with its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDetail {
    /// Primary key of the `property_group_details` row.
    pub id: DbId,
    pub property_group_id: DbId,
    pub detail: DetailDef,
    pub options: Vec<OptionDef>,
    pub section: Option<String>,
    pub is_required: bool,
    pub is_filter: bool,
    pub sort_order: i32,
}

impl GroupDetail {
    pub fn section_name(&self) -> &str {
        self.section
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_SECTION)
    }

    pub fn find_option(&self, id: DbId) -> Option<&OptionDef> {
        self.options.iter().find(|o| o.id == id)
    }
}

/// A named run of bindings for display.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    pub name: &'a str,
    pub details: Vec<&'a GroupDetail>,
}

// ---------------------------------------------------------------------------
// Partitioning
// ---------------------------------------------------------------------------

fn sort_bindings(bindings: &mut [&GroupDetail]) {
    bindings.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.detail.name.cmp(&b.detail.name))
    });
}

/// Partition bindings into sections, in order of first appearance. Within
/// a section, bindings are ordered by `sort_order` then detail name.
pub fn sections(bindings: &[GroupDetail]) -> Vec<Section<'_>> {
    let mut out: Vec<Section<'_>> = Vec::new();
    for binding in bindings {
        let name = binding.section_name();
        match out.iter_mut().find(|s| s.name == name) {
            Some(section) => section.details.push(binding),
            None => out.push(Section {
                name,
                details: vec![binding],
            }),
        }
    }
    for section in &mut out {
        sort_bindings(&mut section.details);
    }
    out
}

/// Bindings flagged as search filters, in display order.
pub fn filterable(bindings: &[GroupDetail]) -> Vec<&GroupDetail> {
    let mut out: Vec<&GroupDetail> = bindings.iter().filter(|b| b.is_filter).collect();
    sort_bindings(&mut out);
    out
}

/// Bindings whose detail belongs to `category_id`, in display order.
pub fn in_category(bindings: &[GroupDetail], category_id: DbId) -> Vec<&GroupDetail> {
    let mut out: Vec<&GroupDetail> = bindings
        .iter()
        .filter(|b| b.detail.category_id == category_id)
        .collect();
    sort_bindings(&mut out);
    out
}

// ---------------------------------------------------------------------------
// Read tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DetailNode {
    pub slug: String,
    pub name: String,
    pub detail_type: DetailType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionNode {
    pub name: String,
    pub details: Vec<DetailNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    pub slug: String,
    pub name: String,
    pub sections: Vec<SectionNode>,
}

fn option_json(option: &OptionDef) -> Value {
    json!({ "id": option.id, "name": option.name, "slug": option.slug })
}

/// Render one binding's value for the API, resolving option ids to option
/// records and picking the requested language for translatable details.
/// Returns `None` for blank values.
pub fn render_value(
    binding: &GroupDetail,
    stored: &StoredValue,
    language: Option<&str>,
) -> Option<Value> {
    let detail_type = binding.detail.detail_type;

    if detail_type.is_translatable() {
        if let Some(text) = language.and_then(|lang| stored.translation(lang)) {
            return Some(json!(text));
        }
    }

    let value = stored.get_value(detail_type);
    if value.is_blank() {
        return None;
    }
    let rendered = match value {
        DetailValue::Choice(Some(id)) => binding.find_option(id).map(option_json)?,
        DetailValue::Choices(ids) => Value::Array(
            ids.iter()
                .filter_map(|id| binding.find_option(*id))
                .map(option_json)
                .collect(),
        ),
        other => other.to_json(),
    };
    Some(rendered)
}

/// Build the nested category -> section -> detail tree for one property.
///
/// `values` is keyed by `property_group_details.id`. Blank values are
/// omitted, and so are sections and categories left empty.
pub fn build_detail_tree(
    categories: &[CategoryDef],
    bindings: &[GroupDetail],
    values: &HashMap<DbId, StoredValue>,
    language: Option<&str>,
) -> Vec<CategoryNode> {
    let mut ordered: Vec<&CategoryDef> = categories.iter().collect();
    ordered.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));

    let mut tree = Vec::new();
    for category in ordered {
        let in_cat: Vec<GroupDetail> = in_category(bindings, category.id)
            .into_iter()
            .cloned()
            .collect();

        let mut section_nodes = Vec::new();
        for section in sections(&in_cat) {
            let details: Vec<DetailNode> = section
                .details
                .iter()
                .filter_map(|binding| {
                    let stored = values.get(&binding.id)?;
                    let value = render_value(binding, stored, language)?;
                    Some(DetailNode {
                        slug: binding.detail.slug.clone(),
                        name: binding.detail.name.clone(),
                        detail_type: binding.detail.detail_type,
                        unit: binding.detail.unit.clone(),
                        value,
                    })
                })
                .collect();
            if !details.is_empty() {
                section_nodes.push(SectionNode {
                    name: section.name.to_string(),
                    details,
                });
            }
        }

        if !section_nodes.is_empty() {
            tree.push(CategoryNode {
                slug: category.slug.clone(),
                name: category.name.clone(),
                sections: section_nodes,
            });
        }
    }
    tree
}
