//! Dynamic detail form builder.
//!
//! Given the bindings of one detail category for a property group, this
//! synthesizes one form field per detail (one per language for
//! translatable details), pre-fills initial values from stored rows, and
//! cleans a submitted JSON payload into typed values ready to dispatch
//! through [`StoredValue::add_value`].
//!
//! Field names are `detail_{slug}` and `detail_{slug}_{lang}`, with dashes
//! in the slug replaced by underscores. A group never binds two details
//! whose field names coincide (see [`field_name_clash`]).

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::detail_type::{
    country_vat_choices, find_country_vat, DetailType, ValueTypeSelector, MAX_RATING,
    VALUE_TYPE_SELECTORS,
};
use crate::detail_value::{parse_time, RawValue, StoredValue, ValueError};
use crate::error::{FieldErrors, INVALID_CHOICE_MESSAGE, REQUIRED_MESSAGE};
use crate::grouping::GroupDetail;
use crate::languages::Languages;
use crate::types::DbId;

pub const FIELD_PREFIX: &str = "detail_";

/// Payload key that bypasses the detail mechanism and replaces the
/// property's related-properties set.
pub const RELATED_FIELD: &str = "related";

/// Maximum length for single-line text fields.
pub const MAX_TEXT_LENGTH: usize = 255;

/// Precision of `value_number` (`NUMERIC(14, 4)`).
pub const NUMBER_MAX_DIGITS: u32 = 14;
pub const NUMBER_DECIMAL_PLACES: u32 = 4;

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Field naming
// ---------------------------------------------------------------------------

/// `detail_{slug}` with dashes normalized to underscores.
pub fn field_name(slug: &str) -> String {
    format!("{FIELD_PREFIX}{}", slug.replace('-', "_"))
}

/// `detail_{slug}_{lang}` for one language copy of a translatable detail.
pub fn translated_field_name(slug: &str, language: &str) -> String {
    format!("{}_{}", field_name(slug), language.replace('-', "_"))
}

/// Every field name a detail contributes to a form.
pub fn detail_field_names(slug: &str, detail_type: DetailType, languages: &Languages) -> Vec<String> {
    if detail_type.is_translatable() {
        languages
            .iter()
            .map(|language| translated_field_name(slug, language))
            .collect()
    } else {
        vec![field_name(slug)]
    }
}

/// The first field name of `candidate` already produced by `bound`.
pub fn field_name_clash<'a, I>(
    candidate: (&str, DetailType),
    bound: I,
    languages: &Languages,
) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, DetailType)>,
{
    let taken: HashSet<String> = bound
        .into_iter()
        .flat_map(|(slug, detail_type)| detail_field_names(slug, detail_type, languages))
        .collect();
    detail_field_names(candidate.0, candidate.1, languages)
        .into_iter()
        .find(|name| taken.contains(name))
}

// ---------------------------------------------------------------------------
// Field kinds
// ---------------------------------------------------------------------------

/// A selectable value with its display label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub value: Value,
    pub label: String,
}

/// Widget/validation shape of a synthesized field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum FormFieldKind {
    Char { max_length: usize },
    Textarea,
    Boolean,
    Choice { choices: Vec<Choice> },
    MultipleChoice { choices: Vec<Choice> },
    Date,
    Time,
    Decimal { max_digits: u32, decimal_places: u32 },
    Integer { min: Option<i64>, max: Option<i64> },
    Color,
    Image,
    NumberWithSelector { selectors: Vec<&'static str> },
}

impl FormFieldKind {
    pub fn choices(&self) -> &[Choice] {
        match self {
            Self::Choice { choices } | Self::MultipleChoice { choices } => choices,
            _ => &[],
        }
    }
}

fn option_choices(binding: &GroupDetail) -> Vec<Choice> {
    let mut options: Vec<_> = binding.options.iter().collect();
    options.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
    options
        .into_iter()
        .map(|o| Choice {
            value: Value::from(o.id),
            label: o.name.clone(),
        })
        .collect()
}

/// The static detail type -> field kind table.
pub fn field_kind(binding: &GroupDetail) -> FormFieldKind {
    use DetailType as T;

    match binding.detail.detail_type {
        T::Text | T::TransText | T::IntegerSum => FormFieldKind::Char {
            max_length: MAX_TEXT_LENGTH,
        },
        T::Description | T::TransDescription => FormFieldKind::Textarea,
        T::Boolean => FormFieldKind::Boolean,
        T::Option => FormFieldKind::Choice {
            choices: option_choices(binding),
        },
        T::Options | T::IntegerOptions => FormFieldKind::MultipleChoice {
            choices: option_choices(binding),
        },
        T::Date => FormFieldKind::Date,
        T::Time => FormFieldKind::Time,
        T::Number => FormFieldKind::Decimal {
            max_digits: NUMBER_MAX_DIGITS,
            decimal_places: NUMBER_DECIMAL_PLACES,
        },
        T::Integer => FormFieldKind::Integer { min: None, max: None },
        T::Rating => FormFieldKind::Integer {
            min: Some(0),
            max: Some(MAX_RATING),
        },
        T::Color => FormFieldKind::Color,
        T::Image => FormFieldKind::Image,
        T::NumberWithValueTypeSelector => FormFieldKind::NumberWithSelector {
            selectors: VALUE_TYPE_SELECTORS.iter().map(|s| s.as_str()).collect(),
        },
        T::CountryVatChoices => FormFieldKind::Choice {
            choices: country_vat_choices()
                .iter()
                .map(|c| Choice {
                    value: Value::from(c.code),
                    label: format!("{} ({}%)", c.name, c.vat_rate),
                })
                .collect(),
        },
    }
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

/// One synthesized form field.
#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FormFieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub binding_id: DbId,
    pub detail_slug: String,
    pub detail_type: DetailType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub initial: Value,
}

/// A form synthesized for one detail category of one property.
#[derive(Debug, Clone, Serialize)]
pub struct DetailForm {
    pub fields: Vec<FormField>,
    #[serde(skip)]
    default_language: String,
}

/// A cleaned value, resolved back to its binding.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedField {
    pub binding_id: DbId,
    pub detail_type: DetailType,
    pub language: Option<String>,
    pub is_default_language: bool,
    pub value: RawValue,
}

/// Result of [`DetailForm::clean`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedForm {
    pub fields: Vec<CleanedField>,
    /// Present only when the payload carried a `related` key.
    pub related: Option<Vec<DbId>>,
}

impl CleanedForm {
    /// Distinct binding ids touched by this form, in field order.
    pub fn binding_ids(&self) -> Vec<DbId> {
        let mut ids: Vec<DbId> = Vec::new();
        for field in &self.fields {
            if !ids.contains(&field.binding_id) {
                ids.push(field.binding_id);
            }
        }
        ids
    }

    /// Dispatch every cleaned field of `binding_id` into `stored`.
    pub fn apply(&self, binding_id: DbId, stored: &mut StoredValue) -> Result<(), ValueError> {
        for field in self.fields.iter().filter(|f| f.binding_id == binding_id) {
            match &field.language {
                Some(language) => {
                    let text = match &field.value {
                        RawValue::Text(s) => Some(s.clone()),
                        _ => None,
                    };
                    stored.set_translation(
                        field.detail_type,
                        language,
                        field.is_default_language,
                        text,
                    )?;
                }
                None => stored.add_value(field.detail_type, field.value.clone())?,
            }
        }
        Ok(())
    }
}

fn initial_value(
    binding: &GroupDetail,
    stored: Option<&StoredValue>,
    language: Option<&str>,
    is_default: bool,
) -> Value {
    let Some(stored) = stored else {
        return Value::Null;
    };
    if let Some(language) = language {
        return stored
            .translation(language)
            .map(Value::from)
            .or_else(|| {
                if is_default {
                    let value = stored.get_value(binding.detail.detail_type);
                    (!value.is_blank()).then(|| value.to_json())
                } else {
                    None
                }
            })
            .unwrap_or(Value::Null);
    }
    let value = stored.get_value(binding.detail.detail_type);
    if value.is_blank() {
        Value::Null
    } else {
        value.to_json()
    }
}

/// Synthesize the form for `bindings` (already narrowed to one category).
///
/// `values` is keyed by binding id. Translatable details fan out into one
/// field per configured language, and only the default-language copy is
/// marked required.
pub fn build_detail_form(
    bindings: &[&GroupDetail],
    values: &HashMap<DbId, StoredValue>,
    languages: &Languages,
) -> DetailForm {
    let mut fields = Vec::new();

    for binding in bindings {
        let detail = &binding.detail;
        let stored = values.get(&binding.id);
        let kind = field_kind(binding);

        if detail.detail_type.is_translatable() {
            for language in languages.iter() {
                let is_default = languages.is_default(language);
                fields.push(FormField {
                    name: translated_field_name(&detail.slug, language),
                    label: format!("{} [{language}]", detail.name),
                    kind: kind.clone(),
                    required: binding.is_required && is_default,
                    language: Some(language.to_string()),
                    binding_id: binding.id,
                    detail_slug: detail.slug.clone(),
                    detail_type: detail.detail_type,
                    help_text: detail.help_text.clone(),
                    unit: detail.unit.clone(),
                    initial: initial_value(binding, stored, Some(language), is_default),
                });
            }
        } else {
            fields.push(FormField {
                name: field_name(&detail.slug),
                label: detail.name.clone(),
                kind,
                required: binding.is_required,
                language: None,
                binding_id: binding.id,
                detail_slug: detail.slug.clone(),
                detail_type: detail.detail_type,
                help_text: detail.help_text.clone(),
                unit: detail.unit.clone(),
                initial: initial_value(binding, stored, None, false),
            });
        }
    }

    DetailForm {
        fields,
        default_language: languages.default_language().to_string(),
    }
}

impl DetailForm {
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Map a field name back to its binding id and language.
    pub fn resolve(&self, name: &str) -> Option<(DbId, Option<&str>)> {
        self.field(name)
            .map(|f| (f.binding_id, f.language.as_deref()))
    }

    /// Validate and coerce a submitted payload.
    ///
    /// Every declared field is cleaned; a field absent from the payload is
    /// treated as empty (and so cleared on save). Keys that match no field
    /// are ignored, except `related`.
    pub fn clean(&self, data: &Map<String, Value>) -> Result<CleanedForm, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut cleaned = CleanedForm::default();

        for field in &self.fields {
            let raw = data.get(&field.name).unwrap_or(&Value::Null);
            match clean_field(field, raw) {
                Ok(value) => cleaned.fields.push(CleanedField {
                    binding_id: field.binding_id,
                    detail_type: field.detail_type,
                    language: field.language.clone(),
                    is_default_language: field
                        .language
                        .as_deref()
                        .is_some_and(|l| l == self.default_language),
                    value,
                }),
                Err(message) => errors.add(field.name.clone(), message),
            }
        }

        if let Some(related) = data.get(RELATED_FIELD) {
            match parse_id_list(related) {
                Some(ids) => cleaned.related = Some(ids),
                None => errors.add(RELATED_FIELD, "Enter a list of property ids."),
            }
        }

        errors.into_result(cleaned)
    }
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
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

fn parse_id_list(value: &Value) -> Option<Vec<DbId>> {
    match value {
        Value::Null => Some(Vec::new()),
        Value::Array(items) => items.iter().map(parse_id).collect(),
        other => parse_id(other).map(|id| vec![id]),
    }
}

/// Digit limits of a `NUMERIC(max_digits, decimal_places)` column, counted
/// on the normalized value.
fn check_precision(number: Decimal, max_digits: u32, decimal_places: u32) -> Result<(), String> {
    let normalized = number.normalize();
    let mantissa = normalized.mantissa().unsigned_abs();
    let len = if mantissa == 0 {
        0
    } else {
        mantissa.to_string().len() as u32
    };
    let scale = normalized.scale();
    let (digits, decimals) = if scale > len { (scale, scale) } else { (len, scale) };

    if digits > max_digits {
        return Err(format!(
            "Ensure that there are no more than {max_digits} digits in total."
        ));
    }
    if decimals > decimal_places {
        return Err(format!(
            "Ensure that there are no more than {decimal_places} decimal places."
        ));
    }
    let whole = max_digits - decimal_places;
    if digits - decimals > whole {
        return Err(format!(
            "Ensure that there are no more than {whole} digits before the decimal point."
        ));
    }
    Ok(())
}

fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn clean_boolean(raw: &Value) -> Result<RawValue, String> {
    match raw {
        Value::Null => Ok(RawValue::Bool(false)),
        Value::Bool(b) => Ok(RawValue::Bool(*b)),
        Value::String(s) => Ok(RawValue::Bool(matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "on" | "yes"
        ))),
        Value::Number(n) => Ok(RawValue::Bool(n.as_i64().is_some_and(|n| n != 0))),
        _ => Err("Enter a valid boolean.".to_string()),
    }
}

fn clean_field(field: &FormField, raw: &Value) -> Result<RawValue, String> {
    // Booleans are never "missing": an unchecked box is simply false.
    if matches!(field.kind, FormFieldKind::Boolean) {
        return clean_boolean(raw);
    }

    if is_empty(raw) {
        if field.required {
            return Err(REQUIRED_MESSAGE.to_string());
        }
        return Ok(match field.kind {
            FormFieldKind::MultipleChoice { .. } => RawValue::Choices(Vec::new()),
            _ => RawValue::Null,
        });
    }

    match &field.kind {
        FormFieldKind::Char { max_length } => {
            let text = as_text(raw).ok_or("Enter a valid text value.")?;
            if text.chars().count() > *max_length {
                return Err(format!(
                    "Ensure this value has at most {max_length} characters."
                ));
            }
            Ok(RawValue::Text(text))
        }
        FormFieldKind::Textarea | FormFieldKind::Image => {
            as_text(raw).map(RawValue::Text).ok_or_else(|| "Enter a valid text value.".to_string())
        }
        FormFieldKind::Color => {
            let text = as_text(raw).ok_or("Enter a valid color.")?;
            if COLOR_RE.is_match(&text) {
                Ok(RawValue::Text(text.to_ascii_lowercase()))
            } else {
                Err("Enter a valid color.".to_string())
            }
        }
        FormFieldKind::Boolean => clean_boolean(raw),
        FormFieldKind::Choice { choices } => {
            if field.detail_type == DetailType::CountryVatChoices {
                let code = as_text(raw).ok_or(INVALID_CHOICE_MESSAGE)?;
                return find_country_vat(&code)
                    .map(|c| RawValue::Text(c.code.to_string()))
                    .ok_or_else(|| INVALID_CHOICE_MESSAGE.to_string());
            }
            let id = parse_id(raw).ok_or(INVALID_CHOICE_MESSAGE)?;
            if choices.iter().any(|c| c.value == Value::from(id)) {
                Ok(RawValue::Choice(id))
            } else {
                Err(INVALID_CHOICE_MESSAGE.to_string())
            }
        }
        FormFieldKind::MultipleChoice { choices } => {
            let ids = parse_id_list(raw).ok_or("Enter a list of values.")?;
            if let Some(bad) = ids
                .iter()
                .find(|id| !choices.iter().any(|c| c.value == Value::from(**id)))
            {
                return Err(format!(
                    "Select a valid choice. {bad} is not one of the available choices."
                ));
            }
            Ok(RawValue::Choices(ids))
        }
        FormFieldKind::Date => as_text(raw)
            .and_then(|s| chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
            .map(RawValue::Date)
            .ok_or_else(|| "Enter a valid date.".to_string()),
        FormFieldKind::Time => as_text(raw)
            .and_then(|s| parse_time(&s))
            .map(RawValue::Time)
            .ok_or_else(|| "Enter a valid time.".to_string()),
        FormFieldKind::Decimal {
            max_digits,
            decimal_places,
        } => {
            let number = parse_decimal(raw).ok_or("Enter a number.")?;
            check_precision(number, *max_digits, *decimal_places)?;
            Ok(RawValue::Decimal(number))
        }
        FormFieldKind::Integer { min, max } => {
            let n = match raw {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }
            .ok_or("Enter a whole number.")?;
            if let Some(min) = min.filter(|min| n < *min) {
                return Err(format!(
                    "Ensure this value is greater than or equal to {min}."
                ));
            }
            if let Some(max) = max.filter(|max| n > *max) {
                return Err(format!("Ensure this value is less than or equal to {max}."));
            }
            Ok(RawValue::Integer(n))
        }
        FormFieldKind::NumberWithSelector { .. } => {
            let obj = raw
                .as_object()
                .ok_or("Enter an object with 'number' and 'value_type'.")?;
            let number = obj
                .get("number")
                .and_then(parse_decimal)
                .ok_or("Enter a number.")?;
            check_precision(number, NUMBER_MAX_DIGITS, NUMBER_DECIMAL_PLACES)?;
            let selector = match obj.get("value_type") {
                None | Some(Value::Null) => ValueTypeSelector::Fixed,
                Some(v) => v
                    .as_str()
                    .and_then(ValueTypeSelector::parse)
                    .ok_or_else(|| ValueError::InvalidSelector(v.to_string()).to_string())?,
            };
            Ok(RawValue::NumberWithSelector { number, selector })
        }
    }
}
