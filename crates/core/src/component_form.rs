//! Public lead-capture forms built from configurable fields.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{FieldErrors, INVALID_CHOICE_MESSAGE, REQUIRED_MESSAGE};
use crate::types::DbId;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 ()-]{6,20}$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormInputType {
    Text,
    Email,
    Phone,
    Textarea,
    Number,
    Date,
    Boolean,
    Select,
}

impl FormInputType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Textarea => "textarea",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Select => "select",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "email" => Some(Self::Email),
            "phone" => Some(Self::Phone),
            "textarea" => Some(Self::Textarea),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "boolean" => Some(Self::Boolean),
            "select" => Some(Self::Select),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormFieldDef {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub field_type: FormInputType,
    pub is_required: bool,
    pub sort_order: i32,
    /// Allowed values for `select` fields.
    #[serde(default)]
    pub choices: Vec<String>,
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn clean(field: &FormFieldDef, value: &Value) -> Result<Value, String> {
    let text = as_text(value).ok_or("Enter a valid value.")?;
    match field.field_type {
        FormInputType::Text | FormInputType::Textarea => Ok(json!(text)),
        FormInputType::Email if EMAIL_RE.is_match(&text) => Ok(json!(text.to_lowercase())),
        FormInputType::Email => Err("Enter a valid email address.".to_string()),
        FormInputType::Phone if PHONE_RE.is_match(&text) => Ok(json!(text)),
        FormInputType::Phone => Err("Enter a valid phone number.".to_string()),
        FormInputType::Number => Decimal::from_str(&text)
            .map(|d| json!(d.to_string()))
            .map_err(|_| "Enter a number.".to_string()),
        FormInputType::Date => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map(|d| json!(d.format("%Y-%m-%d").to_string()))
            .map_err(|_| "Enter a valid date.".to_string()),
        FormInputType::Select if field.choices.iter().any(|c| *c == text) => Ok(json!(text)),
        FormInputType::Select => Err(INVALID_CHOICE_MESSAGE.to_string()),
        FormInputType::Boolean => Err("Enter a valid boolean.".to_string()),
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

/// Validate a submission against the form's fields. Required fields must
/// be present and non-blank; keys that match no field are dropped.
pub fn validate_form_data(
    fields: &[FormFieldDef],
    payload: &Map<String, Value>,
) -> Result<Map<String, Value>, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut data = Map::new();

    for field in fields {
        let value = payload.get(&field.slug);

        if field.field_type == FormInputType::Boolean {
            match value {
                None | Some(Value::Null) | Some(Value::Bool(false)) if field.is_required => {
                    errors.add(&field.slug, REQUIRED_MESSAGE)
                }
                None | Some(Value::Null) => {
                    data.insert(field.slug.clone(), json!(false));
                }
                Some(Value::Bool(b)) => {
                    data.insert(field.slug.clone(), json!(b));
                }
                Some(_) => errors.add(&field.slug, "Enter a valid boolean."),
            }
            continue;
        }

        if is_blank(value) {
            if field.is_required {
                errors.add(&field.slug, REQUIRED_MESSAGE);
            }
            continue;
        }

        match value.map(|v| clean(field, v)) {
            Some(Ok(cleaned)) => {
                data.insert(field.slug.clone(), cleaned);
            }
            Some(Err(message)) => errors.add(&field.slug, message),
            None => {}
        }
    }

    errors.into_result(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(slug: &str, field_type: FormInputType, required: bool) -> FormFieldDef {
        FormFieldDef {
            id: 0,
            name: slug.to_string(),
            slug: slug.to_string(),
            field_type,
            is_required: required,
            sort_order: 0,
            choices: vec![],
        }
    }

    fn contact_form() -> Vec<FormFieldDef> {
        let mut budget = field("budget", FormInputType::Select, false);
        budget.choices = vec!["low".into(), "high".into()];
        vec![
            field("name", FormInputType::Text, true),
            field("email", FormInputType::Email, true),
            field("phone", FormInputType::Phone, false),
            field("arrival", FormInputType::Date, false),
            field("newsletter", FormInputType::Boolean, false),
            budget,
        ]
    }

    #[test]
    fn accepts_valid_submission_and_drops_unknown_keys() {
        let payload = json!({
            "name": "Ana",
            "email": "Ana@Example.com",
            "arrival": "2025-07-01",
            "budget": "high",
            "utm_source": "ads",
        });
        let data = validate_form_data(&contact_form(), payload.as_object().unwrap()).unwrap();
        assert_eq!(data["email"], "ana@example.com");
        assert_eq!(data["newsletter"], false);
        assert!(data.get("utm_source").is_none());
        assert!(data.get("phone").is_none());
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let payload = json!({ "name": "  " });
        let errors = validate_form_data(&contact_form(), payload.as_object().unwrap()).unwrap_err();
        assert_eq!(errors.get("name"), Some(&[REQUIRED_MESSAGE.to_string()][..]));
        assert!(errors.contains("email"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn invalid_values_are_reported() {
        let payload = json!({
            "name": "Ana",
            "email": "not-an-email",
            "phone": "abc",
            "budget": "medium",
        });
        let errors = validate_form_data(&contact_form(), payload.as_object().unwrap()).unwrap_err();
        assert!(errors.contains("email"));
        assert!(errors.contains("phone"));
        assert!(errors.contains("budget"));
    }

    #[test]
    fn required_checkbox_must_be_ticked() {
        let fields = vec![field("consent", FormInputType::Boolean, true)];
        let payload = json!({ "consent": false });
        assert!(validate_form_data(&fields, payload.as_object().unwrap()).is_err());

        let payload = json!({ "consent": true });
        assert!(validate_form_data(&fields, payload.as_object().unwrap()).is_ok());
    }
}
