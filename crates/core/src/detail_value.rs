//! Detail value dispatch: routes a raw value into the typed column a
//! `property_detail_values` row uses for the detail's type, and reads it
//! back as a [`DetailValue`].
//!
//! Coercion is minimal (string to decimal, string to integer,
//! HTML unescape for text). Anything that fails to coerce surfaces as a
//! [`ValueError`]; callers validate user input before dispatching.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::detail_type::{DetailType, ValueTypeSelector};
use crate::error::CoreError;
use crate::types::DbId;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Accepted time formats, most specific first.
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),

    #[error("'{0}' is not a valid integer")]
    InvalidInteger(String),

    #[error("'{0}' is not a valid boolean")]
    InvalidBoolean(String),

    #[error("'{0}' is not a valid date (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("'{0}' is not a valid time (expected HH:MM[:SS])")]
    InvalidTime(String),

    #[error("'{0}' is not a valid option id")]
    InvalidOption(String),

    #[error("'{0}' is not a valid value type")]
    InvalidSelector(String),

    #[error("{detail_type} cannot store {found}")]
    Mismatch {
        detail_type: DetailType,
        found: &'static str,
    },
}

impl From<ValueError> for CoreError {
    fn from(err: ValueError) -> Self {
        CoreError::Validation(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// A value handed to [`StoredValue::set_value`] before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Text(String),
    Bool(bool),
    Integer(i64),
    Decimal(Decimal),
    Date(NaiveDate),
    Time(NaiveTime),
    Choice(DbId),
    Choices(Vec<DbId>),
    NumberWithSelector {
        number: Decimal,
        selector: ValueTypeSelector,
    },
}

impl RawValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Decimal(_) => "decimal",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Choice(_) => "option",
            Self::Choices(_) => "options",
            Self::NumberWithSelector { .. } => "number with value type",
        }
    }

    fn mismatch(&self, detail_type: DetailType) -> ValueError {
        ValueError::Mismatch {
            detail_type,
            found: self.kind(),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<Decimal> for RawValue {
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<NaiveTime> for RawValue {
    fn from(t: NaiveTime) -> Self {
        Self::Time(t)
    }
}

// ---------------------------------------------------------------------------
// Typed output
// ---------------------------------------------------------------------------

/// A detail value read back from storage, shaped by the detail type.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailValue {
    Text(String),
    Description(String),
    Boolean(bool),
    Number(Decimal),
    Integer(i64),
    Date(Option<NaiveDate>),
    Time(Option<NaiveTime>),
    Choice(Option<DbId>),
    Choices(Vec<DbId>),
    IntegerSum {
        text: String,
        total: i64,
    },
    NumberWithSelector {
        number: Decimal,
        selector: ValueTypeSelector,
    },
}

impl DetailValue {
    /// JSON rendering used by the API. Decimals are strings, dates and
    /// times ISO-8601.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) | Self::Description(s) => json!(s),
            Self::Boolean(b) => json!(b),
            Self::Number(d) => json!(d.to_string()),
            Self::Integer(n) => json!(n),
            Self::Date(d) => d.map_or(Value::Null, |d| json!(d.format("%Y-%m-%d").to_string())),
            Self::Time(t) => t.map_or(Value::Null, |t| json!(t.format("%H:%M:%S").to_string())),
            Self::Choice(id) => id.map_or(Value::Null, |id| json!(id)),
            Self::Choices(ids) => json!(ids),
            Self::IntegerSum { text, total } => json!({ "text": text, "total": total }),
            Self::NumberWithSelector { number, selector } => json!({
                "number": number.to_string(),
                "value_type": selector.as_str(),
            }),
        }
    }

    /// Whether the value is worth showing (non-empty, non-default choice).
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) | Self::Description(s) => s.trim().is_empty(),
            Self::Date(d) => d.is_none(),
            Self::Time(t) => t.is_none(),
            Self::Choice(id) => id.is_none(),
            Self::Choices(ids) => ids.is_empty(),
            Self::IntegerSum { text, .. } => text.trim().is_empty(),
            Self::Boolean(_) | Self::Number(_) | Self::Integer(_) | Self::NumberWithSelector { .. } => {
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Stored columns
// ---------------------------------------------------------------------------

/// The value columns of one `property_detail_values` row.
///
/// Only the column(s) selected by the detail type are meaningful; the rest
/// stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredValue {
    pub value_text: Option<String>,
    pub value_boolean: Option<bool>,
    pub value_description: Option<String>,
    pub value_number: Option<Decimal>,
    pub value_integer: Option<i64>,
    pub value_date: Option<NaiveDate>,
    pub value_time: Option<NaiveTime>,
    /// Language code to text, for translatable details.
    #[serde(default)]
    pub value_translations: BTreeMap<String, String>,
    pub detail_option_id: Option<DbId>,
    /// Multi-option selections, kept sorted and unique.
    #[serde(default)]
    pub detail_option_ids: Vec<DbId>,
}

impl StoredValue {
    /// Route `raw` into the column used by `detail_type`, replacing the
    /// previous value. `Null` clears that column.
    pub fn set_value(&mut self, detail_type: DetailType, raw: RawValue) -> Result<(), ValueError> {
        use DetailType as T;

        match detail_type {
            T::Text | T::TransText | T::Color | T::Image | T::CountryVatChoices => {
                self.value_text = coerce_text(detail_type, raw)?
                    .map(|s| html_escape::decode_html_entities(&s).into_owned());
            }
            T::Description | T::TransDescription => {
                self.value_description = coerce_text(detail_type, raw)?;
            }
            T::Boolean => self.value_boolean = coerce_bool(detail_type, raw)?,
            T::Number => self.value_number = coerce_decimal(detail_type, raw)?,
            T::Integer | T::Rating => self.value_integer = coerce_integer(detail_type, raw)?,
            T::IntegerSum => {
                let text = coerce_text(detail_type, raw)?;
                self.value_integer = text.as_deref().map(sum_numbers);
                self.value_text = text;
            }
            T::Date => self.value_date = coerce_date(detail_type, raw)?,
            T::Time => self.value_time = coerce_time(detail_type, raw)?,
            T::Option => self.detail_option_id = coerce_option(detail_type, raw)?,
            T::Options | T::IntegerOptions => {
                let mut ids = coerce_options(detail_type, raw)?;
                ids.sort_unstable();
                ids.dedup();
                self.detail_option_ids = ids;
            }
            T::NumberWithValueTypeSelector => match raw {
                RawValue::Null => {
                    self.value_number = None;
                    self.value_text = None;
                }
                RawValue::NumberWithSelector { number, selector } => {
                    self.value_number = Some(number);
                    self.value_text = Some(selector.as_str().to_string());
                }
                other => {
                    self.value_number = coerce_decimal(detail_type, other)?;
                    if self.value_text.is_none() {
                        self.value_text = Some(ValueTypeSelector::Fixed.as_str().to_string());
                    }
                }
            },
        }
        Ok(())
    }

    /// Form-save entry point. Scalars behave like [`set_value`](Self::set_value).
    /// For multi-option types a full selection (`Choices`, `Null`) replaces
    /// the stored set, while a single id is added to it, which is how
    /// row-by-row imports accumulate options.
    pub fn add_value(&mut self, detail_type: DetailType, raw: RawValue) -> Result<(), ValueError> {
        if !detail_type.is_multiple() || matches!(raw, RawValue::Choices(_) | RawValue::Null) {
            return self.set_value(detail_type, raw);
        }
        let mut ids = coerce_options(detail_type, raw)?;
        ids.extend(self.detail_option_ids.iter().copied());
        ids.sort_unstable();
        ids.dedup();
        self.detail_option_ids = ids;
        Ok(())
    }

    /// Read the column used by `detail_type`. Missing columns read as the
    /// type's default.
    pub fn get_value(&self, detail_type: DetailType) -> DetailValue {
        use DetailType as T;

        match detail_type {
            T::Text | T::TransText | T::Color | T::Image | T::CountryVatChoices => {
                DetailValue::Text(self.value_text.clone().unwrap_or_default())
            }
            T::Description | T::TransDescription => {
                DetailValue::Description(self.value_description.clone().unwrap_or_default())
            }
            T::Boolean => DetailValue::Boolean(self.value_boolean.unwrap_or(false)),
            T::Number => DetailValue::Number(self.value_number.unwrap_or(Decimal::ZERO)),
            T::Integer | T::Rating => DetailValue::Integer(self.value_integer.unwrap_or(0)),
            T::IntegerSum => DetailValue::IntegerSum {
                text: self.value_text.clone().unwrap_or_default(),
                total: self.value_integer.unwrap_or(0),
            },
            T::Date => DetailValue::Date(self.value_date),
            T::Time => DetailValue::Time(self.value_time),
            T::Option => DetailValue::Choice(self.detail_option_id),
            T::Options | T::IntegerOptions => DetailValue::Choices(self.detail_option_ids.clone()),
            T::NumberWithValueTypeSelector => DetailValue::NumberWithSelector {
                number: self.value_number.unwrap_or(Decimal::ZERO),
                selector: self
                    .value_text
                    .as_deref()
                    .and_then(ValueTypeSelector::parse)
                    .unwrap_or(ValueTypeSelector::Fixed),
            },
        }
    }

    /// Store one language copy of a translatable value. The default
    /// language copy is also written to the primary column.
    pub fn set_translation(
        &mut self,
        detail_type: DetailType,
        language: &str,
        is_default: bool,
        text: Option<String>,
    ) -> Result<(), ValueError> {
        if !detail_type.is_translatable() {
            return Err(ValueError::Mismatch {
                detail_type,
                found: "translation",
            });
        }
        if is_default {
            let raw = text.clone().map_or(RawValue::Null, RawValue::Text);
            self.set_value(detail_type, raw)?;
        }
        match text {
            Some(text) if !text.is_empty() => {
                let text = if detail_type == DetailType::TransText {
                    html_escape::decode_html_entities(&text).into_owned()
                } else {
                    text
                };
                self.value_translations.insert(language.to_string(), text);
            }
            _ => {
                self.value_translations.remove(language);
            }
        }
        Ok(())
    }

    /// The stored copy for `language`, if any.
    pub fn translation(&self, language: &str) -> Option<&str> {
        self.value_translations.get(language).map(String::as_str)
    }
}

/// Sum every run of digits in `text` ("2 doubles + 1 single" -> 3).
pub fn sum_numbers(text: &str) -> i64 {
    NUMBER_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<i64>().ok())
        .fold(0i64, i64::saturating_add)
}

// ---------------------------------------------------------------------------
// Coercion helpers
// ---------------------------------------------------------------------------

fn coerce_text(detail_type: DetailType, raw: RawValue) -> Result<Option<String>, ValueError> {
    match raw {
        RawValue::Null => Ok(None),
        RawValue::Text(s) => Ok(Some(s)),
        RawValue::Integer(n) => Ok(Some(n.to_string())),
        RawValue::Decimal(d) => Ok(Some(d.to_string())),
        other => Err(other.mismatch(detail_type)),
    }
}

fn coerce_bool(detail_type: DetailType, raw: RawValue) -> Result<Option<bool>, ValueError> {
    match raw {
        RawValue::Null => Ok(None),
        RawValue::Bool(b) => Ok(Some(b)),
        RawValue::Integer(n) => Ok(Some(n != 0)),
        RawValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" | "" => Ok(Some(false)),
            _ => Err(ValueError::InvalidBoolean(s)),
        },
        other => Err(other.mismatch(detail_type)),
    }
}

fn coerce_decimal(detail_type: DetailType, raw: RawValue) -> Result<Option<Decimal>, ValueError> {
    match raw {
        RawValue::Null => Ok(None),
        RawValue::Decimal(d) => Ok(Some(d)),
        RawValue::Integer(n) => Ok(Some(Decimal::from(n))),
        RawValue::Text(s) if s.trim().is_empty() => Ok(None),
        RawValue::Text(s) => Decimal::from_str(s.trim())
            .map(Some)
            .map_err(|_| ValueError::InvalidNumber(s)),
        other => Err(other.mismatch(detail_type)),
    }
}

fn coerce_integer(detail_type: DetailType, raw: RawValue) -> Result<Option<i64>, ValueError> {
    match raw {
        RawValue::Null => Ok(None),
        RawValue::Integer(n) => Ok(Some(n)),
        RawValue::Decimal(d) if d.fract().is_zero() => d
            .to_i64()
            .map(Some)
            .ok_or_else(|| ValueError::InvalidInteger(d.to_string())),
        RawValue::Decimal(d) => Err(ValueError::InvalidInteger(d.to_string())),
        RawValue::Text(s) if s.trim().is_empty() => Ok(None),
        RawValue::Text(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ValueError::InvalidInteger(s)),
        other => Err(other.mismatch(detail_type)),
    }
}

fn coerce_date(detail_type: DetailType, raw: RawValue) -> Result<Option<NaiveDate>, ValueError> {
    match raw {
        RawValue::Null => Ok(None),
        RawValue::Date(d) => Ok(Some(d)),
        RawValue::Text(s) if s.trim().is_empty() => Ok(None),
        RawValue::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ValueError::InvalidDate(s)),
        other => Err(other.mismatch(detail_type)),
    }
}

/// Parse `HH:MM:SS` or `HH:MM`.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s.trim(), fmt).ok())
}

fn coerce_time(detail_type: DetailType, raw: RawValue) -> Result<Option<NaiveTime>, ValueError> {
    match raw {
        RawValue::Null => Ok(None),
        RawValue::Time(t) => Ok(Some(t)),
        RawValue::Text(s) if s.trim().is_empty() => Ok(None),
        RawValue::Text(s) => parse_time(&s)
            .map(Some)
            .ok_or(ValueError::InvalidTime(s)),
        other => Err(other.mismatch(detail_type)),
    }
}

fn coerce_option(detail_type: DetailType, raw: RawValue) -> Result<Option<DbId>, ValueError> {
    match raw {
        RawValue::Null => Ok(None),
        RawValue::Choice(id) | RawValue::Integer(id) => Ok(Some(id)),
        RawValue::Text(s) if s.trim().is_empty() => Ok(None),
        RawValue::Text(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ValueError::InvalidOption(s)),
        other => Err(other.mismatch(detail_type)),
    }
}

fn coerce_options(detail_type: DetailType, raw: RawValue) -> Result<Vec<DbId>, ValueError> {
    match raw {
        RawValue::Null => Ok(Vec::new()),
        RawValue::Choices(ids) => Ok(ids),
        RawValue::Choice(id) | RawValue::Integer(id) => Ok(vec![id]),
        RawValue::Text(s) => s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| p.parse().map_err(|_| ValueError::InvalidOption(p.to_string())))
            .collect(),
        other => Err(other.mismatch(detail_type)),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn stored(detail_type: DetailType, raw: impl Into<RawValue>) -> StoredValue {
        let mut value = StoredValue::default();
        value.set_value(detail_type, raw.into()).unwrap();
        value
    }

    #[test]
    fn scalar_round_trips() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let time = NaiveTime::from_hms_opt(16, 0, 0).unwrap();

        assert_eq!(
            stored(DetailType::Text, "Pool").get_value(DetailType::Text),
            DetailValue::Text("Pool".into())
        );
        assert_eq!(
            stored(DetailType::Boolean, true).get_value(DetailType::Boolean),
            DetailValue::Boolean(true)
        );
        assert_eq!(
            stored(DetailType::Integer, 4i64).get_value(DetailType::Integer),
            DetailValue::Integer(4)
        );
        assert_eq!(
            stored(DetailType::Date, date).get_value(DetailType::Date),
            DetailValue::Date(Some(date))
        );
        assert_eq!(
            stored(DetailType::Time, time).get_value(DetailType::Time),
            DetailValue::Time(Some(time))
        );
    }

    #[test]
    fn text_is_html_unescaped_on_write() {
        let value = stored(DetailType::Text, "Sea &amp; Sun");
        assert_eq!(value.value_text.as_deref(), Some("Sea & Sun"));

        let value = stored(
            DetailType::Text,
            "S&atilde;o Jo&atilde;o &eacute; Ca&ccedil;a &ordm; caf&#233;",
        );
        assert_eq!(value.value_text.as_deref(), Some("São João é Caça º café"));
    }

    #[test]
    fn description_keeps_markup() {
        let value = stored(DetailType::Description, "<p>Fish &amp; chips</p>");
        assert_eq!(
            value.value_description.as_deref(),
            Some("<p>Fish &amp; chips</p>")
        );
    }

    #[test]
    fn number_coerces_from_string() {
        let value = stored(DetailType::Number, "120.50");
        assert_eq!(value.value_number, Some(Decimal::new(12050, 2)));
    }

    #[test]
    fn number_rejects_non_numeric_text() {
        let mut value = StoredValue::default();
        let err = value
            .set_value(DetailType::Number, RawValue::from("lots"))
            .unwrap_err();
        assert_matches!(err, ValueError::InvalidNumber(s) if s == "lots");
    }

    #[test]
    fn integer_coerces_from_string_and_whole_decimal() {
        assert_eq!(stored(DetailType::Integer, " 12 ").value_integer, Some(12));
        assert_eq!(
            stored(DetailType::Rating, Decimal::new(40, 1)).value_integer,
            Some(4)
        );
    }

    #[test]
    fn integer_rejects_fraction() {
        let mut value = StoredValue::default();
        let result = value.set_value(DetailType::Integer, Decimal::new(45, 1).into());
        assert_matches!(result, Err(ValueError::InvalidInteger(_)));
    }

    #[test]
    fn integer_sum_stores_text_and_total() {
        let value = stored(DetailType::IntegerSum, "2 double beds, 1 single, 3 sofas");
        assert_eq!(value.value_integer, Some(6));
        assert_eq!(
            value.get_value(DetailType::IntegerSum),
            DetailValue::IntegerSum {
                text: "2 double beds, 1 single, 3 sofas".into(),
                total: 6,
            }
        );
    }

    #[test]
    fn option_sets_single_id() {
        let value = stored(DetailType::Option, RawValue::Choice(9));
        assert_eq!(value.get_value(DetailType::Option), DetailValue::Choice(Some(9)));
    }

    #[test]
    fn options_replace_and_add() {
        let mut value = StoredValue::default();
        value
            .set_value(DetailType::Options, RawValue::Choices(vec![3, 1, 3]))
            .unwrap();
        assert_eq!(value.detail_option_ids, vec![1, 3]);

        value
            .add_value(DetailType::Options, RawValue::Choice(2))
            .unwrap();
        assert_eq!(value.detail_option_ids, vec![1, 2, 3]);

        value
            .add_value(DetailType::Options, RawValue::Choices(vec![2]))
            .unwrap();
        assert_eq!(value.detail_option_ids, vec![2]);

        value
            .set_value(DetailType::Options, RawValue::from("5, 4"))
            .unwrap();
        assert_eq!(value.detail_option_ids, vec![4, 5]);
    }

    #[test]
    fn null_clears_the_column() {
        let mut value = stored(DetailType::Number, "3");
        value.set_value(DetailType::Number, RawValue::Null).unwrap();
        assert_eq!(value.value_number, None);
        assert_eq!(
            value.get_value(DetailType::Number),
            DetailValue::Number(Decimal::ZERO)
        );
    }

    #[test]
    fn number_with_selector() {
        let value = stored(
            DetailType::NumberWithValueTypeSelector,
            RawValue::NumberWithSelector {
                number: Decimal::new(15, 0),
                selector: ValueTypeSelector::Percentage,
            },
        );
        assert_eq!(value.value_text.as_deref(), Some("percentage"));
        assert_eq!(
            value.get_value(DetailType::NumberWithValueTypeSelector).to_json(),
            json!({ "number": "15", "value_type": "percentage" })
        );
    }

    #[test]
    fn mismatched_raw_value_is_rejected() {
        let mut value = StoredValue::default();
        let result = value.set_value(DetailType::Date, RawValue::Bool(true));
        assert_matches!(
            result,
            Err(ValueError::Mismatch {
                detail_type: DetailType::Date,
                found: "boolean"
            })
        );
    }

    #[test]
    fn translations_write_default_language_to_primary_column() {
        let mut value = StoredValue::default();
        value
            .set_translation(DetailType::TransText, "en", true, Some("Beach house".into()))
            .unwrap();
        value
            .set_translation(DetailType::TransText, "pt", false, Some("Casa de praia".into()))
            .unwrap();

        assert_eq!(value.value_text.as_deref(), Some("Beach house"));
        assert_eq!(value.translation("pt"), Some("Casa de praia"));
        assert_eq!(value.translation("en"), Some("Beach house"));
    }

    #[test]
    fn translation_on_plain_type_is_rejected() {
        let mut value = StoredValue::default();
        let result = value.set_translation(DetailType::Text, "en", true, None);
        assert_matches!(result, Err(ValueError::Mismatch { .. }));
    }

    #[test]
    fn sum_numbers_ignores_words() {
        assert_eq!(sum_numbers("no digits"), 0);
        assert_eq!(sum_numbers("10 + 5"), 15);
    }

    #[test]
    fn json_rendering() {
        assert_eq!(DetailValue::Number(Decimal::new(105, 1)).to_json(), json!("10.5"));
        assert_eq!(DetailValue::Date(None).to_json(), Value::Null);
        assert_eq!(
            DetailValue::Time(NaiveTime::from_hms_opt(9, 30, 0)).to_json(),
            json!("09:30:00")
        );
    }
}
