//! Detail definition registry: the closed set of detail types, their
//! default values, and the static choice tables some of them carry.
//!
//! This module has **zero database dependencies**.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::detail_value::DetailValue;

// ---------------------------------------------------------------------------
// Detail type
// ---------------------------------------------------------------------------

/// The data type of a detail. Stored as its snake_case name in
/// `details.detail_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailType {
    Text,
    TransText,
    Description,
    TransDescription,
    Boolean,
    Option,
    Options,
    IntegerOptions,
    Date,
    Time,
    Number,
    Integer,
    Color,
    Image,
    Rating,
    IntegerSum,
    NumberWithValueTypeSelector,
    CountryVatChoices,
}

/// Every detail type, in declaration order.
pub const ALL_DETAIL_TYPES: [DetailType; 18] = [
    DetailType::Text,
    DetailType::TransText,
    DetailType::Description,
    DetailType::TransDescription,
    DetailType::Boolean,
    DetailType::Option,
    DetailType::Options,
    DetailType::IntegerOptions,
    DetailType::Date,
    DetailType::Time,
    DetailType::Number,
    DetailType::Integer,
    DetailType::Color,
    DetailType::Image,
    DetailType::Rating,
    DetailType::IntegerSum,
    DetailType::NumberWithValueTypeSelector,
    DetailType::CountryVatChoices,
];

/// Upper bound for `rating` details.
pub const MAX_RATING: i64 = 5;

impl DetailType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::TransText => "trans_text",
            Self::Description => "description",
            Self::TransDescription => "trans_description",
            Self::Boolean => "boolean",
            Self::Option => "option",
            Self::Options => "options",
            Self::IntegerOptions => "integer_options",
            Self::Date => "date",
            Self::Time => "time",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Color => "color",
            Self::Image => "image",
            Self::Rating => "rating",
            Self::IntegerSum => "integer_sum",
            Self::NumberWithValueTypeSelector => "number_with_value_type_selector",
            Self::CountryVatChoices => "country_vat_choices",
        }
    }

    /// Human-readable label for admin listings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::TransText => "Translatable text",
            Self::Description => "Description",
            Self::TransDescription => "Translatable description",
            Self::Boolean => "Yes / No",
            Self::Option => "Single option",
            Self::Options => "Multiple options",
            Self::IntegerOptions => "Multiple numeric options",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::Number => "Number",
            Self::Integer => "Integer",
            Self::Color => "Color",
            Self::Image => "Image",
            Self::Rating => "Rating",
            Self::IntegerSum => "Integer sum",
            Self::NumberWithValueTypeSelector => "Number with value type",
            Self::CountryVatChoices => "Country VAT",
        }
    }

    /// One copy of the value per configured language.
    pub fn is_translatable(self) -> bool {
        matches!(self, Self::TransText | Self::TransDescription)
    }

    /// Values live in the option many-to-many table.
    pub fn is_multiple(self) -> bool {
        matches!(self, Self::Options | Self::IntegerOptions)
    }

    /// Choices come from `detail_options` rows scoped to the detail.
    pub fn uses_options(self) -> bool {
        matches!(self, Self::Option | Self::Options | Self::IntegerOptions)
    }

    /// The value a freshly created row reports before anything is set.
    pub fn default_value(self) -> DetailValue {
        match self {
            Self::Text | Self::TransText | Self::Color | Self::Image | Self::CountryVatChoices => {
                DetailValue::Text(String::new())
            }
            Self::Description | Self::TransDescription => DetailValue::Description(String::new()),
            Self::Boolean => DetailValue::Boolean(false),
            Self::Option => DetailValue::Choice(None),
            Self::Options | Self::IntegerOptions => DetailValue::Choices(Vec::new()),
            Self::Date => DetailValue::Date(None),
            Self::Time => DetailValue::Time(None),
            Self::Number => DetailValue::Number(Decimal::ZERO),
            Self::Integer | Self::Rating => DetailValue::Integer(0),
            Self::IntegerSum => DetailValue::IntegerSum {
                text: String::new(),
                total: 0,
            },
            Self::NumberWithValueTypeSelector => DetailValue::NumberWithSelector {
                number: Decimal::ZERO,
                selector: ValueTypeSelector::Fixed,
            },
        }
    }
}

impl fmt::Display for DetailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown detail type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown detail type: {0}")]
pub struct UnknownDetailType(pub String);

impl FromStr for DetailType {
    type Err = UnknownDetailType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_DETAIL_TYPES
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownDetailType(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Value type selector
// ---------------------------------------------------------------------------

/// Unit selector paired with `number_with_value_type_selector` details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTypeSelector {
    Fixed,
    Percentage,
}

impl ValueTypeSelector {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Percentage => "percentage",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fixed" => Some(Self::Fixed),
            "percentage" => Some(Self::Percentage),
            _ => None,
        }
    }
}

/// All selectors offered by the form builder.
pub const VALUE_TYPE_SELECTORS: [ValueTypeSelector; 2] =
    [ValueTypeSelector::Fixed, ValueTypeSelector::Percentage];

// ---------------------------------------------------------------------------
// Country VAT table
// ---------------------------------------------------------------------------

/// A selectable country with its standard VAT rate (percent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountryVat {
    pub code: &'static str,
    pub name: &'static str,
    pub vat_rate: f64,
}

const COUNTRY_VAT: &[CountryVat] = &[
    CountryVat { code: "PT", name: "Portugal", vat_rate: 23.0 },
    CountryVat { code: "ES", name: "Spain", vat_rate: 21.0 },
    CountryVat { code: "FR", name: "France", vat_rate: 20.0 },
    CountryVat { code: "IT", name: "Italy", vat_rate: 22.0 },
    CountryVat { code: "GR", name: "Greece", vat_rate: 24.0 },
    CountryVat { code: "HR", name: "Croatia", vat_rate: 25.0 },
    CountryVat { code: "GB", name: "United Kingdom", vat_rate: 20.0 },
    CountryVat { code: "DE", name: "Germany", vat_rate: 19.0 },
];

/// Choices for `country_vat_choices` details.
pub fn country_vat_choices() -> &'static [CountryVat] {
    COUNTRY_VAT
}

/// Look up a country by ISO code (case-insensitive).
pub fn find_country_vat(code: &str) -> Option<&'static CountryVat> {
    COUNTRY_VAT.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_type() {
        for t in ALL_DETAIL_TYPES {
            assert_eq!(t.as_str().parse::<DetailType>(), Ok(t));
        }
    }

    #[test]
    fn parse_unknown_type_fails() {
        let err = "hologram".parse::<DetailType>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown detail type: hologram");
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_value(DetailType::NumberWithValueTypeSelector).unwrap();
        assert_eq!(json, "number_with_value_type_selector");
    }

    #[test]
    fn classification_flags() {
        assert!(DetailType::TransText.is_translatable());
        assert!(!DetailType::Text.is_translatable());
        assert!(DetailType::IntegerOptions.is_multiple());
        assert!(DetailType::Option.uses_options());
        assert!(!DetailType::Option.is_multiple());
    }

    #[test]
    fn defaults_per_type() {
        assert_eq!(DetailType::Boolean.default_value(), DetailValue::Boolean(false));
        assert_eq!(DetailType::Rating.default_value(), DetailValue::Integer(0));
        assert_eq!(DetailType::Options.default_value(), DetailValue::Choices(vec![]));
    }

    #[test]
    fn country_lookup_is_case_insensitive() {
        assert_eq!(find_country_vat("pt").map(|c| c.name), Some("Portugal"));
        assert!(find_country_vat("XX").is_none());
    }
}
