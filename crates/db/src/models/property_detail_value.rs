//! Property detail value rows.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use tripwix_core::detail_value::StoredValue;
use tripwix_core::types::{DbId, Timestamp};

/// A row from the `property_detail_values` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PropertyDetailValue {
    pub id: DbId,
    pub property_id: DbId,
    pub property_group_detail_id: DbId,
    pub value_text: Option<String>,
    pub value_boolean: Option<bool>,
    pub value_description: Option<String>,
    pub value_number: Option<Decimal>,
    pub value_integer: Option<i64>,
    pub value_date: Option<NaiveDate>,
    pub value_time: Option<NaiveTime>,
    pub value_translations: Json<BTreeMap<String, String>>,
    pub detail_option_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PropertyDetailValue {
    /// Typed columns plus the multi-option ids from the junction table.
    pub fn into_stored(self, option_ids: Vec<DbId>) -> StoredValue {
        StoredValue {
            value_text: self.value_text,
            value_boolean: self.value_boolean,
            value_description: self.value_description,
            value_number: self.value_number,
            value_integer: self.value_integer,
            value_date: self.value_date,
            value_time: self.value_time,
            value_translations: self.value_translations.0,
            detail_option_id: self.detail_option_id,
            detail_option_ids: option_ids,
        }
    }
}
