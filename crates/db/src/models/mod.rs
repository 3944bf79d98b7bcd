//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` + `Validate` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) where rows are mutable

pub mod component;
pub mod component_form;
pub mod detail;
pub mod property;
pub mod property_detail_value;
pub mod property_group;
pub mod validation;
