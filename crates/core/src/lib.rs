//! Tripwix core: detail types, value storage, dynamic forms and the
//! component JSON pipeline. No database or HTTP dependencies.

pub mod component;
pub mod component_form;
pub mod detail_type;
pub mod detail_value;
pub mod error;
pub mod form_builder;
pub mod grouping;
pub mod languages;
pub mod slug;
pub mod types;

pub use error::{CoreError, FieldErrors};
pub use types::{DbId, Timestamp};
