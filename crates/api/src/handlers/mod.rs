pub mod collections;
pub mod components;
pub mod detail_form;
pub mod details;
pub mod forms;
pub mod properties;
pub mod property_groups;
pub mod uploads;
