//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod collection_repo;
pub mod component_form_repo;
pub mod component_repo;
pub mod detail_repo;
pub mod property_detail_value_repo;
pub mod property_group_repo;
pub mod property_repo;
pub mod reference_repo;

pub use collection_repo::CollectionRepo;
pub use component_form_repo::ComponentFormRepo;
pub use component_repo::{ComponentRepo, MediaImageRepo};
pub use detail_repo::{DetailCategoryRepo, DetailRepo};
pub use property_detail_value_repo::PropertyDetailValueRepo;
pub use property_group_repo::PropertyGroupRepo;
pub use property_repo::PropertyRepo;
pub use reference_repo::ReferenceRepo;
