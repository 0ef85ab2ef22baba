//! CrudService: generic CRUD over the entity registry and an [`EntityStore`](crate::store::EntityStore).

mod crud;
mod filter;
mod projection;
mod uniqueness;
mod validation;
pub use crud::CrudService;
pub use filter::build_filters;
pub use projection::{field_names, field_names_with, is_empty_value, project, project_rows, prune_empty};
pub use uniqueness::{conflict_error, ensure_unique};
pub use validation::RequestValidator;
