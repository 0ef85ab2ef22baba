//! Entity schema registry: static descriptors, validation and the resolved model.

pub mod entities;
pub mod loader;
pub mod resolved;
pub mod types;
pub mod validator;

pub use entities::CATALOGUE;
pub use loader::*;
pub use resolved::*;
pub use types::*;
pub use validator::*;

/// Columns every entity carries, in order, ahead of its own columns.
pub const BASE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("xid", ColumnType::Integer),
    ColumnDef::new("date_created", ColumnType::Timestamp),
    ColumnDef::new("date_modified", ColumnType::Timestamp),
    ColumnDef::new("updated_by", ColumnType::Integer),
];
