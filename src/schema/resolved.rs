//! Resolved entity model: descriptors validated and flattened for runtime use.

use super::types::{Cardinality, ColumnType, FieldPolicy};
use std::collections::HashMap;

/// Suffix marking a column as a foreign-key identifier.
pub const ID_SUFFIX: &str = "_xid";

/// Primary key column shared by every entity.
pub const PK_COLUMN: &str = "xid";

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    pub ty: ColumnType,
    pub required: bool,
    pub unique: bool,
    /// Set by the store (pk, timestamps); ignored when present in a request body.
    pub read_only: bool,
    /// Path segment of the entity this column references, for `_xid` columns backed by a relation.
    pub references: Option<String>,
}

impl ColumnInfo {
    pub fn is_id_field(&self) -> bool {
        self.name.ends_with(ID_SUFFIX)
    }
}

#[derive(Clone, Debug)]
pub struct RelationSpec {
    pub name: String,
    pub target: String,
    pub cardinality: Cardinality,
    /// Foreign-key column: on the target for one-to-many, on us for many-to-one.
    pub fk_column: String,
    pub nested: bool,
}

#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    pub name: String,
    pub table_name: String,
    pub path_segment: String,
    pub pk_column: String,
    pub columns: Vec<ColumnInfo>,
    pub relations: Vec<RelationSpec>,
    /// Unique column checked before writes, when the entity has one.
    pub natural_key: Option<String>,
    pub policy: FieldPolicy,
}

impl ResolvedEntity {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn writable_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| !c.read_only)
    }
}

/// Process-wide entity registry. Built once at startup and read-only afterwards.
#[derive(Clone, Debug)]
pub struct Registry {
    pub entities: Vec<ResolvedEntity>,
    pub entity_by_path: HashMap<String, usize>,
}

impl Registry {
    pub fn entity_by_path(&self, path: &str) -> Option<&ResolvedEntity> {
        self.entity_by_path.get(path).map(|&i| &self.entities[i])
    }
}
