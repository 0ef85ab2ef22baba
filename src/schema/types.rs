//! Static entity descriptors. These are the compile-time tables the registry is resolved from.

/// Semantic column type. Drives filter coercion, body validation, DDL and row decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    /// Bounded string; the length is enforced on write.
    String(u32),
    Text,
    Boolean,
    Timestamp,
}

impl ColumnType {
    /// PostgreSQL type name, used for DDL and parameter casts.
    pub fn pg_type(&self) -> String {
        match self {
            ColumnType::Integer => "integer".into(),
            ColumnType::String(len) => format!("varchar({})", len),
            ColumnType::Text => "text".into(),
            ColumnType::Boolean => "boolean".into(),
            ColumnType::Timestamp => "timestamptz".into(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub required: bool,
    pub unique: bool,
}

impl ColumnDef {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        ColumnDef {
            name,
            ty,
            required: false,
            unique: false,
        }
    }

    /// Natural key: unique and required on create.
    pub const fn natural_key(name: &'static str, ty: ColumnType) -> Self {
        ColumnDef {
            name,
            ty,
            required: true,
            unique: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    /// The related entity holds `fk_column` pointing at our primary key.
    OneToMany,
    /// We hold `fk_column` pointing at the related entity's primary key.
    ManyToOne,
}

#[derive(Clone, Copy, Debug)]
pub struct RelationDef {
    pub name: &'static str,
    /// Path segment of the related entity.
    pub target: &'static str,
    pub cardinality: Cardinality,
    pub fk_column: &'static str,
    /// Serialize the related rows with their own projector instead of as identifiers.
    pub nested: bool,
}

impl RelationDef {
    pub const fn nested_many(name: &'static str, target: &'static str, fk_column: &'static str) -> Self {
        RelationDef {
            name,
            target,
            cardinality: Cardinality::OneToMany,
            fk_column,
            nested: true,
        }
    }

    pub const fn belongs_to(name: &'static str, target: &'static str, fk_column: &'static str) -> Self {
        RelationDef {
            name,
            target,
            cardinality: Cardinality::ManyToOne,
            fk_column,
            nested: false,
        }
    }
}

/// Which fields an entity's projection carries.
#[derive(Clone, Copy, Debug)]
pub struct FieldPolicy {
    /// Drop fields ending in the identifier suffix unless listed in `include`.
    pub exclude_ids: bool,
    pub include: &'static [&'static str],
    pub exclude: &'static [&'static str],
}

impl FieldPolicy {
    pub const fn show_ids() -> Self {
        FieldPolicy {
            exclude_ids: false,
            include: &[],
            exclude: &[],
        }
    }
}

impl Default for FieldPolicy {
    fn default() -> Self {
        FieldPolicy {
            exclude_ids: true,
            include: &[],
            exclude: &[],
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct EntityDef {
    /// Display name used in messages ("Pet with Name ...").
    pub name: &'static str,
    pub path_segment: &'static str,
    pub table_name: &'static str,
    /// Entity-specific columns; the shared base columns are added on resolve.
    pub columns: &'static [ColumnDef],
    pub relations: &'static [RelationDef],
    pub policy: FieldPolicy,
}
