//! Resolve static descriptors into the runtime registry.

use super::resolved::{ColumnInfo, Registry, RelationSpec, ResolvedEntity, PK_COLUMN};
use super::types::{Cardinality, EntityDef};
use super::{validate, BASE_COLUMNS};
use crate::error::ConfigError;
use std::collections::HashMap;

/// Build the registry from entity descriptors (validates first).
pub fn resolve(defs: &[&EntityDef]) -> Result<Registry, ConfigError> {
    validate(defs)?;

    let mut entities = Vec::with_capacity(defs.len());
    let mut entity_by_path = HashMap::new();

    for def in defs {
        let mut columns: Vec<ColumnInfo> = BASE_COLUMNS
            .iter()
            .map(|b| ColumnInfo {
                name: b.name.to_string(),
                ty: b.ty,
                required: false,
                unique: false,
                read_only: b.name != "updated_by",
                references: None,
            })
            .collect();

        for c in def.columns {
            let references = def
                .relations
                .iter()
                .find(|r| r.cardinality == Cardinality::ManyToOne && r.fk_column == c.name)
                .map(|r| r.target.to_string());
            columns.push(ColumnInfo {
                name: c.name.to_string(),
                ty: c.ty,
                required: c.required,
                unique: c.unique,
                read_only: false,
                references,
            });
        }

        let relations = def
            .relations
            .iter()
            .map(|r| RelationSpec {
                name: r.name.to_string(),
                target: r.target.to_string(),
                cardinality: r.cardinality,
                fk_column: r.fk_column.to_string(),
                nested: r.nested,
            })
            .collect();

        let natural_key = def.columns.iter().find(|c| c.unique).map(|c| c.name.to_string());

        entity_by_path.insert(def.path_segment.to_string(), entities.len());
        entities.push(ResolvedEntity {
            name: def.name.to_string(),
            table_name: def.table_name.to_string(),
            path_segment: def.path_segment.to_string(),
            pk_column: PK_COLUMN.to_string(),
            columns,
            relations,
            natural_key,
            policy: def.policy,
        });
    }

    tracing::debug!(entities = entities.len(), "entity registry resolved");
    Ok(Registry {
        entities,
        entity_by_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{ColumnDef, ColumnType, FieldPolicy, RelationDef};
    use crate::schema::CATALOGUE;

    #[test]
    fn catalogue_resolves() {
        let registry = resolve(CATALOGUE).unwrap();
        assert_eq!(registry.entities.len(), 8);

        let pet = registry.entity_by_path("pet").unwrap();
        let names: Vec<&str> = pet.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            ["xid", "date_created", "date_modified", "updated_by", "name", "animal", "birthday"]
        );
        assert_eq!(pet.natural_key.as_deref(), Some("name"));
        assert!(pet.column("xid").unwrap().read_only);
        assert!(!pet.column("updated_by").unwrap().read_only);

        let food = registry.entity_by_path("food").unwrap();
        assert_eq!(food.natural_key, None);
        let fk = food.column("pet_xid").unwrap();
        assert!(fk.is_id_field());
        assert_eq!(fk.references.as_deref(), Some("pet"));
    }

    #[test]
    fn unknown_relation_target_is_rejected() {
        static BROKEN: EntityDef = EntityDef {
            name: "Broken",
            path_segment: "broken",
            table_name: "broken",
            columns: &[ColumnDef::new("ghost_xid", ColumnType::Integer)],
            relations: &[RelationDef::belongs_to("ghost", "ghost", "ghost_xid")],
            policy: FieldPolicy::show_ids(),
        };
        let err = resolve(&[&BROKEN]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingReference { kind: "entity", .. }));
    }

    #[test]
    fn nested_cycle_is_rejected() {
        static A: EntityDef = EntityDef {
            name: "A",
            path_segment: "a",
            table_name: "a",
            columns: &[ColumnDef::new("b_xid", ColumnType::Integer)],
            relations: &[RelationDef::nested_many("bs", "b", "a_xid")],
            policy: FieldPolicy::show_ids(),
        };
        static B: EntityDef = EntityDef {
            name: "B",
            path_segment: "b",
            table_name: "b",
            columns: &[ColumnDef::new("a_xid", ColumnType::Integer)],
            relations: &[RelationDef::nested_many("as", "a", "b_xid")],
            policy: FieldPolicy::show_ids(),
        };
        let err = resolve(&[&A, &B]).unwrap_err();
        assert!(matches!(err, ConfigError::NestingCycle(_)));
    }

    #[test]
    fn duplicate_path_segment_is_rejected() {
        let err = resolve(&[&crate::schema::entities::PET, &crate::schema::entities::PET]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePathSegment(p) if p == "pet"));
    }
}
