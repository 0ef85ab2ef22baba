//! Descriptor validation: referential integrity and nesting consistency.

use super::types::{Cardinality, EntityDef};
use crate::error::ConfigError;
use std::collections::{HashMap, HashSet};

pub fn validate(defs: &[&EntityDef]) -> Result<(), ConfigError> {
    let mut by_path: HashMap<&str, &EntityDef> = HashMap::new();
    for def in defs {
        if by_path.insert(def.path_segment, def).is_some() {
            return Err(ConfigError::DuplicatePathSegment(def.path_segment.to_string()));
        }
    }

    for def in defs {
        let mut column_names = HashSet::new();
        for c in def.columns {
            if super::BASE_COLUMNS.iter().any(|b| b.name == c.name) {
                return Err(ConfigError::Validation(format!(
                    "{}: column '{}' shadows a base column",
                    def.path_segment, c.name
                )));
            }
            if !column_names.insert(c.name) {
                return Err(ConfigError::Validation(format!(
                    "{}: duplicate column '{}'",
                    def.path_segment, c.name
                )));
            }
        }
        if def.columns.iter().filter(|c| c.unique).count() > 1 {
            return Err(ConfigError::Validation(format!(
                "{}: at most one natural key column allowed",
                def.path_segment
            )));
        }

        for r in def.relations {
            let target = by_path.get(r.target).ok_or_else(|| ConfigError::MissingReference {
                kind: "entity",
                id: r.target.to_string(),
            })?;
            let fk_owner = match r.cardinality {
                Cardinality::OneToMany => target,
                Cardinality::ManyToOne => def,
            };
            if !fk_owner.columns.iter().any(|c| c.name == r.fk_column) {
                return Err(ConfigError::MissingReference {
                    kind: "column",
                    id: format!("{}.{}", fk_owner.path_segment, r.fk_column),
                });
            }
            if column_names.contains(r.name) {
                return Err(ConfigError::Validation(format!(
                    "{}: relation '{}' collides with a column",
                    def.path_segment, r.name
                )));
            }
        }
    }

    check_nesting_acyclic(&by_path)
}

/// Nested relations are projected recursively, so they must not form a cycle.
fn check_nesting_acyclic(by_path: &HashMap<&str, &EntityDef>) -> Result<(), ConfigError> {
    fn visit<'a>(
        path: &'a str,
        by_path: &HashMap<&'a str, &'a EntityDef>,
        stack: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
    ) -> Result<(), ConfigError> {
        if done.contains(path) {
            return Ok(());
        }
        if stack.contains(&path) {
            stack.push(path);
            return Err(ConfigError::NestingCycle(stack.join(" -> ")));
        }
        stack.push(path);
        if let Some(def) = by_path.get(path) {
            for r in def.relations.iter().filter(|r| r.nested) {
                visit(r.target, by_path, stack, done)?;
            }
        }
        stack.pop();
        done.insert(path);
        Ok(())
    }

    let mut done = HashSet::new();
    let mut paths: Vec<&str> = by_path.keys().copied().collect();
    paths.sort_unstable();
    for path in paths {
        visit(path, by_path, &mut Vec::new(), &mut done)?;
    }
    Ok(())
}
