//! Serialization projector: field selection per entity, relation nesting, empty-value pruning.

use crate::error::AppError;
use crate::schema::{Cardinality, FieldPolicy, Registry, RelationSpec, ResolvedEntity, ID_SUFFIX};
use crate::store::{EntityStore, Row};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;

/// Output field names for an entity under its own policy, columns first then relations.
pub fn field_names(entity: &ResolvedEntity) -> Vec<&str> {
    field_names_with(entity, &entity.policy)
}

/// Private (`_`-prefixed) and excluded names are dropped; with `exclude_ids`,
/// identifier-suffixed names are dropped unless whitelisted in `include`.
pub fn field_names_with<'a>(entity: &'a ResolvedEntity, policy: &FieldPolicy) -> Vec<&'a str> {
    let candidates = entity
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .chain(entity.relations.iter().map(|r| r.name.as_str()));
    candidates
        .filter(|name| !name.starts_with('_'))
        .filter(|name| !policy.exclude.contains(name))
        .filter(|name| !(policy.exclude_ids && name.ends_with(ID_SUFFIX) && !policy.include.contains(name)))
        .collect()
}

/// Only null, empty arrays and empty objects count as empty; `false`, `0` and `""` are kept.
pub fn is_empty_value(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

pub fn prune_empty(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().filter(|(_, v)| !is_empty_value(v)).collect()
}

/// Project one row. `related` holds already-projected relation values keyed by relation name.
pub fn project(entity: &ResolvedEntity, row: &Row, related: &HashMap<String, Value>) -> Value {
    let mut out = Map::new();
    for name in field_names(entity) {
        let v = if entity.column(name).is_some() {
            row.get(name).cloned()
        } else {
            related.get(name).cloned()
        };
        out.insert(name.to_string(), v.unwrap_or(Value::Null));
    }
    Value::Object(prune_empty(out))
}

type ProjectFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Value>, AppError>> + Send + 'a>>;

/// Load every projected relation of `rows` (one batch query per relation) and project them.
/// Output order matches `rows`. Nested relations recurse with the related entity's own policy.
pub fn project_rows<'a>(
    store: &'a dyn EntityStore,
    registry: &'a Registry,
    entity: &'a ResolvedEntity,
    rows: Vec<Row>,
) -> ProjectFuture<'a> {
    Box::pin(async move {
        let fields: HashSet<&str> = field_names(entity).into_iter().collect();
        let mut related: Vec<HashMap<String, Value>> = vec![HashMap::new(); rows.len()];

        for relation in entity.relations.iter().filter(|r| fields.contains(r.name.as_str())) {
            let target = registry
                .entity_by_path(&relation.target)
                .ok_or_else(|| crate::error::ConfigError::MissingReference {
                    kind: "entity",
                    id: relation.target.clone(),
                })?;
            let values = match relation.cardinality {
                Cardinality::OneToMany => load_children(store, registry, entity, target, relation, &rows).await?,
                Cardinality::ManyToOne => load_parents(store, registry, target, relation, &rows).await?,
            };
            for (slot, v) in related.iter_mut().zip(values) {
                slot.insert(relation.name.clone(), v);
            }
        }

        let projected: Vec<Value> = rows
            .iter()
            .zip(related.iter())
            .map(|(row, rel)| project(entity, row, rel))
            .collect();
        Ok::<_, AppError>(projected)
    })
}

fn int_at(row: &Row, column: &str) -> Option<i64> {
    row.get(column).and_then(Value::as_i64)
}

/// One value per parent row: projected children (nested) or child identifiers.
async fn load_children(
    store: &dyn EntityStore,
    registry: &Registry,
    entity: &ResolvedEntity,
    target: &ResolvedEntity,
    relation: &RelationSpec,
    rows: &[Row],
) -> Result<Vec<Value>, AppError> {
    let ids: Vec<i64> = rows.iter().filter_map(|r| int_at(r, &entity.pk_column)).collect();
    let children = store.fetch_where_in(target, &relation.fk_column, &ids).await?;
    let keys: Vec<Option<i64>> = children.iter().map(|c| int_at(c, &relation.fk_column)).collect();
    let child_values: Vec<Value> = if relation.nested {
        project_rows(store, registry, target, children).await?
    } else {
        children
            .iter()
            .map(|c| c.get(&target.pk_column).cloned().unwrap_or(Value::Null))
            .collect()
    };

    let mut grouped: HashMap<i64, Vec<Value>> = HashMap::new();
    for (key, v) in keys.into_iter().zip(child_values) {
        if let Some(k) = key {
            grouped.entry(k).or_default().push(v);
        }
    }
    Ok(rows
        .iter()
        .map(|r| {
            let list = int_at(r, &entity.pk_column)
                .and_then(|id| grouped.get(&id).cloned())
                .unwrap_or_default();
            Value::Array(list)
        })
        .collect())
}

/// One value per child row: the projected parent (nested) or the parent identifier.
async fn load_parents(
    store: &dyn EntityStore,
    registry: &Registry,
    target: &ResolvedEntity,
    relation: &RelationSpec,
    rows: &[Row],
) -> Result<Vec<Value>, AppError> {
    if !relation.nested {
        return Ok(rows
            .iter()
            .map(|r| r.get(&relation.fk_column).cloned().unwrap_or(Value::Null))
            .collect());
    }
    let mut fks: Vec<i64> = rows.iter().filter_map(|r| int_at(r, &relation.fk_column)).collect();
    fks.sort_unstable();
    fks.dedup();
    let parents = store.fetch_where_in(target, &target.pk_column, &fks).await?;
    let parent_ids: Vec<Option<i64>> = parents.iter().map(|p| int_at(p, &target.pk_column)).collect();
    let projected = project_rows(store, registry, target, parents).await?;
    let by_id: HashMap<i64, Value> = parent_ids
        .into_iter()
        .zip(projected)
        .filter_map(|(id, v)| id.map(|id| (id, v)))
        .collect();
    Ok(rows
        .iter()
        .map(|r| {
            int_at(r, &relation.fk_column)
                .and_then(|fk| by_id.get(&fk).cloned())
                .unwrap_or(Value::Null)
        })
        .collect())
}
