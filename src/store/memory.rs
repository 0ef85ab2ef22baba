//! In-process store with the same semantics as the PostgreSQL one.

use super::{timestamp_text, EntityStore, Predicate, Row};
use crate::error::AppError;
use crate::schema::ResolvedEntity;
use crate::service::conflict_error;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct Table {
    /// Last allocated id; never reused after deletes.
    last_id: i64,
    rows: BTreeMap<i64, Row>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn now() -> Value {
    Value::String(timestamp_text(chrono::Utc::now()))
}

/// Text form used for LIKE, matching PostgreSQL's `::text` casts.
fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn matches(row: &Row, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Eq { column, value } => row.get(column).map(|v| v == value).unwrap_or(false),
        Predicate::Like { column, pattern } => row
            .get(column)
            .and_then(as_text)
            .map(|text| like_match(pattern, &text))
            .unwrap_or(false),
    }
}

/// SQL LIKE semantics without an escape character: `%` is any run, `_` is one character.
pub fn like_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while ti < t.len() {
        if pi < p.len() && (p[pi] == '_' || (p[pi] != '%' && p[pi] == t[ti])) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '%' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if let Some((bp, bt)) = backtrack {
            pi = bp + 1;
            ti = bt + 1;
            backtrack = Some((bp, bt + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '%')
}

/// Fail when another row already holds the natural-key value being written.
fn check_natural_key(table: &Table, entity: &ResolvedEntity, values: &Row, excluding: Option<i64>) -> Result<(), AppError> {
    let Some(key) = entity.natural_key.as_deref() else { return Ok(()) };
    let Some(value) = values.get(key).filter(|v| !v.is_null()) else { return Ok(()) };
    let taken = table
        .rows
        .iter()
        .any(|(id, row)| Some(*id) != excluding && row.get(key) == Some(value));
    if taken {
        return Err(conflict_error(entity, key, value));
    }
    Ok(())
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn list(&self, entity: &ResolvedEntity, predicates: &[Predicate]) -> Result<Vec<Row>, AppError> {
        let tables = self.tables.read().await;
        let Some(table) = tables.get(&entity.table_name) else { return Ok(Vec::new()) };
        Ok(table
            .rows
            .values()
            .filter(|row| predicates.iter().all(|p| matches(row, p)))
            .cloned()
            .collect())
    }

    async fn get(&self, entity: &ResolvedEntity, id: i64) -> Result<Option<Row>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.get(&entity.table_name).and_then(|t| t.rows.get(&id)).cloned())
    }

    async fn fetch_where_in(&self, entity: &ResolvedEntity, column: &str, values: &[i64]) -> Result<Vec<Row>, AppError> {
        let tables = self.tables.read().await;
        let Some(table) = tables.get(&entity.table_name) else { return Ok(Vec::new()) };
        Ok(table
            .rows
            .values()
            .filter(|row| {
                row.get(column)
                    .and_then(Value::as_i64)
                    .map(|v| values.contains(&v))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn insert(&self, entity: &ResolvedEntity, values: &Row) -> Result<Row, AppError> {
        let mut tables = self.tables.write().await;
        let table = tables.entry(entity.table_name.clone()).or_default();
        check_natural_key(table, entity, values, None)?;

        table.last_id += 1;
        let id = table.last_id;
        let mut row = Row::new();
        for c in &entity.columns {
            let v = match c.name.as_str() {
                n if n == entity.pk_column => Value::from(id),
                "date_created" => now(),
                _ if c.read_only => Value::Null,
                n => values.get(n).cloned().unwrap_or(Value::Null),
            };
            row.insert(c.name.clone(), v);
        }
        table.rows.insert(id, row.clone());
        tracing::debug!(table = %entity.table_name, id, "memory insert");
        Ok(row)
    }

    async fn update(&self, entity: &ResolvedEntity, id: i64, values: &Row) -> Result<Option<Row>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(&entity.table_name) else { return Ok(None) };
        if !table.rows.contains_key(&id) {
            return Ok(None);
        }
        check_natural_key(table, entity, values, Some(id))?;
        let Some(row) = table.rows.get_mut(&id) else { return Ok(None) };
        for c in entity.writable_columns() {
            if let Some(v) = values.get(&c.name) {
                row.insert(c.name.clone(), v.clone());
            }
        }
        row.insert("date_modified".into(), now());
        Ok(Some(row.clone()))
    }

    async fn delete(&self, entity: &ResolvedEntity, id: i64) -> Result<Option<Row>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.get_mut(&entity.table_name).and_then(|t| t.rows.remove(&id)))
    }

    async fn count_matching(
        &self,
        entity: &ResolvedEntity,
        column: &str,
        value: &Value,
        excluding: Option<i64>,
    ) -> Result<u64, AppError> {
        let tables = self.tables.read().await;
        let Some(table) = tables.get(&entity.table_name) else { return Ok(0) };
        Ok(table
            .rows
            .iter()
            .filter(|(id, row)| Some(**id) != excluding && row.get(column) == Some(value))
            .count() as u64)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
