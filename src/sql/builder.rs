//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE from a resolved entity.

use crate::schema::{ColumnType, ResolvedEntity};
use crate::store::{Predicate, Row};
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from the registry).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    /// Push a value and return its placeholder cast to the column's type.
    fn placeholder(&mut self, v: Value, ty: Option<ColumnType>) -> String {
        let n = self.push_param(v);
        match ty {
            Some(t) => format!("${}::{}", n, param_cast(t)),
            None => format!("${}", n),
        }
    }
}

/// Cast applied to bound parameters. Bounded strings cast to text so values are never truncated.
fn param_cast(ty: ColumnType) -> &'static str {
    match ty {
        ColumnType::Integer => "integer",
        ColumnType::String(_) | ColumnType::Text => "text",
        ColumnType::Boolean => "boolean",
        ColumnType::Timestamp => "timestamptz",
    }
}

/// `to_char` pattern producing the same text as `store::timestamp_text`.
const TIMESTAMP_TEXT_FORMAT: &str = r#"YYYY-MM-DD"T"HH24:MI:SS.US"Z""#;

/// Left-hand side of a LIKE: text columns as-is, timestamps in their API text form,
/// everything else through `::text`.
fn like_operand(column: &str, ty: ColumnType) -> String {
    match ty {
        ColumnType::String(_) | ColumnType::Text => quoted(column),
        ColumnType::Timestamp => format!(
            "to_char({} AT TIME ZONE 'UTC', '{}')",
            quoted(column),
            TIMESTAMP_TEXT_FORMAT
        ),
        ColumnType::Integer | ColumnType::Boolean => format!("{}::text", quoted(column)),
    }
}

fn column_type(entity: &ResolvedEntity, col: &str) -> Option<ColumnType> {
    entity.column(col).map(|c| c.ty)
}

fn select_column_list(entity: &ResolvedEntity) -> String {
    entity
        .columns
        .iter()
        .map(|c| quoted(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn where_clause(parts: &[String]) -> String {
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// SELECT by primary key. Caller binds the id as sole param.
pub fn select_by_id(entity: &ResolvedEntity, schema: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = $1::integer",
        select_column_list(entity),
        qualified_table(schema, &entity.table_name),
        quoted(&entity.pk_column)
    );
    q
}

/// SELECT list with predicates combined by AND, ORDER BY pk.
/// Predicates on columns unknown to the entity are dropped.
pub fn select_list(entity: &ResolvedEntity, predicates: &[Predicate], schema: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    for p in predicates {
        let Some(ty) = column_type(entity, p.column()) else { continue };
        match p {
            Predicate::Eq { column, value } => {
                let ph = q.placeholder(value.clone(), Some(ty));
                where_parts.push(format!("{} = {}", quoted(column), ph));
            }
            Predicate::Like { column, pattern } => {
                let ph = q.placeholder(Value::String(pattern.clone()), None);
                where_parts.push(format!("{} LIKE {}", like_operand(column, ty), ph));
            }
        }
    }
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}",
        select_column_list(entity),
        qualified_table(schema, &entity.table_name),
        where_clause(&where_parts),
        quoted(&entity.pk_column)
    );
    q
}

/// SELECT rows where column IN ($1, $2, ...) ORDER BY pk. Used for batch-fetching related rows.
pub fn select_by_column_in(entity: &ResolvedEntity, column_name: &str, values: &[Value], schema: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, &entity.table_name);
    let cols = select_column_list(entity);
    if values.is_empty() {
        q.sql = format!("SELECT {} FROM {} WHERE 1 = 0", cols, table);
        return q;
    }
    let ty = column_type(entity, column_name);
    let placeholders: Vec<String> = values.iter().map(|v| q.placeholder(v.clone(), ty)).collect();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} IN ({}) ORDER BY {}",
        cols,
        table,
        quoted(column_name),
        placeholders.join(", "),
        quoted(&entity.pk_column)
    );
    q
}

/// COUNT rows whose column equals value, optionally ignoring one primary key.
pub fn count_matching(
    entity: &ResolvedEntity,
    column_name: &str,
    value: &Value,
    excluding: Option<i64>,
    schema: &str,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.placeholder(value.clone(), column_type(entity, column_name));
    let mut where_parts = vec![format!("{} = {}", quoted(column_name), ph)];
    if let Some(id) = excluding {
        let ph = q.placeholder(Value::from(id), Some(ColumnType::Integer));
        where_parts.push(format!("{} <> {}", quoted(&entity.pk_column), ph));
    }
    q.sql = format!(
        "SELECT COUNT(*) FROM {}{}",
        qualified_table(schema, &entity.table_name),
        where_clause(&where_parts)
    );
    q
}

/// INSERT writable columns present in values. Read-only columns come from table defaults.
pub fn insert(entity: &ResolvedEntity, values: &Row, schema: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, &entity.table_name);
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in entity.writable_columns() {
        let Some(val) = values.get(&c.name) else { continue };
        placeholders.push(q.placeholder(val.clone(), Some(c.ty)));
        cols.push(quoted(&c.name));
    }
    let returning = select_column_list(entity);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE by id: SET writable columns present in values, and always stamp date_modified.
pub fn update(entity: &ResolvedEntity, id: i64, values: &Row, schema: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in entity.writable_columns() {
        let Some(val) = values.get(&c.name) else { continue };
        let ph = q.placeholder(val.clone(), Some(c.ty));
        sets.push(format!("{} = {}", quoted(&c.name), ph));
    }
    sets.push(format!("{} = NOW()", quoted("date_modified")));
    let id_ph = q.placeholder(Value::from(id), Some(ColumnType::Integer));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        qualified_table(schema, &entity.table_name),
        sets.join(", "),
        quoted(&entity.pk_column),
        id_ph,
        select_column_list(entity)
    );
    q
}

/// DELETE by id. Caller binds the id as sole param.
pub fn delete(entity: &ResolvedEntity, schema: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "DELETE FROM {} WHERE {} = $1::integer RETURNING {}",
        qualified_table(schema, &entity.table_name),
        quoted(&entity.pk_column),
        select_column_list(entity)
    );
    q
}
