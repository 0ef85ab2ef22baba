//! PostgreSQL store: generic CRUD execution through the safe SQL builder.

use super::{timestamp_text, EntityStore, Predicate, Row};
use crate::error::AppError;
use crate::schema::{ColumnType, ResolvedEntity};
use crate::service::conflict_error;
use crate::sql::{self, PgBindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    /// Schema holding the entity tables.
    schema: String,
}

impl PgStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgStore {
            pool,
            schema: schema.into(),
        }
    }

    async fn query_many(&self, entity: &ResolvedEntity, q: &QueryBuf) -> Result<Vec<Row>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from(p));
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(|r| row_to_json(entity, r)).collect()
    }

    async fn query_optional(&self, entity: &ResolvedEntity, q: &QueryBuf) -> Result<Option<Row>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from(p));
        }
        let row = query.fetch_optional(&self.pool).await?;
        row.map(|r| row_to_json(entity, &r)).transpose()
    }

    /// Writes share error handling: a unique violation is the same conflict the pre-check reports.
    async fn write(&self, entity: &ResolvedEntity, q: &QueryBuf, values: &Row) -> Result<Option<Row>, AppError> {
        match self.query_optional(entity, q).await {
            Err(AppError::Db(sqlx::Error::Database(db))) if db.is_unique_violation() => {
                let key = entity.natural_key.as_deref().unwrap_or("name");
                let value = values.get(key).cloned().unwrap_or(Value::Null);
                tracing::warn!(table = %entity.table_name, constraint = ?db.constraint(), "unique violation on write");
                Err(conflict_error(entity, key, &value))
            }
            other => other,
        }
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn list(&self, entity: &ResolvedEntity, predicates: &[Predicate]) -> Result<Vec<Row>, AppError> {
        let q = sql::select_list(entity, predicates, &self.schema);
        self.query_many(entity, &q).await
    }

    async fn get(&self, entity: &ResolvedEntity, id: i64) -> Result<Option<Row>, AppError> {
        let mut q = sql::select_by_id(entity, &self.schema);
        q.params.push(Value::from(id));
        self.query_optional(entity, &q).await
    }

    async fn fetch_where_in(&self, entity: &ResolvedEntity, column: &str, values: &[i64]) -> Result<Vec<Row>, AppError> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let values: Vec<Value> = values.iter().map(|&v| Value::from(v)).collect();
        let q = sql::select_by_column_in(entity, column, &values, &self.schema);
        self.query_many(entity, &q).await
    }

    async fn insert(&self, entity: &ResolvedEntity, values: &Row) -> Result<Row, AppError> {
        let q = sql::insert(entity, values, &self.schema);
        self.write(entity, &q, values)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn update(&self, entity: &ResolvedEntity, id: i64, values: &Row) -> Result<Option<Row>, AppError> {
        let q = sql::update(entity, id, values, &self.schema);
        self.write(entity, &q, values).await
    }

    async fn delete(&self, entity: &ResolvedEntity, id: i64) -> Result<Option<Row>, AppError> {
        let mut q = sql::delete(entity, &self.schema);
        q.params.push(Value::from(id));
        self.query_optional(entity, &q).await
    }

    async fn count_matching(
        &self,
        entity: &ResolvedEntity,
        column: &str,
        value: &Value,
        excluding: Option<i64>,
    ) -> Result<u64, AppError> {
        let q = sql::count_matching(entity, column, value, excluding, &self.schema);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from(p));
        }
        let n = query.fetch_one(&self.pool).await?;
        Ok(n.max(0) as u64)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

/// Decode a row using the registry's column types.
fn row_to_json(entity: &ResolvedEntity, row: &PgRow) -> Result<Row, AppError> {
    use sqlx::Row as _;
    let mut map = Row::new();
    for c in &entity.columns {
        let name = c.name.as_str();
        let v = match c.ty {
            ColumnType::Integer => row.try_get::<Option<i32>, _>(name)?.map(Value::from),
            ColumnType::String(_) | ColumnType::Text => row.try_get::<Option<String>, _>(name)?.map(Value::String),
            ColumnType::Boolean => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
            ColumnType::Timestamp => row
                .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name)?
                .map(|d| Value::String(timestamp_text(d))),
        };
        map.insert(c.name.clone(), v.unwrap_or(Value::Null));
    }
    Ok(map)
}
