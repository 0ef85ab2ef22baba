//! Persistence seam: the CRUD engine talks to storage only through [`EntityStore`].

mod bootstrap;
mod memory;
mod postgres;

pub use bootstrap::{ensure_database_exists, ensure_tables};
pub use memory::{like_match, MemoryStore};
pub use postgres::PgStore;

use crate::error::AppError;
use crate::schema::ResolvedEntity;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Text form of every stored timestamp, e.g. `2026-10-19T04:00:42.123456Z`.
/// LIKE filters on timestamp columns match against this form in every store.
pub fn timestamp_text(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// One stored row as column name to JSON value.
pub type Row = serde_json::Map<String, Value>;

/// A single column-level filter condition. Lists combine predicates with AND.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Eq { column: String, value: Value },
    /// SQL LIKE: `%` matches any run of characters, `_` any single character.
    Like { column: String, pattern: String },
}

impl Predicate {
    pub fn column(&self) -> &str {
        match self {
            Predicate::Eq { column, .. } | Predicate::Like { column, .. } => column,
        }
    }
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Rows matching every predicate. Order is not part of the contract.
    async fn list(&self, entity: &ResolvedEntity, predicates: &[Predicate]) -> Result<Vec<Row>, AppError>;

    async fn get(&self, entity: &ResolvedEntity, id: i64) -> Result<Option<Row>, AppError>;

    /// Rows whose integer column is one of `values`. Used to batch-load relations.
    async fn fetch_where_in(&self, entity: &ResolvedEntity, column: &str, values: &[i64]) -> Result<Vec<Row>, AppError>;

    /// Insert writable columns from `values`; allocates the id and creation time.
    async fn insert(&self, entity: &ResolvedEntity, values: &Row) -> Result<Row, AppError>;

    /// Overwrite writable columns present in `values` and stamp the modification time.
    async fn update(&self, entity: &ResolvedEntity, id: i64, values: &Row) -> Result<Option<Row>, AppError>;

    /// Remove the row permanently, returning it. Children are left untouched.
    async fn delete(&self, entity: &ResolvedEntity, id: i64) -> Result<Option<Row>, AppError>;

    /// Number of rows with `column = value`, ignoring the row with id `excluding`.
    async fn count_matching(
        &self,
        entity: &ResolvedEntity,
        column: &str,
        value: &Value,
        excluding: Option<i64>,
    ) -> Result<u64, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}
