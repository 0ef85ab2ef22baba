//! Natural-key uniqueness check run before writes.
//!
//! This is a read-then-write check: two concurrent writers can both pass it. The stores
//! close that window themselves (a UNIQUE constraint in PostgreSQL, the write lock in
//! memory) and report the violation through [`conflict_error`].

use crate::error::{AppError, FieldErrors};
use crate::schema::ResolvedEntity;
use crate::store::{EntityStore, Row};
use serde_json::Value;

/// Conflict keyed by the natural-key field, e.g. `Pet with Name 'Fido' already exists`.
pub fn conflict_error(entity: &ResolvedEntity, key: &str, value: &Value) -> AppError {
    let shown = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    AppError::Conflict(FieldErrors::single(
        key,
        format!("{} with Name '{}' already exists", entity.name, shown),
    ))
}

/// Fail with a conflict when another row already uses the natural-key value in `values`.
/// For updates pass the current row; the check is skipped when the key does not change.
pub async fn ensure_unique(
    store: &dyn EntityStore,
    entity: &ResolvedEntity,
    values: &Row,
    current: Option<(i64, &Row)>,
) -> Result<(), AppError> {
    let Some(key) = entity.natural_key.as_deref() else { return Ok(()) };
    let Some(value) = values.get(key).filter(|v| !v.is_null()) else { return Ok(()) };
    if let Some((_, row)) = current {
        if row.get(key) == Some(value) {
            return Ok(());
        }
    }
    let excluding = current.map(|(id, _)| id);
    let taken = store.count_matching(entity, key, value, excluding).await?;
    if taken > 0 {
        tracing::debug!(entity = %entity.path_segment, %key, %value, "natural key already taken");
        return Err(conflict_error(entity, key, value));
    }
    Ok(())
}
