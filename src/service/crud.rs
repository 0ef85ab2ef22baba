//! CRUD orchestration shared by every entity: filters, validation, uniqueness, persistence, projection.

use super::{build_filters, ensure_unique, project_rows, RequestValidator};
use crate::error::AppError;
use crate::schema::ResolvedEntity;
use crate::state::AppState;
use crate::store::Row;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub struct CrudService;

impl CrudService {
    /// Rows matching the query-parameter filters, projected. Unknown keys are ignored.
    pub async fn list(
        state: &AppState,
        entity: &ResolvedEntity,
        params: &HashMap<String, String>,
    ) -> Result<Vec<Value>, AppError> {
        let predicates = build_filters(entity, params);
        let rows = state.store.list(entity, &predicates).await?;
        tracing::debug!(entity = %entity.path_segment, predicates = predicates.len(), rows = rows.len(), "list");
        project_rows(state.store.as_ref(), &state.registry, entity, rows).await
    }

    pub async fn read(state: &AppState, entity: &ResolvedEntity, id: i64) -> Result<Value, AppError> {
        let row = state
            .store
            .get(entity, id)
            .await?
            .ok_or_else(|| not_found(entity, id))?;
        Self::project_one(state, entity, row).await
    }

    pub async fn create(state: &AppState, entity: &ResolvedEntity, body: &Map<String, Value>) -> Result<Value, AppError> {
        let values = RequestValidator::validate(entity, body)?;
        ensure_unique(state.store.as_ref(), entity, &values, None).await?;
        let row = state.store.insert(entity, &values).await?;
        tracing::info!(entity = %entity.path_segment, id = ?row.get(&entity.pk_column), "created");
        Self::project_one(state, entity, row).await
    }

    /// Merge the body onto the existing row. Missing rows are reported before validation.
    pub async fn update(
        state: &AppState,
        entity: &ResolvedEntity,
        id: i64,
        body: &Map<String, Value>,
    ) -> Result<Value, AppError> {
        let current = state
            .store
            .get(entity, id)
            .await?
            .ok_or_else(|| not_found(entity, id))?;
        let values = RequestValidator::validate_partial(entity, body)?;
        ensure_unique(state.store.as_ref(), entity, &values, Some((id, &current))).await?;
        let row = state
            .store
            .update(entity, id, &values)
            .await?
            .ok_or_else(|| not_found(entity, id))?;
        tracing::info!(entity = %entity.path_segment, id, "updated");
        Self::project_one(state, entity, row).await
    }

    /// Hard delete. Returns the confirmation message; children keep their foreign keys.
    pub async fn delete(state: &AppState, entity: &ResolvedEntity, id: i64) -> Result<String, AppError> {
        let row = state
            .store
            .delete(entity, id)
            .await?
            .ok_or_else(|| not_found(entity, id))?;
        tracing::info!(entity = %entity.path_segment, id, "deleted");
        Ok(format!("Deleted {} '{}'", entity.name, delete_label(entity, &row, id)))
    }

    async fn project_one(state: &AppState, entity: &ResolvedEntity, row: Row) -> Result<Value, AppError> {
        let mut projected = project_rows(state.store.as_ref(), &state.registry, entity, vec![row]).await?;
        projected.pop().ok_or_else(|| AppError::NotFound(entity.path_segment.clone()))
    }
}

fn not_found(entity: &ResolvedEntity, id: i64) -> AppError {
    AppError::NotFound(format!("{}/{}", entity.path_segment, id))
}

/// Natural key when the entity has one and it is set, otherwise the identifier.
fn delete_label(entity: &ResolvedEntity, row: &Row, id: i64) -> String {
    entity
        .natural_key
        .as_deref()
        .and_then(|k| row.get(k))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string())
}
