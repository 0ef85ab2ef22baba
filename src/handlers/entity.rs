//! Entity CRUD handlers: list, read, create, update, delete.
//! The entity comes from the route's [`EntityPath`] extension, so one set of handlers serves every entity.

use crate::error::AppError;
use crate::response::{message, success_many, success_one};
use crate::schema::ResolvedEntity;
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Extension,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Path segment of the entity a route serves. Attached per entity router.
#[derive(Clone, Debug)]
pub struct EntityPath(pub Arc<str>);

fn entity<'a>(state: &'a AppState, path: &EntityPath) -> Result<&'a ResolvedEntity, AppError> {
    state
        .registry
        .entity_by_path(&path.0)
        .ok_or_else(|| AppError::NotFound(path.0.to_string()))
}

/// Identifiers are positive integers; anything else does not name a row.
fn parse_id(id_str: &str) -> Result<i64, AppError> {
    match id_str.parse::<i32>() {
        Ok(n) if n > 0 => Ok(i64::from(n)),
        _ => Err(AppError::NotFound(id_str.to_string())),
    }
}

/// Body must be a non-empty JSON object sent as JSON.
fn parse_body(headers: &HeaderMap, body: &Bytes) -> Result<Map<String, Value>, AppError> {
    if let Some(ct) = headers.get(header::CONTENT_TYPE) {
        let ct = ct.to_str().unwrap_or_default();
        if !ct.to_ascii_lowercase().contains("json") {
            return Err(AppError::MalformedRequest(format!("content type {}", ct)));
        }
    }
    if body.is_empty() {
        return Err(AppError::MalformedRequest("empty body".into()));
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(m)) if !m.is_empty() => Ok(m),
        Ok(_) => Err(AppError::MalformedRequest("body is not a non-empty JSON object".into())),
        Err(e) => Err(AppError::MalformedRequest(e.to_string())),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(path): Extension<EntityPath>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity(&state, &path)?;
    let rows = CrudService::list(&state, entity, &params).await?;
    Ok(success_many(rows, params))
}

pub async fn read(
    State(state): State<AppState>,
    Extension(path): Extension<EntityPath>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity(&state, &path)?;
    let id = parse_id(&id_str)?;
    let row = CrudService::read(&state, entity, id).await?;
    Ok(success_one(row))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(path): Extension<EntityPath>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity(&state, &path)?;
    let body = parse_body(&headers, &body)?;
    let row = CrudService::create(&state, entity, &body).await?;
    Ok(success_one(row))
}

/// The body is checked before the row is looked up.
pub async fn update(
    State(state): State<AppState>,
    Extension(path): Extension<EntityPath>,
    Path(id_str): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity(&state, &path)?;
    let body = parse_body(&headers, &body)?;
    let id = parse_id(&id_str)?;
    let row = CrudService::update(&state, entity, id, &body).await?;
    Ok(success_one(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(path): Extension<EntityPath>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity(&state, &path)?;
    let id = parse_id(&id_str)?;
    let msg = CrudService::delete(&state, entity, id).await?;
    Ok(message(msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("7").unwrap(), 7);
        assert!(matches!(parse_id("0"), Err(AppError::NotFound(_))));
        assert!(matches!(parse_id("-3"), Err(AppError::NotFound(_))));
        assert!(matches!(parse_id("abc"), Err(AppError::NotFound(_))));
        assert!(matches!(parse_id("99999999999"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn bodies_that_carry_no_data_are_malformed() {
        let none = HeaderMap::new();
        for raw in ["", "not json", "[1, 2]", "{}", "null"] {
            let err = parse_body(&none, &Bytes::from(raw)).unwrap_err();
            assert!(matches!(err, AppError::MalformedRequest(_)), "{raw:?}");
        }
        assert!(parse_body(&none, &Bytes::from(r#"{"name": "Rex"}"#)).is_ok());
    }

    #[test]
    fn non_json_content_type_is_malformed() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let err = parse_body(&headers, &Bytes::from(r#"{"name": "Rex"}"#)).unwrap_err();
        assert!(matches!(err, AppError::MalformedRequest(_)));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        assert!(parse_body(&headers, &Bytes::from(r#"{"name": "Rex"}"#)).is_ok());
    }
}
