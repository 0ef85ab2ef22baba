//! Shared helpers for the HTTP tests: app construction over either store and request plumbing.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use naviwatch_api::{app, ensure_database_exists, ensure_tables, resolve, AppState, MemoryStore, PgStore, CATALOGUE};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const BODY_LIMIT: usize = 1024 * 1024;

pub fn memory_app() -> Router {
    let registry = resolve(CATALOGUE).expect("catalogue resolves");
    app(AppState::new(Arc::new(MemoryStore::new()), registry), BODY_LIMIT)
}

/// App over PostgreSQL in a freshly recreated `schema`, or `None` when `DATABASE_URL` is unset.
pub async fn postgres_app(schema: &str) -> Option<Router> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping PostgreSQL test");
        return None;
    };
    ensure_database_exists(&url).await.expect("database exists");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect");
    sqlx::query(&format!("DROP SCHEMA IF EXISTS \"{}\" CASCADE", schema))
        .execute(&pool)
        .await
        .expect("drop schema");
    let registry = resolve(CATALOGUE).expect("catalogue resolves");
    ensure_tables(&pool, schema, &registry).await.expect("tables");
    Some(app(AppState::new(Arc::new(PgStore::new(pool, schema)), registry), BODY_LIMIT))
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

pub async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// `YYYY-MM-DDT` prefix of a timestamp as a LIKE filter value.
pub fn day_prefix_filter(timestamp: &Value) -> String {
    let text = timestamp.as_str().expect("timestamp is a string");
    format!("{}*", &text[..11])
}
