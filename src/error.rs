//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate path segment: {0}")]
    DuplicatePathSegment(String),
    #[error("nested relations form a cycle: {0}")]
    NestingCycle(String),
    #[error("invalid setting {key}={value}")]
    InvalidSetting { key: &'static str, value: String },
    #[error("validation: {0}")]
    Validation(String),
}

/// Field-keyed error messages, e.g. `{"name": ["Missing data for required field."]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, msgs)| format!("{}: {}", field, msgs.join(" ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Fixed message for a missing or unparseable request body.
pub const NO_JSON_MESSAGE: &str = "No JSON data received";

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(FieldErrors),
    #[error("conflict: {0}")]
    Conflict(FieldErrors),
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Serialize)]
pub struct ErrorBody<E: Serialize> {
    pub error: E,
    pub data: Option<()>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(what) => {
                tracing::debug!(%what, "not found");
                StatusCode::NOT_FOUND.into_response()
            }
            AppError::Validation(errors) => error_response(StatusCode::UNPROCESSABLE_ENTITY, errors),
            AppError::Conflict(errors) => error_response(StatusCode::CONFLICT, errors),
            AppError::MalformedRequest(reason) => {
                tracing::debug!(%reason, "malformed request body");
                error_response(StatusCode::UNPROCESSABLE_ENTITY, NO_JSON_MESSAGE)
            }
            AppError::Config(e) => {
                tracing::error!(error = %e, "configuration error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
            AppError::Db(e) => {
                tracing::error!(error = %e, "database error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }
}

fn error_response<E: Serialize>(status: StatusCode, error: E) -> Response {
    (status, Json(ErrorBody { error, data: None })).into_response()
}
