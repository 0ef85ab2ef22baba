//! Standard response envelope helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
}

/// List envelope. Echoes the received query parameters for debugging.
#[derive(Serialize)]
pub struct SuccessMany<T> {
    #[serde(rename = "__args")]
    pub args: HashMap<String, String>,
    pub data: Vec<T>,
}

#[derive(Serialize)]
pub struct Message {
    pub message: String,
    pub data: Option<()>,
}

/// Creates answer 200 as well; callers rely on it.
pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::OK, Json(SuccessOne { data }))
}

pub fn success_many<T: Serialize>(data: Vec<T>, args: HashMap<String, String>) -> (StatusCode, Json<SuccessMany<T>>) {
    (StatusCode::OK, Json(SuccessMany { args, data }))
}

pub fn message(message: String) -> (StatusCode, Json<Message>) {
    (StatusCode::OK, Json(Message { message, data: None }))
}
