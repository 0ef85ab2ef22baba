//! HTTP tests over the PostgreSQL store. Each test owns a schema and skips when
//! `DATABASE_URL` is not set.

mod common;

use axum::http::{Method, StatusCode};
use common::{day_prefix_filter, postgres_app, send, send_json};
use serde_json::json;

#[tokio::test]
async fn create_read_and_conflict() {
    let Some(app) = postgres_app("naviwatch_test_create").await else { return };

    let (status, created) = send_json(&app, Method::POST, "/pet/", Some(json!({"name": "Fido", "animal": "dog"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["data"]["xid"], 1);
    assert!(created["data"].get("birthday").is_none());

    let (status, read) = send_json(&app, Method::GET, "/pet/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["data"], read["data"]);

    let (status, body) = send_json(&app, Method::POST, "/pet/", Some(json!({"name": "Fido"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["name"][0], "Pet with Name 'Fido' already exists");
}

#[tokio::test]
async fn boolean_like_and_timestamp_filters() {
    let Some(app) = postgres_app("naviwatch_test_filters").await else { return };

    for name in ["Widget", "Wide", "Gadget"] {
        send_json(&app, Method::POST, "/thing/", Some(json!({"name": name}))).await;
    }
    let (_, body) = send_json(&app, Method::GET, "/thing/?name=Wid*", None).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Widget", "Wide"]);

    send_json(&app, Method::POST, "/toilet/", Some(json!({"pee": true, "poo": false}))).await;
    let (_, created) = send_json(&app, Method::POST, "/toilet/", Some(json!({"pee": false, "poo": true}))).await;
    let (_, body) = send_json(&app, Method::GET, "/toilet/?poo=false", None).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["poo"], false);

    let uri = format!("/toilet/?date_created={}", day_prefix_filter(&created["data"]["date_created"]));
    let (_, body) = send_json(&app, Method::GET, &uri, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send_json(&app, Method::GET, "/toilet/?pet_xid=abc", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn update_merges_and_rejects_taken_names() {
    let Some(app) = postgres_app("naviwatch_test_update").await else { return };

    send_json(&app, Method::POST, "/pet/", Some(json!({"name": "Rex", "animal": "dog"}))).await;
    send_json(&app, Method::POST, "/pet/", Some(json!({"name": "Max"}))).await;

    let (status, body) = send_json(&app, Method::PUT, "/pet/1", Some(json!({"birthday": "2020-01-01"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["animal"], "dog");
    assert_eq!(body["data"]["birthday"], "2020-01-01");
    assert!(body["data"].get("date_modified").is_some());

    let (status, _) = send_json(&app, Method::PUT, "/pet/1", Some(json!({"name": "Rex"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(&app, Method::PUT, "/pet/2", Some(json!({"name": "Rex"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, bytes) = send(&app, Method::PUT, "/pet/999", Some(json!({"name": "Zed"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn deleting_a_parent_with_children() {
    let Some(app) = postgres_app("naviwatch_test_delete").await else { return };

    send_json(&app, Method::POST, "/thing/", Some(json!({"name": "Box"}))).await;
    send_json(&app, Method::POST, "/stuff/", Some(json!({"stuff": "pen", "thing_xid": 1}))).await;

    let (_, body) = send_json(&app, Method::GET, "/thing/1", None).await;
    assert_eq!(body["data"]["stuff"][0]["stuff"], "pen");

    let (status, body) = send_json(&app, Method::DELETE, "/thing/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Deleted Thing 'Box'", "data": null}));

    let (status, body) = send_json(&app, Method::GET, "/stuff/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["thing_xid"], 1);

    let (status, _) = send_json(&app, Method::POST, "/stuff/", Some(json!({"stuff": "cup", "thing_xid": 999}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, bytes) = send(&app, Method::DELETE, "/thing/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(bytes.is_empty());
}
