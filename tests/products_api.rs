//! End-to-end tests for the product endpoints with an always-allow gate.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{MemoryStore, ScriptedDecisions, Script, TestApp};

mod common;

async fn app() -> (TestApp, Arc<MemoryStore>) {
    let store = MemoryStore::new();
    let app = common::spawn_app(
        common::test_config(),
        store.clone(),
        ScriptedDecisions::new(Script::AllowAll),
    )
    .await;
    (app, store)
}

async fn create(app: &TestApp, body: Value) -> (StatusCode, Value) {
    let res = app
        .client
        .post(app.url("/api/products"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

async fn widget(app: &TestApp) -> Value {
    let (status, body) = create(app, json!({"name": "Widget", "price": 9.99, "image": "http://x/w.png"})).await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"].clone()
}

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let (app, _) = app().await;

    let created = widget(&app).await;
    assert!(created["id"].as_i64().is_some());
    assert!(created["created_at"].is_string());
    assert_eq!(created["name"], "Widget");
    assert_eq!(created["price"], "9.99");
    assert_eq!(created["image"], "http://x/w.png");

    let res = app
        .client
        .get(app.url(&format!("/api/products/{}", created["id"])))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], created);
}

#[tokio::test]
async fn test_list_newest_first() {
    let (app, _) = app().await;
    let first = widget(&app).await;
    let (_, second) = create(&app, json!({"name": "Gadget", "price": "4.50", "image": "g.png"})).await;

    let body: Value = app
        .client
        .get(app.url("/api/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["id"], second["data"]["id"]);
    assert_eq!(data[1]["id"], first["id"]);
}

#[tokio::test]
async fn test_create_requires_every_field() {
    let (app, store) = app().await;

    for body in [
        json!({"name": "Widget", "price": 9.99}),
        json!({"name": "", "price": 9.99, "image": "w.png"}),
        json!({"name": "Widget", "price": 0, "image": "w.png"}),
        json!({}),
    ] {
        let (status, response) = create(&app, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["success"], false);
        assert_eq!(response["message"], "Please provide all the required fields");
    }
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_client_error() {
    let (app, store) = app().await;

    let res = app
        .client
        .post(app.url("/api/products"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_wrongly_typed_fields_are_bad_request() {
    let (app, store) = app().await;

    for body in [
        json!({"name": 123, "price": 1, "image": "w.png"}),
        json!({"name": "Widget", "price": "abc", "image": "w.png"}),
    ] {
        let (status, response) = create(&app, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["success"], false);
        assert!(response["message"].as_str().is_some_and(|m| !m.is_empty()));
    }
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_missing_content_type_is_bad_request() {
    let (app, store) = app().await;

    let res = app
        .client
        .post(app.url("/api/products"))
        .body(r#"{"name":"Widget","price":9.99,"image":"w.png"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_trailing_slash_reaches_same_handlers() {
    let (app, _) = app().await;
    let created = widget(&app).await;

    let list = app.client.get(app.url("/api/products/")).send().await.unwrap();
    assert_eq!(list.status(), StatusCode::OK);
    let body: Value = list.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let one = app
        .client
        .get(app.url(&format!("/api/products/{}/", created["id"])))
        .send()
        .await
        .unwrap();
    assert_eq!(one.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_single_field_keeps_others() {
    let (app, _) = app().await;
    let created = widget(&app).await;

    let res = app
        .client
        .put(app.url(&format!("/api/products/{}", created["id"])))
        .json(&json!({"price": 12.50}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["name"], created["name"]);
    assert_eq!(body["data"]["image"], created["image"]);
    assert_eq!(body["data"]["price"], "12.50");
}

#[tokio::test]
async fn test_update_without_fields_is_rejected() {
    let (app, store) = app().await;
    let created = widget(&app).await;
    let writes = store.writes();

    for body in [json!({}), json!({"colour": "red"})] {
        let res = app
            .client
            .put(app.url(&format!("/api/products/{}", created["id"])))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "Please provide at least one field to update");
    }
    assert_eq!(store.writes(), writes);
}

#[tokio::test]
async fn test_update_with_null_fields_keeps_row() {
    let (app, _) = app().await;
    let created = widget(&app).await;

    for body in [json!({"name": null}), json!({"name": null, "price": null, "image": null})] {
        let res = app
            .client
            .put(app.url(&format!("/api/products/{}", created["id"])))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["data"], created);
    }
}

#[tokio::test]
async fn test_missing_id_is_not_found_without_writes() {
    let (app, store) = app().await;

    let get = app.client.get(app.url("/api/products/999")).send().await.unwrap();
    assert_eq!(get.status(), StatusCode::NOT_FOUND);
    let body: Value = get.json().await.unwrap();
    assert_eq!(body, json!({"success": false, "message": "Product not found"}));

    let put = app
        .client
        .put(app.url("/api/products/999"))
        .json(&json!({"name": "Ghost"}))
        .send()
        .await
        .unwrap();
    assert_eq!(put.status(), StatusCode::NOT_FOUND);

    let delete = app.client.delete(app.url("/api/products/999")).send().await.unwrap();
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);

    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_delete_twice() {
    let (app, store) = app().await;
    let created = widget(&app).await;
    let path = format!("/api/products/{}", created["id"]);

    let first = app.client.delete(app.url(&path)).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["data"], created);
    assert_eq!(store.len(), 0);

    let second = app.client.delete(app.url(&path)).send().await.unwrap();
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_numeric_id_rejected() {
    let (app, _) = app().await;
    let res = app.client.get(app.url("/api/products/abc")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid product id");
}

#[tokio::test]
async fn test_store_failure_is_500_with_message() {
    let (app, store) = app().await;
    store.fail_queries();

    let res = app.client.get(app.url("/api/products")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], sqlx::Error::PoolTimedOut.to_string());

    // The server keeps serving after a failed request.
    let res = app.client.get(app.url("/api/products/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_responses_carry_security_headers_and_request_id() {
    let (app, _) = app().await;
    let res = app.client.get(app.url("/api/products")).send().await.unwrap();

    let headers = res.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert!(headers.get("content-security-policy").is_none());
    assert!(headers.get("x-request-id").is_some());
}
