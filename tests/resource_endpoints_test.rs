//! End-to-end coverage of the generated endpoints: validation, storage,
//! query translation and hook overriding, all through full HTTP requests
//! against the in-memory store.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, Router};
use crudkit::service::id;
use crudkit::store::{DocumentStore, MemoryStore, StoreError, StoreSession};
use crudkit::{build, BaseResource, ResourceOptions, ResourceRequest};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const MISSING_ID: &str = "5adccd330a5b7e4ffc5bf1dc";

fn users_app(store: &MemoryStore) -> Router {
    users_app_with_options(store, ResourceOptions::default())
}

fn users_app_with_options(store: &MemoryStore, options: ResourceOptions) -> Router {
    let resource = Arc::new(BaseResource::new(Arc::new(store.clone())));
    build(Router::new(), resource, "users", options)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_json_body(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_user(app: &Router, body: Value) -> String {
    let response = app
        .clone()
        .oneshot(with_json_body("POST", "/users", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    body["id"].as_str().unwrap().to_string()
}

/// Store that refuses every connection. Proves a request never reached
/// storage: any storage call would answer 503 instead of the expected
/// validation status.
struct RefusingStore;

#[async_trait::async_trait]
impl DocumentStore for RefusingStore {
    async fn connect(&self) -> Result<Box<dyn StoreSession>, StoreError> {
        Err(StoreError::Connect("refused".into()))
    }
}

fn refusing_app(options: ResourceOptions) -> Router {
    let resource = Arc::new(BaseResource::new(Arc::new(RefusingStore)));
    build(Router::new(), resource, "users", options)
}

#[tokio::test]
async fn rejects_a_malformed_id_before_any_storage_call() {
    let app = refusing_app(ResourceOptions::default());

    let response = app.clone().oneshot(get("/users/123")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"message": "Id should be a string of 24 hex characters."})
    );

    let response = app
        .clone()
        .oneshot(with_json_body("PUT", "/users/123", &json!({"name": "x"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.clone().oneshot(delete("/users/123")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejects_an_empty_create_payload_before_any_storage_call() {
    let store = MemoryStore::new();
    let app = users_app(&store);

    let response = app
        .clone()
        .oneshot(with_json_body("POST", "/users", &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"message": "Request body cannot be empty."})
    );
    assert!(store.documents("users").is_empty());
}

#[tokio::test]
async fn rejects_an_empty_update_payload() {
    let store = MemoryStore::new();
    let app = users_app(&store);
    let id = create_user(&app, json!({"name": "Rafael"})).await;

    let response = app
        .clone()
        .oneshot(with_json_body("PUT", &format!("/users/{id}"), &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn creates_and_reads_back_a_document() {
    let store = MemoryStore::new();
    let app = users_app(&store);

    let id = create_user(&app, json!({"name": "Rafael", "username": "rafaelcamargo"})).await;
    assert!(id::is_valid(&id));

    let response = app
        .clone()
        .oneshot(get(&format!("/users/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let document = json_body(response).await;
    assert_eq!(document["id"], json!(id));
    assert_eq!(document["name"], json!("Rafael"));
    assert_eq!(document["username"], json!("rafaelcamargo"));
    assert!(document["createdAt"].is_string());
}

#[tokio::test]
async fn updates_a_document_and_keeps_its_creation_stamp() {
    let store = MemoryStore::new();
    let app = users_app(&store);
    let id = create_user(&app, json!({"name": "Rafael"})).await;
    let created_at = store.documents("users")[0]["createdAt"].clone();

    let response = app
        .clone()
        .oneshot(with_json_body(
            "PUT",
            &format!("/users/{id}"),
            &json!({"name": "Camargo"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get(&format!("/users/{id}")))
        .await
        .unwrap();
    let document = json_body(response).await;
    assert_eq!(document["name"], json!("Camargo"));
    assert_eq!(document["createdAt"], created_at);
    assert!(document["updatedAt"].is_string());
}

#[tokio::test]
async fn update_of_a_missing_document_is_not_found_and_writes_nothing() {
    let store = MemoryStore::new();
    let app = users_app(&store);

    let response = app
        .clone()
        .oneshot(with_json_body(
            "PUT",
            &format!("/users/{MISSING_ID}"),
            &json!({"name": "Camargo"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(store.documents("users").is_empty());
}

#[tokio::test]
async fn deletes_a_document() {
    let store = MemoryStore::new();
    let app = users_app(&store);
    let id = create_user(&app, json!({"name": "Rafael"})).await;

    let response = app
        .clone()
        .oneshot(delete(&format!("/users/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(store.documents("users").is_empty());

    let response = app
        .clone()
        .oneshot(get(&format!("/users/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lists_documents_with_filters_sort_and_pagination() {
    let store = MemoryStore::new();
    let app = users_app(&store);
    for (name, city) in [("ana", "poa"), ("bia", "poa"), ("carla", "sp")] {
        create_user(&app, json!({"name": name, "city": city})).await;
    }

    let response = app.clone().oneshot(get("/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 3);

    let response = app.clone().oneshot(get("/users?city=poa")).await.unwrap();
    let listed = json_body(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(get("/users?$sortBy=name&$order=asc&$limit=2"))
        .await
        .unwrap();
    let listed = json_body(response).await;
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|doc| doc["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["ana", "bia"]);

    let response = app
        .clone()
        .oneshot(get("/users?$sortBy=name&$order=asc&$page=2&$pageSize=2"))
        .await
        .unwrap();
    let listed = json_body(response).await;
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|doc| doc["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["carla"]);
}

#[tokio::test]
async fn listing_an_empty_collection_is_an_empty_array() {
    let store = MemoryStore::new();
    let app = users_app(&store);
    let response = app.clone().oneshot(get("/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn an_action_override_fully_replaces_the_default_pipeline() {
    let seen: Arc<Mutex<Option<ResourceRequest>>> = Arc::new(Mutex::new(None));
    let seen_by_hook = Arc::clone(&seen);
    let options = ResourceOptions {
        post: Some(ResourceOptions::action(move |request, _options| {
            let seen = Arc::clone(&seen_by_hook);
            async move {
                *seen.lock().unwrap() = Some(request);
                (StatusCode::ACCEPTED, Json(json!({"custom": true}))).into_response()
            }
        })),
        ..Default::default()
    };
    // A refusing store: had the default pipeline run, the response would be
    // 503 (or 400 for the empty body) instead of the override's 202.
    let app = refusing_app(options);

    let response = app
        .clone()
        .oneshot(with_json_body("POST", "/users", &json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(json_body(response).await, json!({"custom": true}));

    let request = seen.lock().unwrap().take().expect("override not invoked");
    assert_eq!(request.collection, "users");
    assert_eq!(request.body, Some(serde_json::Map::new()));
}

#[tokio::test]
async fn an_error_hook_replaces_the_default_error_write() {
    let options = ResourceOptions {
        on_get_error: Some(ResourceOptions::error_hook(|_request, err| async move {
            (
                StatusCode::IM_A_TEAPOT,
                Json(json!({"handled": err.status().as_u16()})),
            )
                .into_response()
        })),
        ..Default::default()
    };
    let store = MemoryStore::new();
    let app = users_app_with_options(&store, options);

    let response = app.clone().oneshot(get("/users/123")).await.unwrap();

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(json_body(response).await, json!({"handled": 400}));
}

#[tokio::test]
async fn a_success_hook_receives_the_response_descriptor() {
    let options = ResourceOptions {
        on_post_success: Some(ResourceOptions::success_hook(|_request, reply| async move {
            (
                StatusCode::OK,
                Json(json!({
                    "wrapped_status": reply.status.as_u16(),
                    "wrapped_body": reply.body,
                })),
            )
                .into_response()
        })),
        ..Default::default()
    };
    let store = MemoryStore::new();
    let app = users_app_with_options(&store, options);

    let response = app
        .clone()
        .oneshot(with_json_body("POST", "/users", &json!({"name": "Rafael"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["wrapped_status"], json!(201));
    let id = body["wrapped_body"]["id"].as_str().unwrap();
    assert!(id::is_valid(id));
    // The default pipeline still ran: the document exists in storage.
    assert_eq!(store.documents("users").len(), 1);
}
