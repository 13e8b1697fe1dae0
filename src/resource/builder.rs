//! Binds the four CRUD routes for one collection onto a router, wiring
//! validation, identifier assignment, data access and hook overrides.

use crate::error::ResourceError;
use crate::resource::base::BaseResource;
use crate::resource::options::{ResourceOptions, ResourceRequest};
use crate::response::Reply;
use crate::service::id;
use crate::service::request::{self, Verb};
use crate::state::ResourceState;
use crate::store::ID_FIELD;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Registers `GET/POST /{collection}` and `GET/PUT/DELETE /{collection}/:id`
/// on `router`. Slots set on `options` replace the matching default
/// behavior; everything left `None` follows the validate → data access →
/// respond pipeline. Exactly one response is written per request.
pub fn build(
    router: Router,
    resource: Arc<BaseResource>,
    collection: &str,
    options: ResourceOptions,
) -> Router {
    let state = ResourceState {
        resource,
        collection: collection.to_string(),
        options: Arc::new(options),
    };
    let routes = Router::new()
        .route(&format!("/{collection}"), get(list).post(create))
        .route(
            &format!("/{collection}/:id"),
            get(read).put(update).delete(remove),
        )
        .with_state(state);
    router.merge(routes)
}

async fn list(
    State(state): State<ResourceState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    handle_get(state, None, params).await
}

async fn read(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    handle_get(state, Some(id), params).await
}

async fn handle_get(
    state: ResourceState,
    id: Option<String>,
    params: HashMap<String, String>,
) -> Response {
    let request = ResourceRequest {
        collection: state.collection.clone(),
        id,
        query: params,
        body: None,
    };
    if let Some(action) = &state.options.get {
        return action(request, Arc::clone(&state.options)).await;
    }
    if let Err(err) = request::validate(Verb::Get, &request) {
        return fail(&state, Verb::Get, request, err).await;
    }
    let found = state
        .resource
        .get(&state.collection, request.id.as_deref(), &request.query)
        .await;
    match found {
        Ok(result) => succeed(&state, Verb::Get, request, Reply::new(StatusCode::OK, result)).await,
        Err(err) => fail(&state, Verb::Get, request, err).await,
    }
}

async fn create(State(state): State<ResourceState>, body: Option<Json<Value>>) -> Response {
    let request = ResourceRequest {
        collection: state.collection.clone(),
        id: None,
        query: HashMap::new(),
        body: object_body(body),
    };
    if let Some(action) = &state.options.post {
        return action(request, Arc::clone(&state.options)).await;
    }
    if let Err(err) = request::validate(Verb::Post, &request) {
        return fail(&state, Verb::Post, request, err).await;
    }
    let id = id::generate();
    let mut data = request.body.clone().unwrap_or_default();
    data.insert(ID_FIELD.into(), Value::String(id.clone()));
    match state.resource.post(&state.collection, &mut data).await {
        Ok(()) => {
            let reply = Reply::new(StatusCode::CREATED, json!({ "id": id }));
            succeed(&state, Verb::Post, request, reply).await
        }
        Err(err) => fail(&state, Verb::Post, request, err).await,
    }
}

async fn update(
    State(state): State<ResourceState>,
    Path(id): Path<String>,
    body: Option<Json<Value>>,
) -> Response {
    let request = ResourceRequest {
        collection: state.collection.clone(),
        id: Some(id),
        query: HashMap::new(),
        body: object_body(body),
    };
    if let Some(action) = &state.options.put {
        return action(request, Arc::clone(&state.options)).await;
    }
    if let Err(err) = request::validate(Verb::Put, &request) {
        return fail(&state, Verb::Put, request, err).await;
    }
    let id = request.id.clone().unwrap_or_default();
    let mut data = request.body.clone().unwrap_or_default();
    match state.resource.put(&state.collection, &id, &mut data).await {
        Ok(()) => succeed(&state, Verb::Put, request, Reply::empty(StatusCode::NO_CONTENT)).await,
        Err(err) => fail(&state, Verb::Put, request, err).await,
    }
}

async fn remove(State(state): State<ResourceState>, Path(id): Path<String>) -> Response {
    let request = ResourceRequest {
        collection: state.collection.clone(),
        id: Some(id),
        query: HashMap::new(),
        body: None,
    };
    if let Some(action) = &state.options.delete {
        return action(request, Arc::clone(&state.options)).await;
    }
    if let Err(err) = request::validate(Verb::Delete, &request) {
        return fail(&state, Verb::Delete, request, err).await;
    }
    let id = request.id.clone().unwrap_or_default();
    match state.resource.remove(&state.collection, &id).await {
        Ok(()) => {
            succeed(&state, Verb::Delete, request, Reply::empty(StatusCode::NO_CONTENT)).await
        }
        Err(err) => fail(&state, Verb::Delete, request, err).await,
    }
}

async fn succeed(
    state: &ResourceState,
    verb: Verb,
    request: ResourceRequest,
    reply: Reply,
) -> Response {
    let hook = match verb {
        Verb::Get => &state.options.on_get_success,
        Verb::Post => &state.options.on_post_success,
        Verb::Put => &state.options.on_put_success,
        Verb::Delete => &state.options.on_delete_success,
    };
    match hook {
        Some(hook) => hook(request, reply).await,
        None => reply.into_response(),
    }
}

async fn fail(
    state: &ResourceState,
    verb: Verb,
    request: ResourceRequest,
    err: ResourceError,
) -> Response {
    let hook = match verb {
        Verb::Get => &state.options.on_get_error,
        Verb::Post => &state.options.on_post_error,
        Verb::Put => &state.options.on_put_error,
        Verb::Delete => &state.options.on_delete_error,
    };
    match hook {
        Some(hook) => hook(request, err).await,
        None => err.into_response(),
    }
}

/// A body is only usable when it parsed as a JSON object.
fn object_body(body: Option<Json<Value>>) -> Option<Map<String, Value>> {
    match body {
        Some(Json(Value::Object(map))) => Some(map),
        _ => None,
    }
}
