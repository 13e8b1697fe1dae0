//! Per-resource configuration: optional overrides for each verb's action,
//! success handling and error handling.

use crate::error::ResourceError;
use crate::response::Reply;
use axum::response::Response;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// The request data the pipeline extracted, as hooks receive it.
#[derive(Clone, Debug, Default)]
pub struct ResourceRequest {
    pub collection: String,
    pub id: Option<String>,
    pub query: HashMap<String, String>,
    pub body: Option<Map<String, Value>>,
}

pub type HookFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Replaces a verb's entire default pipeline: validation, storage and the
/// response write all become the override's responsibility.
pub type ActionOverride =
    Arc<dyn Fn(ResourceRequest, Arc<ResourceOptions>) -> HookFuture + Send + Sync>;

/// Receives the response descriptor the default pipeline was about to write
/// and returns the response to send instead.
pub type SuccessHook = Arc<dyn Fn(ResourceRequest, Reply) -> HookFuture + Send + Sync>;

/// Receives the error descriptor the default pipeline was about to write
/// and returns the response to send instead.
pub type ErrorHook = Arc<dyn Fn(ResourceRequest, ResourceError) -> HookFuture + Send + Sync>;

/// Absent slots select the built-in behavior. Constructed once per resource
/// build and read-only for the lifetime of the bound endpoints.
#[derive(Clone, Default)]
pub struct ResourceOptions {
    pub get: Option<ActionOverride>,
    pub post: Option<ActionOverride>,
    pub put: Option<ActionOverride>,
    pub delete: Option<ActionOverride>,
    pub on_get_success: Option<SuccessHook>,
    pub on_get_error: Option<ErrorHook>,
    pub on_post_success: Option<SuccessHook>,
    pub on_post_error: Option<ErrorHook>,
    pub on_put_success: Option<SuccessHook>,
    pub on_put_error: Option<ErrorHook>,
    pub on_delete_success: Option<SuccessHook>,
    pub on_delete_error: Option<ErrorHook>,
}

impl ResourceOptions {
    /// Wrap an async closure as an action override slot.
    pub fn action<F, Fut>(hook: F) -> ActionOverride
    where
        F: Fn(ResourceRequest, Arc<ResourceOptions>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Arc::new(move |request, options| Box::pin(hook(request, options)))
    }

    /// Wrap an async closure as a success-hook slot.
    pub fn success_hook<F, Fut>(hook: F) -> SuccessHook
    where
        F: Fn(ResourceRequest, Reply) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Arc::new(move |request, reply| Box::pin(hook(request, reply)))
    }

    /// Wrap an async closure as an error-hook slot.
    pub fn error_hook<F, Fut>(hook: F) -> ErrorHook
    where
        F: Fn(ResourceRequest, ResourceError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Arc::new(move |request, error| Box::pin(hook(request, error)))
    }
}
