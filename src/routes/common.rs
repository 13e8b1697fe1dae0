//! Routes shared by every deployment: status, version, readiness.

use crate::store::DocumentStore;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct StatusBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
}

async fn status() -> Json<StatusBody> {
    Json(StatusBody { status: "ok" })
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn ready(
    State(store): State<Arc<dyn DocumentStore>>,
) -> Result<Json<ReadyBody>, (StatusCode, Json<ReadyBody>)> {
    match store.connect().await {
        Ok(mut session) => {
            let _ = session.close().await;
            Ok(Json(ReadyBody {
                status: "ok",
                database: Some("ok"),
            }))
        }
        Err(_) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                database: Some("unavailable"),
            }),
        )),
    }
}

/// GET /status and GET /version.
pub fn common_routes() -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/version", get(version))
}

/// Common routes plus GET /ready, which probes one store connection.
pub fn common_routes_with_ready(store: Arc<dyn DocumentStore>) -> Router {
    common_routes().merge(Router::new().route("/ready", get(ready)).with_state(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError, StoreSession};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct RefusingStore;

    #[async_trait]
    impl DocumentStore for RefusingStore {
        async fn connect(&self) -> Result<Box<dyn StoreSession>, StoreError> {
            Err(StoreError::Connect("refused".into()))
        }
    }

    async fn send(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn status_is_always_ok() {
        let response = send(common_routes(), "/status").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_reports_ok_when_the_store_connects() {
        let app = common_routes_with_ready(Arc::new(MemoryStore::new()));
        let response = send(app, "/ready").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_degrades_when_the_store_is_unreachable() {
        let app = common_routes_with_ready(Arc::new(RefusingStore));
        let response = send(app, "/ready").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
