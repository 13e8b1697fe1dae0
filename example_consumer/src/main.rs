//! Example consumer: a separate Rust project that uses crudkit as a
//! dependency. Mounts a `users` resource backed by PostgreSQL plus the
//! common status routes.
//!
//! Run from repo root: `cargo run -p example-consumer`

use axum::{routing::get, Json, Router};
use crudkit::store::PgStore;
use crudkit::{
    build, common_routes_with_ready, BaseResource, DocumentStore, ResourceOptions, StoreConfig,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crudkit=debug")),
        )
        .init();

    let store = PgStore::new(StoreConfig::from_env());
    store.ensure_database().await?;
    store.ensure_collection("users").await?;
    let store: Arc<dyn DocumentStore> = Arc::new(store);
    let resource = Arc::new(BaseResource::new(Arc::clone(&store)));

    let app = Router::new()
        .route("/", get(index))
        .merge(common_routes_with_ready(store));
    let app = build(app, resource, "users", ResourceOptions::default());
    let app = app.layer(CorsLayer::permissive());

    let listener = TcpListener::bind("0.0.0.0:9000").await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "users": "/users{/id}",
        "status": "/status"
    }))
}
