//! Crudkit: generic CRUD REST resource library over document collections.
//!
//! Given a collection name, [`build`] registers the four CRUD endpoints
//! for it on an axum router, backed by a [`store::DocumentStore`], with
//! request validation, query compilation and per-verb override hooks.

pub mod config;
pub mod error;
pub mod resource;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::StoreConfig;
pub use error::ResourceError;
pub use resource::{build, BaseResource, ResourceOptions, ResourceRequest};
pub use response::Reply;
pub use routes::{common_routes, common_routes_with_ready};
pub use state::ResourceState;
pub use store::{DocumentStore, MemoryStore, PgStore, StoreError, StoreSession};
