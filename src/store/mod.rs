//! Document-store boundary: the contract the data-access layer requires
//! from any backing store, plus the bundled implementations.

pub mod memory;
pub mod postgres;

use crate::service::query::QuerySpec;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Document field holding the identifier.
pub const ID_FIELD: &str = "id";

#[derive(Error, Debug)]
pub enum StoreError {
    /// Establishing the connection itself failed.
    #[error("connect: {0}")]
    Connect(String),
    /// The store rejected or failed an operation on an open session.
    #[error("query: {0}")]
    Query(String),
}

/// Connection factory for one store deployment.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn StoreSession>, StoreError>;
}

/// One open connection, scoped to a single logical operation. Sessions are
/// never shared between requests.
#[async_trait]
pub trait StoreSession: Send {
    /// First document whose fields contain every pair of `filter`, if any.
    async fn find_one(
        &mut self,
        collection: &str,
        filter: &Map<String, Value>,
    ) -> Result<Option<Value>, StoreError>;

    /// Every document matching `spec.filter`, sorted, skipped and limited
    /// per `spec`. Documents with no sort field sort lowest.
    async fn find(&mut self, collection: &str, spec: &QuerySpec) -> Result<Vec<Value>, StoreError>;

    /// Persist a new document. The document must carry [`ID_FIELD`].
    async fn insert(&mut self, collection: &str, document: &Value) -> Result<(), StoreError>;

    /// Merge `fields` into the document with the given identifier. Returns
    /// the number of documents matched.
    async fn update(
        &mut self,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<u64, StoreError>;

    /// Returns the number of documents removed.
    async fn delete(&mut self, collection: &str, id: &str) -> Result<u64, StoreError>;

    /// Release the underlying connection. Dropping the session releases it
    /// as well; closing explicitly surfaces shutdown failures.
    async fn close(&mut self) -> Result<(), StoreError>;
}
