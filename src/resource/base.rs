//! Generic data access against one named collection in the document store.

use crate::error::ResourceError;
use crate::service::clock::{self, Clock, SystemClock};
use crate::service::query::{self, QuerySpec};
use crate::store::{DocumentStore, StoreError, StoreSession, ID_FIELD};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Field stamped once, when a document is created.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Field restamped on every update.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// CRUD operations over document collections. Each operation opens one
/// store session and releases it before returning, on success and on
/// failure alike; sessions are never held across operations.
pub struct BaseResource {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl BaseResource {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        BaseResource { store, clock }
    }

    /// Single document by id, merged with any filter fields compiled from
    /// `params`; or, when `id` is `None`, the compiled list query. A list
    /// with no matches is an empty array, not an error.
    pub async fn get(
        &self,
        collection: &str,
        id: Option<&str>,
        params: &HashMap<String, String>,
    ) -> Result<Value, ResourceError> {
        let mut session = self.connect().await?;
        let spec = query::build(params);
        let result = match id {
            Some(id) => fetch_one(session.as_mut(), collection, id, spec.filter).await,
            None => fetch_all(session.as_mut(), collection, &spec).await,
        };
        release(session).await;
        result
    }

    /// Stamps `createdAt` and persists. The identifier must already be set
    /// on `data`; callers read it back from there, not from the result.
    pub async fn post(
        &self,
        collection: &str,
        data: &mut Map<String, Value>,
    ) -> Result<(), ResourceError> {
        data.insert(CREATED_AT_FIELD.into(), Value::String(self.timestamp()));
        let mut session = self.connect().await?;
        let result = session
            .insert(collection, &Value::Object(data.clone()))
            .await
            .map_err(storage_error);
        release(session).await;
        result
    }

    /// Stamps `updatedAt` and merges `data` into the stored document. The
    /// document must already exist; a failed lookup (including not-found)
    /// is propagated unchanged and nothing is written.
    pub async fn put(
        &self,
        collection: &str,
        id: &str,
        data: &mut Map<String, Value>,
    ) -> Result<(), ResourceError> {
        data.insert(UPDATED_AT_FIELD.into(), Value::String(self.timestamp()));
        let mut session = self.connect().await?;
        let result = update_existing(session.as_mut(), collection, id, data).await;
        release(session).await;
        result
    }

    /// Deletes the document by id. The document must already exist.
    pub async fn remove(&self, collection: &str, id: &str) -> Result<(), ResourceError> {
        let mut session = self.connect().await?;
        let result = delete_existing(session.as_mut(), collection, id).await;
        release(session).await;
        result
    }

    async fn connect(&self) -> Result<Box<dyn StoreSession>, ResourceError> {
        self.store.connect().await.map_err(|err| {
            tracing::debug!(error = %err, "store connection failed");
            ResourceError::DbUnavailable
        })
    }

    fn timestamp(&self) -> String {
        clock::to_timestamp(self.clock.now())
    }
}

async fn fetch_one(
    session: &mut dyn StoreSession,
    collection: &str,
    id: &str,
    mut filter: Map<String, Value>,
) -> Result<Value, ResourceError> {
    filter.insert(ID_FIELD.into(), Value::String(id.to_string()));
    match session.find_one(collection, &filter).await {
        Ok(Some(document)) => Ok(document),
        Ok(None) => Err(ResourceError::ResourceNotFound),
        Err(err) => Err(storage_error(err)),
    }
}

async fn fetch_all(
    session: &mut dyn StoreSession,
    collection: &str,
    spec: &QuerySpec,
) -> Result<Value, ResourceError> {
    session
        .find(collection, spec)
        .await
        .map(Value::Array)
        .map_err(storage_error)
}

// Existence check and write are two steps on one session; a concurrent
// delete landing between them is accepted.
async fn update_existing(
    session: &mut dyn StoreSession,
    collection: &str,
    id: &str,
    data: &Map<String, Value>,
) -> Result<(), ResourceError> {
    fetch_one(session, collection, id, Map::new()).await?;
    session
        .update(collection, id, data)
        .await
        .map(|_| ())
        .map_err(storage_error)
}

async fn delete_existing(
    session: &mut dyn StoreSession,
    collection: &str,
    id: &str,
) -> Result<(), ResourceError> {
    fetch_one(session, collection, id, Map::new()).await?;
    session
        .delete(collection, id)
        .await
        .map(|_| ())
        .map_err(storage_error)
}

async fn release(mut session: Box<dyn StoreSession>) {
    if let Err(err) = session.close().await {
        tracing::warn!(error = %err, "failed to release store session");
    }
}

fn storage_error(err: StoreError) -> ResourceError {
    tracing::debug!(error = %err, "store operation failed");
    ResourceError::UnexpectedError
}
