//! In-process document store with the same observable semantics as the
//! PostgreSQL backend. Backs the test suite and local development setups.

use super::{DocumentStore, StoreError, StoreSession, ID_FIELD};
use crate::service::query::{QuerySpec, SortOrder};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Collections = HashMap<String, Vec<Value>>;

#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one collection in insertion order. Inspection hook for
    /// tests and debugging.
    pub fn documents(&self, collection: &str) -> Vec<Value> {
        lock(&self.collections)
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn connect(&self) -> Result<Box<dyn StoreSession>, StoreError> {
        Ok(Box::new(MemorySession {
            collections: Arc::clone(&self.collections),
        }))
    }
}

struct MemorySession {
    collections: Arc<Mutex<Collections>>,
}

fn lock(collections: &Mutex<Collections>) -> MutexGuard<'_, Collections> {
    collections.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn find_one(
        &mut self,
        collection: &str,
        filter: &Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        Ok(lock(&self.collections).get(collection).and_then(|docs| {
            docs.iter()
                .find(|doc| matches_filter(doc, filter))
                .cloned()
        }))
    }

    async fn find(&mut self, collection: &str, spec: &QuerySpec) -> Result<Vec<Value>, StoreError> {
        let mut docs: Vec<Value> = lock(&self.collections)
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| matches_filter(doc, &spec.filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some((field, order)) = &spec.sort {
            docs.sort_by(|a, b| {
                let by_field = compare_values(a.get(field), b.get(field));
                match order {
                    SortOrder::Ascending => by_field,
                    SortOrder::Descending => by_field.reverse(),
                }
            });
        }

        let remaining = docs.into_iter().skip(spec.skip as usize);
        Ok(match spec.limit {
            0 => remaining.collect(),
            limit => remaining.take(limit as usize).collect(),
        })
    }

    async fn insert(&mut self, collection: &str, document: &Value) -> Result<(), StoreError> {
        if document.get(ID_FIELD).and_then(Value::as_str).is_none() {
            return Err(StoreError::Query("document carries no id".into()));
        }
        lock(&self.collections)
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(())
    }

    async fn update(
        &mut self,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<u64, StoreError> {
        let mut collections = lock(&self.collections);
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let mut matched = 0;
        for doc in docs.iter_mut() {
            if doc.get(ID_FIELD).and_then(Value::as_str) == Some(id) {
                if let Value::Object(map) = doc {
                    for (key, value) in fields {
                        map.insert(key.clone(), value.clone());
                    }
                }
                matched += 1;
            }
        }
        Ok(matched)
    }

    async fn delete(&mut self, collection: &str, id: &str) -> Result<u64, StoreError> {
        let mut collections = lock(&self.collections);
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|doc| doc.get(ID_FIELD).and_then(Value::as_str) != Some(id));
        Ok((before - docs.len()) as u64)
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

fn matches_filter(doc: &Value, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(key, value)| doc.get(key) == Some(value))
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}
