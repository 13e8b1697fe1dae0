//! PostgreSQL document store: one table per collection, each document a
//! JSONB row keyed by its identifier.

use super::{DocumentStore, StoreError, StoreSession, ID_FIELD};
use crate::config::StoreConfig;
use crate::service::query::{QuerySpec, SortOrder};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, Connection, PgConnection, Row};
use std::str::FromStr;

/// Quote identifier for PostgreSQL (safe: collection names come from the
/// resource build call, not from request input).
fn quoted(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn connect_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::Connect(err.to_string())
}

fn query_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::Query(err.to_string())
}

pub struct PgStore {
    config: StoreConfig,
}

impl PgStore {
    pub fn new(config: StoreConfig) -> Self {
        PgStore { config }
    }

    /// Create the configured database if it does not exist yet. Connects to
    /// the maintenance `postgres` database to run CREATE DATABASE. Call
    /// before the first collection operation.
    pub async fn ensure_database(&self) -> Result<(), StoreError> {
        let database = &self.config.database;
        if database.is_empty() || database == "postgres" {
            return Ok(());
        }
        let admin_url = format!("{}/postgres", self.config.base_url.trim_end_matches('/'));
        let options = PgConnectOptions::from_str(&admin_url).map_err(connect_error)?;
        let mut conn = options.connect().await.map_err(connect_error)?;
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
                .bind(database)
                .fetch_one(&mut conn)
                .await
                .map_err(query_error)?;
        if !exists.0 {
            sqlx::query(&format!("CREATE DATABASE {}", quoted(database)))
                .execute(&mut conn)
                .await
                .map_err(query_error)?;
        }
        let _ = conn.close().await;
        Ok(())
    }

    /// Create the table backing `collection` if it does not exist yet.
    pub async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        let mut conn = self.open().await?;
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY, doc JSONB NOT NULL)",
            quoted(collection)
        );
        let result = sqlx::query(&ddl).execute(&mut conn).await;
        let _ = conn.close().await;
        result.map(|_| ()).map_err(query_error)
    }

    async fn open(&self) -> Result<PgConnection, StoreError> {
        let options =
            PgConnectOptions::from_str(&self.config.connection_url()).map_err(connect_error)?;
        options.connect().await.map_err(connect_error)
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn connect(&self) -> Result<Box<dyn StoreSession>, StoreError> {
        let conn = self.open().await?;
        Ok(Box::new(PgSession { conn: Some(conn) }))
    }
}

struct PgSession {
    conn: Option<PgConnection>,
}

impl PgSession {
    fn conn(&mut self) -> Result<&mut PgConnection, StoreError> {
        self.conn
            .as_mut()
            .ok_or_else(|| StoreError::Query("session already closed".into()))
    }
}

#[async_trait]
impl StoreSession for PgSession {
    async fn find_one(
        &mut self,
        collection: &str,
        filter: &Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        let sql = format!("SELECT doc FROM {} WHERE doc @> $1 LIMIT 1", quoted(collection));
        tracing::debug!(sql = %sql, "find_one");
        let row = sqlx::query(&sql)
            .bind(Value::Object(filter.clone()))
            .fetch_optional(self.conn()?)
            .await
            .map_err(query_error)?;
        row.map(|row| row.try_get::<Value, _>("doc"))
            .transpose()
            .map_err(query_error)
    }

    async fn find(&mut self, collection: &str, spec: &QuerySpec) -> Result<Vec<Value>, StoreError> {
        let mut sql = format!("SELECT doc FROM {} WHERE doc @> $1", quoted(collection));
        match spec.sort {
            Some((_, SortOrder::Ascending)) => sql.push_str(" ORDER BY doc->$2 ASC, id"),
            Some((_, SortOrder::Descending)) => sql.push_str(" ORDER BY doc->$2 DESC, id"),
            None => sql.push_str(" ORDER BY id"),
        }
        if spec.limit > 0 {
            sql.push_str(&format!(" LIMIT {}", spec.limit));
        }
        if spec.skip > 0 {
            sql.push_str(&format!(" OFFSET {}", spec.skip));
        }
        tracing::debug!(sql = %sql, "find");

        let mut query = sqlx::query(&sql).bind(Value::Object(spec.filter.clone()));
        if let Some((field, _)) = &spec.sort {
            query = query.bind(field.clone());
        }
        let rows = query
            .fetch_all(self.conn()?)
            .await
            .map_err(query_error)?;
        rows.into_iter()
            .map(|row| row.try_get::<Value, _>("doc"))
            .collect::<Result<_, _>>()
            .map_err(query_error)
    }

    async fn insert(&mut self, collection: &str, document: &Value) -> Result<(), StoreError> {
        let Some(id) = document.get(ID_FIELD).and_then(Value::as_str) else {
            return Err(StoreError::Query("document carries no id".into()));
        };
        let sql = format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", quoted(collection));
        tracing::debug!(sql = %sql, id = %id, "insert");
        sqlx::query(&sql)
            .bind(id)
            .bind(document)
            .execute(self.conn()?)
            .await
            .map(|_| ())
            .map_err(query_error)
    }

    async fn update(
        &mut self,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<u64, StoreError> {
        let sql = format!("UPDATE {} SET doc = doc || $2 WHERE id = $1", quoted(collection));
        tracing::debug!(sql = %sql, id = %id, "update");
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(Value::Object(fields.clone()))
            .execute(self.conn()?)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected())
    }

    async fn delete(&mut self, collection: &str, id: &str) -> Result<u64, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", quoted(collection));
        tracing::debug!(sql = %sql, id = %id, "delete");
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(self.conn()?)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected())
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        match self.conn.take() {
            Some(conn) => conn.close().await.map_err(query_error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_collection_names() {
        assert_eq!(quoted("users"), "\"users\"");
        assert_eq!(quoted("we\"ird"), "\"we\"\"ird\"");
    }
}
