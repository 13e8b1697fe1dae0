//! Store connection settings.

use std::env;

pub const BASE_URL_VAR: &str = "DB_BASE_URL";
pub const DATABASE_VAR: &str = "DB_NAME";

const DEFAULT_BASE_URL: &str = "postgres://localhost:5432";
const DEFAULT_DATABASE: &str = "crudkit";

/// Connection target for the document store: server URL plus database name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub base_url: String,
    pub database: String,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        StoreConfig {
            base_url: base_url.into(),
            database: database.into(),
        }
    }

    /// Target from `DB_BASE_URL` / `DB_NAME`, falling back to a local
    /// development default.
    pub fn from_env() -> Self {
        StoreConfig {
            base_url: env::var(BASE_URL_VAR).unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
            database: env::var(DATABASE_VAR).unwrap_or_else(|_| DEFAULT_DATABASE.into()),
        }
    }

    /// Full connection URL for the configured database.
    pub fn connection_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.database)
    }
}
