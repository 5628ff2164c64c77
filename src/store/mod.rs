//! Record store abstraction.
//!
//! The wizards only ever see named collections of loosely-typed records with three
//! operations: create, update-by-id and select-by-filter.

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Column values of a record, keyed by storage column name.
pub type Fields = Map<String, Value>;

/// Error returned by a [`RecordStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown collection '{0}'")]
    UnknownCollection(String),
    #[error("collection '{collection}' has no column '{column}'")]
    UnknownColumn { collection: String, column: String },
    #[error("record {id} not found in '{collection}'")]
    NotFound { collection: String, id: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Filter for [`RecordStore::select`]. Unset fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordFilter {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl RecordFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            status: None,
        }
    }
}

/// Persistence backend for application records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record and return its generated identifier.
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Overwrite the given columns of an existing record.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Return all records matching the filter, oldest first.
    async fn select(
        &self,
        collection: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<Fields>, StoreError>;
}
