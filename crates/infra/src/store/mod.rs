//! Data-access contract for the remote relational store.
//!
//! Every entity surface goes through the same six operations. All of them are
//! single-shot: no retry, no backoff, no caching. Failures come back as one
//! [`DataAccessError`] carrying a human-readable message.

pub mod memory;
pub mod rest;

use std::sync::Arc;

use auditdesk_core::Table;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::query::Query;

pub use memory::{InMemoryStore, StoreOp};
pub use rest::RestStore;

/// A row as exchanged with the store: a JSON object keyed by column.
pub type Row = Map<String, Value>;

pub type DataResult<T> = Result<T, DataAccessError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataAccessError {
    #[error("network error: {0}")]
    Network(String),

    #[error("store rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response from store: {0}")]
    Decode(String),

    #[error("{table} row {id} not found")]
    NotFound { table: Table, id: Uuid },

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl DataAccessError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

/// Async store contract implemented by the REST and in-memory backends.
#[async_trait::async_trait]
pub trait DataStore: Send + Sync {
    /// Rows matching `query`, with embeds resolved. A missing related row
    /// yields `null` (to-one) or `[]` (to-many), never an error.
    async fn select(&self, query: &Query) -> DataResult<Vec<Row>>;

    /// Number of rows matching the query's filters.
    async fn count(&self, query: &Query) -> DataResult<u64>;

    /// Insert one row. The store assigns `id` and `created_at` when absent.
    async fn insert(&self, table: Table, row: Row) -> DataResult<Row>;

    /// Insert-or-merge on `on_conflict`.
    async fn upsert(&self, table: Table, rows: Vec<Row>, on_conflict: &str) -> DataResult<Vec<Row>>;

    /// Merge `patch` into the row with `id`. Last write wins.
    async fn update(&self, table: Table, id: Uuid, patch: Row) -> DataResult<Row>;

    /// Remove the row with `id`. Children are left in place.
    async fn delete(&self, table: Table, id: Uuid) -> DataResult<()>;
}

#[async_trait::async_trait]
impl<S> DataStore for Arc<S>
where
    S: DataStore + ?Sized,
{
    async fn select(&self, query: &Query) -> DataResult<Vec<Row>> {
        (**self).select(query).await
    }

    async fn count(&self, query: &Query) -> DataResult<u64> {
        (**self).count(query).await
    }

    async fn insert(&self, table: Table, row: Row) -> DataResult<Row> {
        (**self).insert(table, row).await
    }

    async fn upsert(&self, table: Table, rows: Vec<Row>, on_conflict: &str) -> DataResult<Vec<Row>> {
        (**self).upsert(table, rows, on_conflict).await
    }

    async fn update(&self, table: Table, id: Uuid, patch: Row) -> DataResult<Row> {
        (**self).update(table, id, patch).await
    }

    async fn delete(&self, table: Table, id: Uuid) -> DataResult<()> {
        (**self).delete(table, id).await
    }
}

/// Serialize a payload into a row. The payload must serialize to an object.
pub fn to_row<T: Serialize + ?Sized>(value: &T) -> DataResult<Row> {
    match serde_json::to_value(value) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => Err(DataAccessError::decode(format!("expected a JSON object, got {other}"))),
        Err(e) => Err(DataAccessError::decode(e.to_string())),
    }
}

pub fn from_row<T: DeserializeOwned>(row: Row) -> DataResult<T> {
    serde_json::from_value(Value::Object(row)).map_err(|e| DataAccessError::decode(e.to_string()))
}
