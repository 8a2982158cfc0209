//! Event persistence for Cephas.
//!
//! [`EventStore`] owns the query and soft-delete semantics. It talks to storage
//! through the narrow [`EventCollection`] trait, implemented in memory
//! ([`MemoryCollection`]) and, with the `mongodb` feature, by `MongoCollection`.

pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;
pub mod query;

use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::config::{StorageBackend, StorageConfig};
use crate::error::CephasError;
use crate::events::{EventDocument, EventKey, EventPatch, EventRecord, NewEvent};

pub use memory::MemoryCollection;
#[cfg(feature = "mongodb")]
pub use mongo::MongoCollection;
pub use query::{FieldUpdate, Filter, NearPoint, TimeRange};

/// Message returned to callers when no visible event matches.
pub const NO_RESULT: &str = "No matching result";

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Failure reported by a collection backend.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("collection unavailable: {0}")]
    Unavailable(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[cfg(feature = "mongodb")]
    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// Storage fault surfaced by [`EventStore`], one variant per operation.
///
/// The display strings are the messages clients see.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("An error occurred during insert")]
    Insert(#[source] CollectionError),

    #[error("An error occurred during search")]
    Search(#[source] CollectionError),

    #[error("An error occurred during update")]
    Update(#[source] CollectionError),

    #[error("An error occurred during delete")]
    Delete(#[source] CollectionError),
}

impl StoreError {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Search(_) => "search",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Collection Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// A store of event documents.
///
/// Each method is one storage round trip. `find` returns nearest-first when the
/// filter carries a proximity predicate and insertion order otherwise.
#[async_trait]
pub trait EventCollection: Send + Sync {
    async fn insert_one(&self, document: EventDocument) -> Result<(), CollectionError>;

    async fn find_one(&self, filter: &Filter) -> Result<Option<EventDocument>, CollectionError>;

    async fn find(&self, filter: &Filter) -> Result<Vec<EventDocument>, CollectionError>;

    /// Apply `update` to the first match atomically, returning the post-update document.
    async fn update_one(
        &self,
        filter: &Filter,
        update: &FieldUpdate,
    ) -> Result<Option<EventDocument>, CollectionError>;

    /// Check that the backing store answers.
    async fn ping(&self) -> Result<(), CollectionError>;

    /// Get the backend name.
    fn name(&self) -> &'static str;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Event Store
// ═══════════════════════════════════════════════════════════════════════════════

/// Persistence operations over a shared event collection.
#[derive(Clone)]
pub struct EventStore {
    collection: Arc<dyn EventCollection>,
}

impl EventStore {
    pub fn new(collection: Arc<dyn EventCollection>) -> Self {
        Self { collection }
    }

    /// Store backed by a fresh in-process collection.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCollection::new()))
    }

    /// Store over the collection selected by `config.backend`.
    pub async fn connect(config: &StorageConfig) -> crate::Result<Self> {
        match config.backend {
            StorageBackend::Memory => Ok(Self::in_memory()),
            #[cfg(feature = "mongodb")]
            StorageBackend::Mongodb => {
                let collection = MongoCollection::connect(config).await.map_err(|e| {
                    CephasError::new(crate::ErrorCode::StorageUnavailable, "Event storage is unavailable")
                        .with_source(e)
                })?;
                Ok(Self::new(Arc::new(collection)))
            }
            #[cfg(not(feature = "mongodb"))]
            StorageBackend::Mongodb => Err(CephasError::configuration(
                "storage.backend = \"mongodb\" requires the `mongodb` feature",
            )),
        }
    }

    pub fn backend(&self) -> &'static str {
        self.collection.name()
    }

    /// Restrict a filter to events that are not soft-deleted.
    fn visible(filter: Filter) -> Filter {
        filter.with_deleted(false)
    }

    /// Write a validated event as a new, active document.
    #[instrument(skip_all, fields(key = %event.key()))]
    pub async fn insert(&self, event: NewEvent) -> Result<EventKey, StoreError> {
        let key = event.key().clone();
        match self.collection.insert_one(event.into_document()).await {
            Ok(()) => {
                record_operation("insert", "ok");
                debug!("Event inserted");
                Ok(key)
            }
            Err(e) => {
                record_operation("insert", "error");
                error!(operation = "insert", key = %key, error = %e, "Event store operation failed");
                Err(StoreError::Insert(e))
            }
        }
    }

    /// At most one visible event matching `filter`.
    pub async fn find_by_query(&self, filter: Filter) -> Result<Option<EventRecord>, StoreError> {
        let filter = Self::visible(filter);
        match self.collection.find_one(&filter).await {
            Ok(found) => {
                record_operation("find_one", if found.is_some() { "ok" } else { "empty" });
                Ok(found.map(|document| document.render()))
            }
            Err(e) => {
                record_operation("find_one", "error");
                error!(operation = "search", filter = ?filter, error = %e, "Event store operation failed");
                Err(StoreError::Search(e))
            }
        }
    }

    pub async fn find_by_key(&self, key: &EventKey) -> Result<Option<EventRecord>, StoreError> {
        self.find_by_query(Filter::by_key(key.clone())).await
    }

    /// Every visible event matching `filter`. An empty list is not a fault.
    pub async fn find_many(&self, filter: Filter) -> Result<Vec<EventRecord>, StoreError> {
        let filter = Self::visible(filter);
        match self.collection.find(&filter).await {
            Ok(documents) => {
                record_operation("find", "ok");
                debug!(count = documents.len(), "Events found");
                Ok(documents.iter().map(EventDocument::render).collect())
            }
            Err(e) => {
                record_operation("find", "error");
                error!(operation = "search", filter = ?filter, error = %e, "Event store operation failed");
                Err(StoreError::Search(e))
            }
        }
    }

    /// Events whose `begin_timestamp` lies in `[range.start, range.end)`.
    pub async fn find_in_time_range(&self, range: TimeRange) -> Result<Vec<EventRecord>, StoreError> {
        self.find_many(Filter::new().with_time_range(range)).await
    }

    /// Events within `near.max_distance` metres, nearest first.
    pub async fn find_near_point(&self, near: NearPoint) -> Result<Vec<EventRecord>, StoreError> {
        self.find_many(Filter::new().with_near(near)).await
    }

    pub async fn find_in_time_range_near_point(
        &self,
        range: TimeRange,
        near: NearPoint,
    ) -> Result<Vec<EventRecord>, StoreError> {
        self.find_many(Filter::new().with_time_range(range).with_near(near))
            .await
    }

    /// Apply a validated patch to a visible event and return the updated record.
    #[instrument(skip_all, fields(key = %key, patched = ?patch.field_names()))]
    pub async fn update(
        &self,
        key: &EventKey,
        patch: EventPatch,
    ) -> Result<Option<EventRecord>, StoreError> {
        let filter = Self::visible(Filter::by_key(key.clone()));
        let update = FieldUpdate::from_patch(&patch, Utc::now());
        match self.collection.update_one(&filter, &update).await {
            Ok(updated) => {
                record_operation("update", if updated.is_some() { "ok" } else { "empty" });
                Ok(updated.map(|document| document.render()))
            }
            Err(e) => {
                record_operation("update", "error");
                error!(operation = "update", key = %key, error = %e, "Event store operation failed");
                Err(StoreError::Update(e))
            }
        }
    }

    /// Mark a visible event deleted. Deleting an absent or deleted key is a no-op.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn soft_delete(&self, key: &EventKey) -> Result<(), StoreError> {
        let filter = Self::visible(Filter::by_key(key.clone()));
        let update = FieldUpdate::soft_delete(Utc::now());
        match self.collection.update_one(&filter, &update).await {
            Ok(deleted) => {
                record_operation("delete", if deleted.is_some() { "ok" } else { "empty" });
                Ok(())
            }
            Err(e) => {
                record_operation("delete", "error");
                error!(operation = "delete", key = %key, error = %e, "Event store operation failed");
                Err(StoreError::Delete(e))
            }
        }
    }

    pub async fn ping(&self) -> Result<(), CollectionError> {
        self.collection.ping().await
    }
}

fn record_operation(operation: &'static str, outcome: &'static str) {
    counter!(
        "cephas_store_operations_total",
        "operation" => operation,
        "outcome" => outcome,
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_messages() {
        let err = || CollectionError::Unavailable("down".into());
        assert_eq!(StoreError::Insert(err()).to_string(), "An error occurred during insert");
        assert_eq!(StoreError::Search(err()).to_string(), "An error occurred during search");
        assert_eq!(StoreError::Update(err()).to_string(), "An error occurred during update");
        assert_eq!(StoreError::Delete(err()).to_string(), "An error occurred during delete");
        assert_eq!(StoreError::Delete(err()).operation(), "delete");
    }

    #[test]
    fn test_visible_adds_deleted_predicate() {
        let filter = EventStore::visible(Filter::by_key(EventKey::from("k")));
        assert_eq!(filter.deleted, Some(false));
        assert_eq!(filter.key, Some(EventKey::from("k")));
    }

    #[tokio::test]
    async fn test_connect_memory_backend() {
        let store = EventStore::connect(&StorageConfig::default()).await.unwrap();
        assert_eq!(store.backend(), "memory");
    }

    #[cfg(not(feature = "mongodb"))]
    #[tokio::test]
    async fn test_connect_mongodb_requires_feature() {
        let config = StorageConfig {
            backend: StorageBackend::Mongodb,
            ..StorageConfig::default()
        };
        let err = EventStore::connect(&config).await.err().unwrap();
        assert_eq!(err.code(), crate::ErrorCode::ConfigurationError);
    }

    #[tokio::test]
    async fn test_in_memory_store_backend() {
        let store = EventStore::in_memory();
        assert_eq!(store.backend(), "memory");
        assert!(store.ping().await.is_ok());
    }
}
