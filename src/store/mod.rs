//! Document store abstraction
//!
//! This module gives every content type uniform persistence semantics over
//! a schemaless, collection-oriented store:
//! - find / bulk_find with equality filters
//! - get_or_create
//! - insert / bulk_insert
//!
//! Store-level failures never escape this layer as errors on the read and
//! write paths: `find` collapses them to `None` and the insert operations
//! report a failure flag, with a log line either way. This mirrors the
//! caller-visible behavior of the system this crate replaces and is an
//! explicit policy, not an accident.

mod backend;
pub mod codec;
mod sqlite;

pub use backend::{Document, StoreBackend, StoreError, StoreResult};
pub use sqlite::SqliteBackend;

use crate::domain::{RecordId, StoreRecord};
use crate::IngestError;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Generic persistence service for one record type
///
/// Composed with record types rather than inherited by them: the record
/// type supplies its collection name and codec shape, the store supplies
/// the operations. Cheap to clone; clones share the backend handle.
pub struct DocumentStore<T: StoreRecord> {
    backend: Arc<dyn StoreBackend>,
    _record: PhantomData<fn() -> T>,
}

impl<T: StoreRecord> Clone for DocumentStore<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            _record: PhantomData,
        }
    }
}

impl<T: StoreRecord> DocumentStore<T> {
    /// Creates a store for `T`'s declared collection
    ///
    /// Fails with `ImproperlyConfigured` if the type declares a blank
    /// collection name. That is a programming error surfaced at
    /// construction time, not a runtime condition to recover from.
    pub fn new(backend: Arc<dyn StoreBackend>) -> Result<Self, IngestError> {
        if T::COLLECTION.trim().is_empty() {
            return Err(IngestError::ImproperlyConfigured(format!(
                "{} declares a blank collection name",
                std::any::type_name::<T>()
            )));
        }
        Ok(Self {
            backend,
            _record: PhantomData,
        })
    }

    /// Looks up at most one record matching the equality filter
    ///
    /// Returns `None` both when nothing matches and when the backend
    /// reports an operational failure; failures are logged, not propagated.
    pub fn find(&self, filter: &Document) -> Option<T> {
        match self.backend.find_one(T::COLLECTION, filter) {
            Ok(Some(doc)) => match codec::from_external(doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping malformed document in {}: {}", T::COLLECTION, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::error!("Failed to retrieve document from {}: {}", T::COLLECTION, e);
                None
            }
        }
    }

    /// Returns every record matching the equality filter
    ///
    /// Malformed documents are skipped with a log line; a backend failure
    /// yields an empty list.
    pub fn bulk_find(&self, filter: &Document) -> Vec<T> {
        let docs = match self.backend.find(T::COLLECTION, filter) {
            Ok(docs) => docs,
            Err(e) => {
                tracing::error!("Failed to retrieve documents from {}: {}", T::COLLECTION, e);
                return Vec::new();
            }
        };

        docs.into_iter()
            .filter_map(|doc| match codec::from_external(doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping malformed document in {}: {}", T::COLLECTION, e);
                    None
                }
            })
            .collect()
    }

    /// Returns the first match for the filter, creating and persisting a
    /// new record from the filter's fields if none exists
    ///
    /// Not atomic: concurrent callers racing on the same filter may each
    /// observe "not found" and insert. The SQLite backend's unique link
    /// index makes that race fail loudly rather than produce duplicates.
    pub fn get_or_create(&self, filter: &Document) -> Result<T, IngestError> {
        if let Some(doc) = self.backend.find_one(T::COLLECTION, filter)? {
            return Ok(codec::from_external(doc)?);
        }

        let record = record_from_filter::<T>(filter)?;
        self.backend
            .insert_one(T::COLLECTION, &codec::to_external(&record)?)?;
        Ok(record)
    }

    /// Writes one record; returns false (and logs) on a store-level failure
    pub fn insert(&self, record: &T) -> bool {
        let doc = match codec::to_external(record) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!("Failed to encode document for {}: {}", T::COLLECTION, e);
                return false;
            }
        };

        match self.backend.insert_one(T::COLLECTION, &doc) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to insert document into {}: {}", T::COLLECTION, e);
                false
            }
        }
    }

    /// Writes a batch of records; succeeds only if the whole batch is
    /// accepted
    ///
    /// On failure no guarantee is made about which subset was persisted.
    /// An empty batch trivially succeeds.
    pub fn bulk_insert(&self, records: &[T]) -> bool {
        let mut docs = Vec::with_capacity(records.len());
        for record in records {
            match codec::to_external(record) {
                Ok(doc) => docs.push(doc),
                Err(e) => {
                    tracing::error!("Failed to encode document for {}: {}", T::COLLECTION, e);
                    return false;
                }
            }
        }

        match self.backend.insert_many(T::COLLECTION, &docs) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to insert documents into {}: {}", T::COLLECTION, e);
                false
            }
        }
    }
}

/// Builds a record from a filter's fields, generating a fresh identifier
/// when the filter does not carry one
fn record_from_filter<T: StoreRecord>(filter: &Document) -> Result<T, StoreError> {
    let mut doc = filter.clone();
    if let Some(id) = doc.remove(codec::PRIMARY_KEY) {
        doc.insert("id".to_string(), id);
    }
    doc.entry("id".to_string())
        .or_insert_with(|| Value::String(RecordId::new().canonical()));

    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::MalformedRecord(e.to_string()))
}
