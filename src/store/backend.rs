//! Store boundary trait and error types
//!
//! The external store is treated as an opaque, collection-oriented
//! key/value engine: schemaless string-keyed documents grouped into named
//! collections, addressed by equality filters. The only structural
//! requirement imposed on a document is a `_id` primary-key field holding
//! the stringified record identifier.

use serde_json::Value;
use thiserror::Error;

/// A schemaless external document (or an equality filter over one)
pub type Document = serde_json::Map<String, Value>;

/// Errors that can occur at the store boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for document store backends
///
/// Implementations must be safe to share across crawlers running on
/// different tasks; all receivers are `&self`.
pub trait StoreBackend: Send + Sync {
    /// Writes a single document into a collection
    fn insert_one(&self, collection: &str, doc: &Document) -> StoreResult<()>;

    /// Writes a batch of documents into a collection
    ///
    /// Stops at the first rejected document and reports failure; there is no
    /// transactional rollback, so no guarantee is made about which subset of
    /// the batch was persisted.
    fn insert_many(&self, collection: &str, docs: &[Document]) -> StoreResult<()>;

    /// Returns at most one document matching the equality filter
    fn find_one(&self, collection: &str, filter: &Document) -> StoreResult<Option<Document>>;

    /// Returns every document matching the equality filter
    fn find(&self, collection: &str, filter: &Document) -> StoreResult<Vec<Document>>;
}
