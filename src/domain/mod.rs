//! Domain model for ingested content
//!
//! This module defines the record identifier type and the content record
//! types persisted by the document store.

mod id;
mod records;

pub use id::RecordId;
pub use records::{ArticleRecord, RepositoryRecord, StoreRecord};
