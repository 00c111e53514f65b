//! Record <-> external document codec
//!
//! The single authority for translating between the internal record
//! representation (typed, `id: RecordId`) and the external document shape
//! (schemaless, `_id` primary key holding the canonical identifier string).
//! Identifier-typed fields serialize as their canonical textual form via
//! `RecordId`'s serde implementation, so the conversion is lossless in both
//! directions.

use crate::domain::StoreRecord;
use crate::store::backend::{Document, StoreError, StoreResult};
use serde_json::Value;

/// Primary-key field name expected by the external store
pub const PRIMARY_KEY: &str = "_id";

/// Identifier field name on the internal representation
const ID_FIELD: &str = "id";

/// Converts a record into its external document form
///
/// Every field is serialized into a string-keyed mapping and the identifier
/// field is renamed to the store's primary-key name.
pub fn to_external<T: StoreRecord>(record: &T) -> StoreResult<Document> {
    let value =
        serde_json::to_value(record).map_err(|e| StoreError::Serialization(e.to_string()))?;

    let mut doc = match value {
        Value::Object(map) => map,
        other => {
            return Err(StoreError::Serialization(format!(
                "record did not serialize to a document: {other}"
            )))
        }
    };

    if let Some(id) = doc.remove(ID_FIELD) {
        doc.insert(PRIMARY_KEY.to_string(), id);
    }

    Ok(doc)
}

/// Reconstructs a typed record from an external document
///
/// Fails with `MalformedRecord` if the document is empty or has no
/// primary-key field; otherwise renames the primary key back to the
/// identifier field and deserializes.
pub fn from_external<T: StoreRecord>(mut doc: Document) -> StoreResult<T> {
    if doc.is_empty() {
        return Err(StoreError::MalformedRecord("document is empty".to_string()));
    }

    let id = doc.remove(PRIMARY_KEY).ok_or_else(|| {
        StoreError::MalformedRecord(format!("document has no {PRIMARY_KEY} field"))
    })?;
    doc.insert(ID_FIELD.to_string(), id);

    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::MalformedRecord(e.to_string()))
}
