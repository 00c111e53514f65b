//! Record identifiers
//!
//! Every persisted record carries a 128-bit unique identifier. Internally
//! this is a structured UUID; the external store only ever sees its
//! canonical textual form. `RecordId`'s serde implementation serializes as
//! that canonical string, so identifier-typed fields are stringified
//! automatically when a record is converted into an external document.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a persisted record
///
/// Generated at construction time and immutable thereafter. The canonical
/// textual form is the hyphenated lowercase UUID; round-tripping through it
/// is lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generates a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the canonical textual form
    pub fn canonical(&self) -> String {
        self.0.to_string()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_roundtrip() {
        let id = RecordId::new();
        let text = id.canonical();
        let parsed: RecordId = text.parse().unwrap();
        assert_eq!(id, parsed);
        // Idempotent: a second pass through the textual form changes nothing
        assert_eq!(parsed.canonical(), text);
    }

    #[test]
    fn test_canonical_form_is_hyphenated_lowercase() {
        let text = RecordId::new().canonical();
        assert_eq!(text.len(), 36);
        assert_eq!(text.matches('-').count(), 4);
        assert_eq!(text, text.to_lowercase());
    }

    #[test]
    fn test_serde_as_string() {
        let id = RecordId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.canonical()));

        let back: RecordId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_fresh_ids_are_distinct() {
        assert_ne!(RecordId::new(), RecordId::new());
    }
}
