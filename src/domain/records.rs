//! Content record types
//!
//! Each record type declares the external collection it is persisted into
//! via an associated constant, so an unnamed collection is a compile error
//! rather than a runtime lookup failure. Records compare and hash solely on
//! their identifier: two records with equal ids are the same logical record
//! regardless of their other fields.

use crate::domain::RecordId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Contract implemented by every persistable content type
///
/// `COLLECTION` names the external collection holding records of this type.
/// Non-id fields carry serde defaults so a record can be constructed from a
/// partial filter by `get_or_create`.
pub trait StoreRecord:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
    /// External collection name for this record type
    const COLLECTION: &'static str;

    /// The record's unique identifier
    fn id(&self) -> RecordId;
}

/// A crawled article
///
/// `content` holds the normalized extraction output, keyed by field name
/// (`Title`, `Subtitle`, `Content`, and optionally `language`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub author_id: RecordId,
    #[serde(default)]
    pub author_full_name: String,
    #[serde(default)]
    pub content: BTreeMap<String, String>,
}

impl ArticleRecord {
    /// Creates a new article record with a fresh identifier
    pub fn new(
        link: impl Into<String>,
        platform: impl Into<String>,
        content: BTreeMap<String, String>,
        author_id: RecordId,
        author_full_name: impl Into<String>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            link: link.into(),
            platform: platform.into(),
            author_id,
            author_full_name: author_full_name.into(),
            content,
        }
    }
}

impl StoreRecord for ArticleRecord {
    const COLLECTION: &'static str = "articles";

    fn id(&self) -> RecordId {
        self.id
    }
}

impl PartialEq for ArticleRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ArticleRecord {}

impl Hash for ArticleRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A crawled source-code repository
///
/// `content` maps each kept file's path (relative to the repository root)
/// to its whitespace-stripped text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryRecord {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub author_id: RecordId,
    #[serde(default)]
    pub author_full_name: String,
    #[serde(default)]
    pub content: BTreeMap<String, String>,
}

impl RepositoryRecord {
    /// Creates a new repository record with a fresh identifier
    pub fn new(
        name: impl Into<String>,
        link: impl Into<String>,
        platform: impl Into<String>,
        content: BTreeMap<String, String>,
        author_id: RecordId,
        author_full_name: impl Into<String>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            name: name.into(),
            link: link.into(),
            platform: platform.into(),
            author_id,
            author_full_name: author_full_name.into(),
            content,
        }
    }
}

impl StoreRecord for RepositoryRecord {
    const COLLECTION: &'static str = "repositories";

    fn id(&self) -> RecordId {
        self.id
    }
}

impl PartialEq for RepositoryRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RepositoryRecord {}

impl Hash for RepositoryRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample_article() -> ArticleRecord {
        let mut content = BTreeMap::new();
        content.insert("Title".to_string(), "The Future of AI".to_string());
        content.insert("Content".to_string(), "body text".to_string());
        ArticleRecord::new(
            "https://example.com/post",
            "example.com",
            content,
            RecordId::new(),
            "Ada Lovelace",
        )
    }

    #[test]
    fn test_equality_is_identity_only() {
        let a = sample_article();
        let mut b = a.clone();
        b.link = "https://elsewhere.example/other".to_string();
        b.content.clear();

        // Same id, different fields: still equal
        assert_eq!(a, b);

        let mut c = a.clone();
        c.id = RecordId::new();
        // Different id, identical fields: never equal
        assert_ne!(a, c);
    }

    #[test]
    fn test_hash_follows_identity() {
        let a = sample_article();
        let mut b = a.clone();
        b.author_full_name = "Grace Hopper".to_string();

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(ArticleRecord::COLLECTION, "articles");
        assert_eq!(RepositoryRecord::COLLECTION, "repositories");
    }

    #[test]
    fn test_repository_record_keeps_name() {
        let repo = RepositoryRecord::new(
            "inklake",
            "https://github.com/acme/inklake",
            "github",
            BTreeMap::new(),
            RecordId::new(),
            "Ada Lovelace",
        );
        assert_eq!(repo.name, "inklake");
        assert_eq!(repo.platform, "github");
    }
}
