//! Crawler strategies for content extraction
//!
//! This module contains the polymorphic crawling contract and its concrete
//! strategies:
//! - Static HTML retrieval for pages delivered fully in the initial response
//! - Browser-driven rendering for pages populated by client-side scripts
//! - Repository cloning for versioned file trees
//!
//! A dispatcher routes each link to the registered strategy for its host.
//! Every strategy checks the document store for an existing record before
//! fetching, so repeated extraction of the same link is a no-op.

mod article;
mod dispatcher;
mod rendered;
mod repository;

pub use article::StaticArticleCrawler;
pub use dispatcher::CrawlerDispatcher;
pub use rendered::{
    scroll_to_end, MediumRoutine, RenderSession, RenderedArticleCrawler, SessionLauncher,
    SessionProfile, SiteRoutine,
};
pub use repository::{GitCli, GithubCrawler, RepoSource};

use crate::domain::RecordId;
use crate::store::Document;
use crate::Result;
use async_trait::async_trait;

/// Attribution carried with each extraction, stamped onto the produced
/// record
#[derive(Debug, Clone)]
pub struct Attribution {
    pub author_id: RecordId,
    pub author_full_name: String,
}

impl Attribution {
    pub fn new(author_id: RecordId, author_full_name: impl Into<String>) -> Self {
        Self {
            author_id,
            author_full_name: author_full_name.into(),
        }
    }
}

/// Polymorphic crawling contract
///
/// Implementations fetch the content at `link`, normalize it into their
/// declared record type, stamp the attribution fields, and persist exactly
/// one record. A link that is already persisted is a logged no-op, which
/// makes `extract` idempotent under repeated invocation. Fetch failures
/// propagate; no partial record is persisted for a failed extraction.
#[async_trait]
pub trait Crawler: Send + Sync {
    async fn extract(&self, link: &str, author: &Attribution) -> Result<()>;
}

/// Equality filter selecting a record by its source link
pub(crate) fn link_filter(link: &str) -> Document {
    let mut filter = Document::new();
    filter.insert("link".to_string(), link.into());
    filter
}
