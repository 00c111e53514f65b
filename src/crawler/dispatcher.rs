//! Crawler dispatch
//!
//! Routes a link to the crawler registered for its host. Registration is
//! by domain: a registered domain matches the exact host and any subdomain
//! of it. Links whose host matches nothing fall back to the default
//! crawler (typically the static article strategy).

use crate::crawler::{Attribution, Crawler};
use crate::Result;
use std::sync::Arc;
use url::Url;

/// Registry selecting a crawler per link
pub struct CrawlerDispatcher {
    registry: Vec<(String, Arc<dyn Crawler>)>,
    fallback: Arc<dyn Crawler>,
}

impl CrawlerDispatcher {
    /// Creates a dispatcher with the given fallback crawler
    pub fn new(fallback: Arc<dyn Crawler>) -> Self {
        Self {
            registry: Vec::new(),
            fallback,
        }
    }

    /// Registers a crawler for a domain (and its subdomains)
    pub fn register(mut self, domain: impl Into<String>, crawler: Arc<dyn Crawler>) -> Self {
        self.registry.push((domain.into(), crawler));
        self
    }

    /// Selects the crawler for a link
    ///
    /// Fails only if the link is not a parseable URL; an unmatched host
    /// selects the fallback crawler.
    pub fn dispatch(&self, link: &str) -> Result<Arc<dyn Crawler>> {
        let url = Url::parse(link)?;
        let host = url.host_str().unwrap_or_default();

        for (domain, crawler) in &self.registry {
            if host == domain || host.ends_with(&format!(".{domain}")) {
                return Ok(Arc::clone(crawler));
            }
        }

        tracing::debug!("No crawler registered for host {}, using fallback", host);
        Ok(Arc::clone(&self.fallback))
    }

    /// Dispatches and runs extraction in one step
    pub async fn extract(&self, link: &str, author: &Attribution) -> Result<()> {
        self.dispatch(link)?.extract(link, author).await
    }
}
