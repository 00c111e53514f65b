//! Static-fetch article strategy
//!
//! Applies to pages delivered fully in the initial server response, with no
//! script-driven rendering needed. The raw markup is fetched, tags are
//! stripped to obtain the flattened body text, and the article fields are
//! filled from the page's metadata.

use crate::config::FetcherConfig;
use crate::crawler::{link_filter, Attribution, Crawler};
use crate::domain::ArticleRecord;
use crate::store::DocumentStore;
use crate::{IngestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Crawler for static HTML articles
pub struct StaticArticleCrawler {
    client: Client,
    store: DocumentStore<ArticleRecord>,
}

impl StaticArticleCrawler {
    /// Creates a crawler with an HTTP client built from the fetcher config
    pub fn new(config: &FetcherConfig, store: DocumentStore<ArticleRecord>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| {
                IngestError::ImproperlyConfigured(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, store })
    }

    async fn fetch_markup(&self, link: &str) -> Result<String> {
        let response = self
            .client
            .get(link)
            .send()
            .await
            .map_err(|source| IngestError::Fetch {
                link: link.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::FetchStatus {
                link: link.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| IngestError::Fetch {
            link: link.to_string(),
            source,
        })
    }
}

#[async_trait]
impl Crawler for StaticArticleCrawler {
    async fn extract(&self, link: &str, author: &Attribution) -> Result<()> {
        if self.store.find(&link_filter(link)).is_some() {
            tracing::info!("Article already exists in the database: {}", link);
            return Ok(());
        }

        tracing::info!("Starting scraping article: {}", link);

        let markup = self.fetch_markup(link).await?;
        let content = parse_article(&markup);
        let platform = Url::parse(link)?
            .host_str()
            .unwrap_or_default()
            .to_string();

        let record = ArticleRecord::new(
            link,
            platform,
            content,
            author.author_id,
            author.author_full_name.clone(),
        );
        if !self.store.insert(&record) {
            tracing::warn!("Article for {} was not persisted", link);
        }

        tracing::info!("Finished scraping article: {}", link);
        Ok(())
    }
}

/// Normalizes raw markup into the article content mapping
///
/// `Title` comes from the title metadata (`<title>`, falling back to
/// `og:title`), `Subtitle` from the description metadata, `language` from
/// the document language attribute, and `Content` from the flattened body
/// text with tags stripped.
fn parse_article(markup: &str) -> BTreeMap<String, String> {
    let document = Html::parse_document(markup);
    let mut content = BTreeMap::new();

    if let Some(title) = extract_title(&document) {
        content.insert("Title".to_string(), title);
    }
    if let Some(subtitle) = select_meta(&document, "meta[name='description']") {
        content.insert("Subtitle".to_string(), subtitle);
    }
    if let Some(language) = extract_language(&document) {
        content.insert("language".to_string(), language);
    }
    content.insert("Content".to_string(), flatten_text(&document));

    content
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;
    let from_title_tag = document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty());

    from_title_tag.or_else(|| select_meta(document, "meta[property='og:title']"))
}

fn extract_language(document: &Html) -> Option<String> {
    let html_selector = Selector::parse("html").ok()?;
    document
        .select(&html_selector)
        .next()
        .and_then(|element| element.value().attr("lang"))
        .map(|lang| lang.to_string())
        .filter(|s| !s.is_empty())
}

fn select_meta(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Strips markup tags, returning the page's flattened text
fn flatten_text(document: &Html) -> String {
    let fragments: Vec<&str> = document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    fragments.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html lang="en">
        <head>
            <title>AI Trends</title>
            <meta name="description" content="Latest Developments in AI">
        </head>
        <body>
            <h1>Welcome to AI Trends</h1>
            <p>Artificial intelligence is evolving rapidly.</p>
        </body>
    </html>"#;

    #[test]
    fn test_parse_article_fields() {
        let content = parse_article(PAGE);

        assert_eq!(content.get("Title").map(String::as_str), Some("AI Trends"));
        assert_eq!(
            content.get("Subtitle").map(String::as_str),
            Some("Latest Developments in AI")
        );
        assert_eq!(content.get("language").map(String::as_str), Some("en"));

        let body = content.get("Content").unwrap();
        assert!(body.contains("Welcome to AI Trends"));
        assert!(body.contains("Artificial intelligence is evolving rapidly."));
        assert!(!body.contains("<p>"));
    }

    #[test]
    fn test_parse_article_falls_back_to_og_title() {
        let markup = r#"<html><head>
            <meta property="og:title" content="Open Graph Title">
        </head><body>text</body></html>"#;
        let content = parse_article(markup);
        assert_eq!(
            content.get("Title").map(String::as_str),
            Some("Open Graph Title")
        );
    }

    #[test]
    fn test_parse_article_without_metadata() {
        let content = parse_article("<html><body><p>just text</p></body></html>");
        assert!(content.get("Title").is_none());
        assert!(content.get("Subtitle").is_none());
        assert!(content.get("language").is_none());
        assert_eq!(content.get("Content").map(String::as_str), Some("just text"));
    }
}
