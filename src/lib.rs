//! Inklake: a content ingestion core
//!
//! This crate ingests external content (web articles, source-code
//! repositories) and persists it as structured records in a schemaless,
//! collection-oriented document store, for downstream processing by a
//! content pipeline. It provides a generic document store abstraction with
//! uniform find/get-or-create/insert/bulk-insert semantics, and a crawler
//! dispatch model that selects among interchangeable fetching strategies
//! (static HTML retrieval, browser-driven rendering, repository cloning)
//! behind one polymorphic contract.

pub mod config;
pub mod crawler;
pub mod domain;
pub mod store;

use thiserror::Error;

/// Main error type for ingestion operations
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store misconfigured: {0}")]
    ImproperlyConfigured(String),

    #[error("Fetch error for {link}: {source}")]
    Fetch { link: String, source: reqwest::Error },

    #[error("Fetch for {link} returned HTTP {status}")]
    FetchStatus { link: String, status: u16 },

    #[error("Clone failed for {link}: {message}")]
    CloneFailed { link: String, message: String },

    #[error("Rendering session error: {0}")]
    Render(String),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Attribution, Crawler, CrawlerDispatcher, StaticArticleCrawler};
pub use domain::{ArticleRecord, RecordId, RepositoryRecord, StoreRecord};
pub use store::{DocumentStore, SqliteBackend, StoreBackend};
