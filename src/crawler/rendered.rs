//! Browser-rendering article strategy
//!
//! Applies to pages whose content is populated by client-side script
//! execution after the initial load. Each extraction drives one exclusive,
//! disposable rendering session through a fixed progression: launch,
//! optional login, navigate, incremental scroll until the page height
//! settles (or a configured ceiling is hit), extraction of the rendered
//! markup, teardown. The session is closed on every exit path, including
//! failed extractions, so no browser process leaks.
//!
//! The rendering engine itself lives behind the `RenderSession` /
//! `SessionLauncher` traits; this module owns the session discipline and
//! the extraction, not the browser.

use crate::config::RenderingConfig;
use crate::crawler::{link_filter, Attribution, Crawler};
use crate::domain::ArticleRecord;
use crate::store::DocumentStore;
use crate::{IngestError, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Script returning the current page height
pub const PAGE_HEIGHT_SCRIPT: &str = "return document.body.scrollHeight";

/// Script scrolling the viewport to the bottom of the page
pub const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Launch configuration for one rendering session
///
/// Holds fresh, per-invocation temporary directories for the browsing
/// profile and cache, so no state is ever shared between crawls. Dropping
/// the profile deletes the directories.
pub struct SessionProfile {
    user_data_dir: TempDir,
    cache_dir: TempDir,
    args: Vec<String>,
}

impl SessionProfile {
    /// Builds a disposable profile with sandbox-appropriate launch flags
    pub fn disposable() -> Result<Self> {
        let user_data_dir = tempfile::tempdir()?;
        let cache_dir = tempfile::tempdir()?;

        let mut args: Vec<String> = [
            "--no-sandbox",
            "--headless=new",
            "--disable-dev-shm-usage",
            "--log-level=3",
            "--disable-popup-blocking",
            "--disable-notifications",
            "--disable-extensions",
            "--disable-background-networking",
            "--ignore-certificate-errors",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(format!(
            "--user-data-dir={}",
            user_data_dir.path().display()
        ));
        args.push(format!("--disk-cache-dir={}", cache_dir.path().display()));

        Ok(Self {
            user_data_dir,
            cache_dir,
            args,
        })
    }

    /// Adds an extra launch argument
    pub fn push_arg(&mut self, arg: impl Into<String>) {
        self.args.push(arg.into());
    }

    /// The launch arguments, including the disposable directory flags
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The disposable browsing-profile directory
    pub fn user_data_dir(&self) -> &Path {
        self.user_data_dir.path()
    }

    /// The disposable cache directory
    pub fn cache_dir(&self) -> &Path {
        self.cache_dir.path()
    }
}

/// A live, controllable rendering session
#[async_trait]
pub trait RenderSession: Send {
    /// Loads the target link
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Executes a script for its side effect
    async fn exec(&mut self, script: &str) -> Result<()>;

    /// Executes a script returning a scalar value
    async fn eval_number(&mut self, script: &str) -> Result<f64>;

    /// Returns the currently rendered markup
    async fn html(&mut self) -> Result<String>;

    /// Tears the session down
    async fn close(&mut self) -> Result<()>;
}

/// Starts rendering sessions from a launch profile
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self, profile: &SessionProfile) -> Result<Box<dyn RenderSession>>;
}

/// Site-specific behavior for a rendered source
///
/// Supplies the platform tag and the selectors locating the title and
/// subtitle elements in the rendered markup. The two hooks default to
/// no-ops: `configure` may inject extra session configuration before
/// launch, `login` runs once per session before navigation.
#[async_trait]
pub trait SiteRoutine: Send + Sync {
    /// Origin tag stamped onto produced records
    fn platform(&self) -> &str;

    /// Selector for the heading element holding the title
    fn title_selector(&self) -> &str;

    /// Selector for the subtitle element
    fn subtitle_selector(&self) -> &str;

    /// Extra session configuration, applied before launch
    fn configure(&self, _profile: &mut SessionProfile) {}

    /// Authentication step, run once per session before navigation
    async fn login(&self, _session: &mut dyn RenderSession) -> Result<()> {
        Ok(())
    }
}

/// Routine for Medium articles
pub struct MediumRoutine;

#[async_trait]
impl SiteRoutine for MediumRoutine {
    fn platform(&self) -> &str {
        "medium"
    }

    fn title_selector(&self) -> &str {
        "h1.pw-post-title"
    }

    fn subtitle_selector(&self) -> &str {
        "h2.pw-subtitle-paragraph"
    }

    fn configure(&self, profile: &mut SessionProfile) {
        profile.push_arg("--profile-directory=Profile 2");
    }
}

/// Scrolls a session to the bottom of the page until the height settles
///
/// After each scroll the task sleeps for the settle interval, then reads
/// the page height again. Scrolling stops when the height stops increasing
/// between two consecutive scrolls or when the ceiling is reached,
/// whichever comes first. Returns the number of scrolls performed.
pub async fn scroll_to_end(
    session: &mut dyn RenderSession,
    scroll_limit: u32,
    settle: Duration,
) -> Result<u32> {
    let mut scrolls = 0;
    let mut last_height = session.eval_number(PAGE_HEIGHT_SCRIPT).await?;

    loop {
        session.exec(SCROLL_TO_BOTTOM_SCRIPT).await?;
        tokio::time::sleep(settle).await;
        let new_height = session.eval_number(PAGE_HEIGHT_SCRIPT).await?;
        scrolls += 1;

        if new_height == last_height || scrolls >= scroll_limit {
            break;
        }
        last_height = new_height;
    }

    Ok(scrolls)
}

/// Crawler for script-rendered articles
pub struct RenderedArticleCrawler {
    launcher: Arc<dyn SessionLauncher>,
    site: Arc<dyn SiteRoutine>,
    store: DocumentStore<ArticleRecord>,
    scroll_limit: u32,
    settle: Duration,
}

impl RenderedArticleCrawler {
    pub fn new(
        launcher: Arc<dyn SessionLauncher>,
        site: Arc<dyn SiteRoutine>,
        store: DocumentStore<ArticleRecord>,
        config: &RenderingConfig,
    ) -> Self {
        Self {
            launcher,
            site,
            store,
            scroll_limit: config.scroll_limit,
            settle: Duration::from_millis(config.settle_ms),
        }
    }

    /// Login, navigation, scroll, and markup retrieval for one session
    async fn drive(&self, session: &mut dyn RenderSession, link: &str) -> Result<String> {
        self.site.login(session).await?;
        session.navigate(link).await?;
        scroll_to_end(session, self.scroll_limit, self.settle).await?;
        session.html().await
    }
}

#[async_trait]
impl Crawler for RenderedArticleCrawler {
    async fn extract(&self, link: &str, author: &Attribution) -> Result<()> {
        if self.store.find(&link_filter(link)).is_some() {
            tracing::info!("Article already exists in the database: {}", link);
            return Ok(());
        }

        tracing::info!("Starting scraping rendered article: {}", link);

        let mut profile = SessionProfile::disposable()?;
        self.site.configure(&mut profile);

        let mut session = self.launcher.launch(&profile).await?;
        let outcome = self.drive(session.as_mut(), link).await;
        // The session is torn down on every exit path, including a failed
        // extraction.
        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close rendering session for {}: {}", link, e);
        }
        let markup = outcome?;

        let content = parse_rendered(
            &markup,
            self.site.title_selector(),
            self.site.subtitle_selector(),
        )?;

        let record = ArticleRecord::new(
            link,
            self.site.platform(),
            content,
            author.author_id,
            author.author_full_name.clone(),
        );
        if !self.store.insert(&record) {
            tracing::warn!("Article for {} was not persisted", link);
        }

        tracing::info!("Successfully scraped and saved article: {}", link);
        Ok(())
    }
}

/// Extracts the article fields from fully-scrolled rendered markup
///
/// The first element matching the title selector supplies `Title`, the
/// first match of the subtitle selector supplies `Subtitle`, and all
/// visible text becomes `Content`.
fn parse_rendered(
    markup: &str,
    title_selector: &str,
    subtitle_selector: &str,
) -> Result<BTreeMap<String, String>> {
    let document = Html::parse_document(markup);
    let mut content = BTreeMap::new();

    if let Some(title) = select_first_text(&document, title_selector)? {
        content.insert("Title".to_string(), title);
    }
    if let Some(subtitle) = select_first_text(&document, subtitle_selector)? {
        content.insert("Subtitle".to_string(), subtitle);
    }

    let fragments: Vec<&str> = document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    content.insert("Content".to_string(), fragments.join("\n"));

    Ok(content)
}

fn select_first_text(document: &Html, selector: &str) -> Result<Option<String>> {
    let selector = Selector::parse(selector)
        .map_err(|e| IngestError::Render(format!("invalid selector {selector:?}: {e}")))?;
    Ok(document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty()))
}
