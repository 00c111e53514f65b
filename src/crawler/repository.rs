//! Repository-crawl strategy
//!
//! Clones a repository link into an isolated temporary workspace, walks the
//! resulting tree, and flattens every kept file's text into a mapping keyed
//! by path relative to the repository root. Files are dropped when their
//! containing-directory path or filename matches the configured ignore set
//! by prefix or suffix. The workspace is deleted on every exit path,
//! success or failure.

use crate::config::RepositoryConfig;
use crate::crawler::{link_filter, Attribution, Crawler};
use crate::domain::RepositoryRecord;
use crate::store::DocumentStore;
use crate::{IngestError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;

/// Version-control boundary: clone a repository at a URL into a local
/// directory
#[async_trait]
pub trait RepoSource: Send + Sync {
    async fn clone_into(&self, link: &str, dest: &Path) -> Result<()>;
}

/// Default repository source shelling out to the `git` CLI
pub struct GitCli;

#[async_trait]
impl RepoSource for GitCli {
    async fn clone_into(&self, link: &str, dest: &Path) -> Result<()> {
        let status = tokio::process::Command::new("git")
            .arg("clone")
            .arg(link)
            .current_dir(dest)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| IngestError::CloneFailed {
                link: link.to_string(),
                message: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(IngestError::CloneFailed {
                link: link.to_string(),
                message: format!("git clone exited with {status}"),
            })
        }
    }
}

/// Crawler for GitHub repositories
pub struct GithubCrawler<S: RepoSource = GitCli> {
    source: S,
    store: DocumentStore<RepositoryRecord>,
    ignore: Vec<String>,
}

impl GithubCrawler<GitCli> {
    /// Creates a crawler cloning through the `git` CLI
    pub fn new(config: &RepositoryConfig, store: DocumentStore<RepositoryRecord>) -> Self {
        Self::with_source(GitCli, config, store)
    }
}

impl<S: RepoSource> GithubCrawler<S> {
    /// Creates a crawler with a custom repository source
    pub fn with_source(
        source: S,
        config: &RepositoryConfig,
        store: DocumentStore<RepositoryRecord>,
    ) -> Self {
        Self {
            source,
            store,
            ignore: config.ignore.clone(),
        }
    }
}

#[async_trait]
impl<S: RepoSource> Crawler for GithubCrawler<S> {
    async fn extract(&self, link: &str, author: &Attribution) -> Result<()> {
        if self.store.find(&link_filter(link)).is_some() {
            tracing::info!("Repository already exists in the database: {}", link);
            return Ok(());
        }

        tracing::info!("Starting scraping GitHub repository: {}", link);

        let repo_name = link
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(link);

        // The workspace is deleted when this guard drops, on every exit
        // path below.
        let workspace = tempfile::tempdir()?;

        self.source.clone_into(link, workspace.path()).await?;

        let repo_path = first_subdirectory(workspace.path())?.ok_or_else(|| {
            IngestError::CloneFailed {
                link: link.to_string(),
                message: "clone produced no repository directory".to_string(),
            }
        })?;

        let tree = collect_tree(&repo_path, &self.ignore)?;

        let record = RepositoryRecord::new(
            repo_name,
            link,
            "github",
            tree,
            author.author_id,
            author.author_full_name.clone(),
        );
        if !self.store.insert(&record) {
            tracing::warn!("Repository for {} was not persisted", link);
        }

        tracing::info!("Finished scraping GitHub repository: {}", link);
        Ok(())
    }
}

/// Returns the first directory entry inside `dir`, if any
fn first_subdirectory(dir: &Path) -> std::io::Result<Option<std::path::PathBuf>> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}

/// Walks a repository tree and flattens kept files into a path -> text
/// mapping
///
/// A directory whose path relative to the root matches an ignore pattern by
/// prefix is skipped with its whole subtree; a file whose name matches a
/// pattern by prefix or suffix is skipped. File bytes are decoded lossily
/// and space characters are stripped from the text.
pub fn collect_tree(root: &Path, ignore: &[String]) -> std::io::Result<BTreeMap<String, String>> {
    let mut tree = BTreeMap::new();
    walk(root, root, ignore, &mut tree)?;
    Ok(tree)
}

fn walk(
    root: &Path,
    dir: &Path,
    ignore: &[String],
    tree: &mut BTreeMap<String, String>,
) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let rel = match path.strip_prefix(root) {
            Ok(rel) => rel,
            Err(_) => continue,
        };

        if entry.file_type()?.is_dir() {
            let rel_str = rel.to_string_lossy();
            if ignore.iter().any(|pattern| rel_str.starts_with(pattern)) {
                continue;
            }
            walk(root, &path, ignore, tree)?;
        } else {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if ignore
                .iter()
                .any(|pattern| name.starts_with(pattern) || name.ends_with(pattern))
            {
                continue;
            }

            let bytes = std::fs::read(&path)?;
            let text = String::from_utf8_lossy(&bytes).replace(' ', "");
            tree.insert(rel.to_string_lossy().into_owned(), text);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordId;
    use crate::store::SqliteBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn write_file(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_collect_tree_applies_ignore_set() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_file(root, "readme.md", "hello repo");
        write_file(root, ".gitignore", "target/");
        write_file(root, "app.lock", "locked");
        write_file(root, "src/main.go", "package main");
        write_file(root, ".git/config", "[core]");

        let ignore = vec![".git".to_string(), ".lock".to_string()];
        let tree = collect_tree(root, &ignore).unwrap();

        let mut keys: Vec<&str> = tree.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["readme.md", "src/main.go"]);
    }

    #[test]
    fn test_collect_tree_strips_spaces_keeps_newlines() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "main.go", "package main\nfunc main() { }\n");

        let tree = collect_tree(dir.path(), &[]).unwrap();
        assert_eq!(
            tree.get("main.go").map(String::as_str),
            Some("packagemain\nfuncmain(){}\n")
        );
    }

    #[test]
    fn test_collect_tree_handles_undecodable_bytes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blob.bin"), [0x66, 0xff, 0x6f]).unwrap();

        let tree = collect_tree(dir.path(), &[]).unwrap();
        // Undecodable bytes are replaced rather than failing the walk
        assert!(tree.contains_key("blob.bin"));
    }

    /// Repository source materializing a fixed tree instead of cloning
    struct FakeRepo {
        clones: AtomicUsize,
    }

    #[async_trait]
    impl RepoSource for FakeRepo {
        async fn clone_into(&self, _link: &str, dest: &Path) -> Result<()> {
            self.clones.fetch_add(1, Ordering::SeqCst);
            let repo = dest.join("demo");
            write_file(&repo, "readme.md", "a readme");
            write_file(&repo, "src/lib.rs", "pub fn answer() -> u32 { 42 }");
            write_file(&repo, "Cargo.lock", "ignored");
            Ok(())
        }
    }

    /// Repository source that always fails
    struct BrokenRepo;

    #[async_trait]
    impl RepoSource for BrokenRepo {
        async fn clone_into(&self, link: &str, _dest: &Path) -> Result<()> {
            Err(IngestError::CloneFailed {
                link: link.to_string(),
                message: "remote unreachable".to_string(),
            })
        }
    }

    fn store() -> DocumentStore<RepositoryRecord> {
        let backend = Arc::new(SqliteBackend::open_in_memory().unwrap());
        DocumentStore::new(backend).unwrap()
    }

    fn config() -> RepositoryConfig {
        RepositoryConfig {
            ignore: vec![".git".to_string(), ".lock".to_string()],
        }
    }

    fn author() -> Attribution {
        Attribution::new(RecordId::new(), "Ada Lovelace")
    }

    #[tokio::test]
    async fn test_extract_persists_repository() {
        let store = store();
        let crawler = GithubCrawler::with_source(
            FakeRepo {
                clones: AtomicUsize::new(0),
            },
            &config(),
            store.clone(),
        );
        let link = "https://github.com/acme/demo";

        crawler.extract(link, &author()).await.unwrap();

        let record = store.find(&link_filter(link)).unwrap();
        assert_eq!(record.name, "demo");
        assert_eq!(record.platform, "github");
        assert!(record.content.contains_key("readme.md"));
        assert!(record.content.contains_key("src/lib.rs"));
        assert!(!record.content.contains_key("Cargo.lock"));
        assert_eq!(
            record.content.get("src/lib.rs").map(String::as_str),
            Some("pubfnanswer()->u32{42}")
        );
    }

    #[tokio::test]
    async fn test_extract_is_idempotent() {
        let store = store();
        let source = FakeRepo {
            clones: AtomicUsize::new(0),
        };
        let crawler = GithubCrawler::with_source(source, &config(), store.clone());
        let link = "https://github.com/acme/demo";

        crawler.extract(link, &author()).await.unwrap();
        crawler.extract(link, &author()).await.unwrap();

        // Second call was a dedup no-op: one clone, one record
        assert_eq!(crawler.source.clones.load(Ordering::SeqCst), 1);
        assert_eq!(store.bulk_find(&link_filter(link)).len(), 1);
    }

    #[tokio::test]
    async fn test_clone_failure_propagates_and_persists_nothing() {
        let store = store();
        let crawler = GithubCrawler::with_source(BrokenRepo, &config(), store.clone());
        let link = "https://github.com/acme/gone";

        let result = crawler.extract(link, &author()).await;
        assert!(matches!(result, Err(IngestError::CloneFailed { .. })));
        assert!(store.find(&link_filter(link)).is_none());
    }
}
