//! Crawler configuration
//!
//! Configuration is loaded from a TOML file with kebab-case keys and
//! validated before use. Every section has sensible defaults, so a config
//! file only needs to name what it overrides.

use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub rendering: RenderingConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Static HTTP fetcher settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FetcherConfig {
    /// User-agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Overall per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection-establishment timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Rendering-session settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RenderingConfig {
    /// Ceiling on scroll iterations per page
    #[serde(default = "default_scroll_limit")]
    pub scroll_limit: u32,

    /// Settle interval between scrolls, in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            scroll_limit: default_scroll_limit(),
            settle_ms: default_settle_ms(),
        }
    }
}

/// Repository-crawl settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Path-prefix / filename-suffix patterns excluded from the content tree
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            ignore: default_ignore(),
        }
    }
}

/// Document store settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_user_agent() -> String {
    concat!("inklake/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_scroll_limit() -> u32 {
    5
}

fn default_settle_ms() -> u64 {
    5000
}

fn default_ignore() -> Vec<String> {
    [".git", ".toml", ".lock", ".png"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_database_path() -> String {
    "./inklake.db".to_string()
}

/// Loads and validates a configuration file from the given path
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Validates a configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    if config.fetcher.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "fetcher.user-agent must not be empty".to_string(),
        ));
    }
    if config.fetcher.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "fetcher.request-timeout-secs must be at least 1".to_string(),
        ));
    }
    if config.rendering.scroll_limit == 0 {
        return Err(ConfigError::Validation(
            "rendering.scroll-limit must be at least 1".to_string(),
        ));
    }
    if config.store.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "store.database-path must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[fetcher]
user-agent = "TestBot/1.0"
request-timeout-secs = 15

[rendering]
scroll-limit = 3
settle-ms = 50

[repository]
ignore = [".git", ".lock"]

[store]
database-path = "./test.db"
"#;
        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.fetcher.user_agent, "TestBot/1.0");
        assert_eq!(config.fetcher.request_timeout_secs, 15);
        assert_eq!(config.rendering.scroll_limit, 3);
        assert_eq!(config.rendering.settle_ms, 50);
        assert_eq!(config.repository.ignore, vec![".git", ".lock"]);
        assert_eq!(config.store.database_path, "./test.db");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.rendering.scroll_limit, 5);
        assert_eq!(config.rendering.settle_ms, 5000);
        assert!(config.repository.ignore.contains(&".git".to_string()));
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_rejects_zero_scroll_limit() {
        let file = create_temp_config("[rendering]\nscroll-limit = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validation_rejects_blank_user_agent() {
        let file = create_temp_config("[fetcher]\nuser-agent = \"  \"\n");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
