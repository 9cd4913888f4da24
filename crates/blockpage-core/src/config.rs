//! Configuration management for blockpage.
//!
//! Settings live in a single TOML file with one section per concern:
//!
//! ```toml
//! [api]
//! base_url = "https://api.notion.com"
//! version = "2022-06-28"
//! page_size = 100
//! timeout_secs = 30
//!
//! [assets]
//! root = "/srv/site/public"
//! dir_name = "notion-assets"
//! timeout_secs = 30
//! max_redirects = 5
//! fallback_extension = ".bin"
//! image_failure = "abort"
//!
//! [tree]
//! max_depth = 64
//! ```
//!
//! Every field has a default, so partial files are fine. The API token is
//! never read from the file; it comes from `BLOCKPAGE_API_TOKEN`.
//!
//! ## Loading
//!
//! ```rust,no_run
//! use blockpage_core::{Config, Result};
//!
//! let config = Config::load()?;
//! println!("Assets under {}", config.assets.cache_dir().display());
//! # Ok::<(), blockpage_core::Error>(())
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the remote API token.
pub const TOKEN_ENV: &str = "BLOCKPAGE_API_TOKEN";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "BLOCKPAGE_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote content API settings.
    pub api: ApiConfig,
    /// Asset cache settings.
    pub assets: AssetConfig,
    /// Tree materialization settings.
    pub tree: TreeConfig,
}

/// Remote content API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, without a trailing `/v1`.
    pub base_url: String,
    /// Value of the `Notion-Version` header.
    pub version: String,
    /// Children per pagination request (the API caps this at 100).
    pub page_size: u32,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.notion.com".into(),
            version: "2022-06-28".into(),
            page_size: 100,
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// What to do when a hosted image block cannot be cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFailurePolicy {
    /// Fail the whole render.
    #[default]
    Abort,
    /// Keep the block pointing at its original remote URL.
    KeepRemote,
}

/// Asset cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory that contains the cache directory (usually a site's public root).
    pub root: PathBuf,
    /// Name of the cache directory; also the first segment of public paths.
    pub dir_name: String,
    /// Per-download timeout.
    pub timeout_secs: u64,
    /// Redirects followed per download.
    pub max_redirects: usize,
    /// Extension used when the URL path has none.
    pub fallback_extension: String,
    /// Image block failure handling.
    pub image_failure: ImageFailurePolicy,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: default_data_root().join("public"),
            dir_name: "notion-assets".into(),
            timeout_secs: 30,
            max_redirects: 5,
            fallback_extension: ".bin".into(),
            image_failure: ImageFailurePolicy::Abort,
        }
    }
}

impl AssetConfig {
    /// Settings rooted at `root`, everything else default.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Directory the cached files are written to.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(&self.dir_name)
    }

    /// Download timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Tree materialization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Deepest nesting level accepted before the walk fails.
    pub max_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

impl Config {
    /// Load configuration from the default location, or defaults if absent.
    ///
    /// `BLOCKPAGE_CONFIG` overrides the location. A file that exists but
    /// cannot be read or parsed is an error.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::from_path(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content).map_err(|e| Error::Config(format!("Failed to write config: {e}")))
    }

    /// Reject values the rest of the crate cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.api.page_size == 0 || self.api.page_size > 100 {
            return Err(Error::Config(format!(
                "api.page_size must be between 1 and 100, got {}",
                self.api.page_size
            )));
        }
        if self.assets.dir_name.is_empty()
            || self.assets.dir_name.contains(['/', '\\'])
            || self.assets.dir_name.contains("..")
        {
            return Err(Error::Config(format!(
                "assets.dir_name must be a single path segment, got '{}'",
                self.assets.dir_name
            )));
        }
        if !self.assets.fallback_extension.starts_with('.') {
            return Err(Error::Config(format!(
                "assets.fallback_extension must start with '.', got '{}'",
                self.assets.fallback_extension
            )));
        }
        if self.tree.max_depth == 0 {
            return Err(Error::Config("tree.max_depth must be at least 1".into()));
        }
        Ok(())
    }

    /// The API token from the environment, if set and non-empty.
    #[must_use]
    pub fn api_token() -> Option<String> {
        std::env::var(TOKEN_ENV)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    /// Location of the global config file.
    ///
    /// - Linux: `~/.config/blockpage/global.toml`
    /// - macOS: `~/Library/Application Support/dev.outfitter.blockpage/global.toml`
    /// - Windows: `%APPDATA%\outfitter\blockpage\config\global.toml`
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        let project_dirs = directories::ProjectDirs::from("dev", "outfitter", "blockpage")
            .ok_or_else(|| Error::Config("Failed to determine project directories".into()))?;
        Ok(project_dirs.config_dir().join("global.toml"))
    }
}

fn default_data_root() -> PathBuf {
    directories::ProjectDirs::from("dev", "outfitter", "blockpage").map_or_else(
        || PathBuf::from(".blockpage"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://api.notion.com");
        assert_eq!(config.api.page_size, 100);
        assert_eq!(config.assets.dir_name, "notion-assets");
        assert_eq!(config.assets.max_redirects, 5);
        assert_eq!(config.assets.fallback_extension, ".bin");
        assert_eq!(config.assets.image_failure, ImageFailurePolicy::Abort);
        assert_eq!(config.tree.max_depth, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("global.toml");
        fs::write(
            &path,
            "[assets]\nroot = \"/srv/public\"\nimage_failure = \"keep_remote\"\n",
        )?;

        let config = Config::from_path(&path)?;
        assert_eq!(config.assets.root, PathBuf::from("/srv/public"));
        assert_eq!(config.assets.image_failure, ImageFailurePolicy::KeepRemote);
        assert_eq!(config.assets.dir_name, "notion-assets");
        assert_eq!(config.api.version, "2022-06-28");
        assert_eq!(
            config.assets.cache_dir(),
            PathBuf::from("/srv/public/notion-assets")
        );
        Ok(())
    }

    #[test]
    fn test_save_and_load_roundtrip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("global.toml");

        let mut config = Config::default();
        config.api.page_size = 50;
        config.tree.max_depth = 8;
        config.save(&path)?;

        assert_eq!(Config::from_path(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("global.toml");
        fs::write(&path, "[api\nbase_url = ").unwrap();

        let err = Config::from_path(&path).unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.api.page_size = 250;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.assets.dir_name = "../escape".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.assets.fallback_extension = "bin".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tree.max_depth = 0;
        assert!(config.validate().is_err());
    }
}
