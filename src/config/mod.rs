//! Project configuration management for `lastmod.json`.
//!
//! # Keys
//!
//! | Key                | Purpose                                              |
//! |--------------------|------------------------------------------------------|
//! | `targetDirs`       | Directory glob patterns expanded into bundles        |
//! | `extensions`       | File extensions counted as images (case-insensitive) |
//! | `maxDepth`         | Recursion bound inside a bundle (1 = top level only) |
//! | `frontmatterDelim` | Line marking the descriptor header boundaries        |
//! | `gitAdd`           | Stage rewritten descriptors with `git add`           |
//! | `indexFile`        | Descriptor file name inside each bundle              |
//! | `cacheFile`        | Fingerprint cache location, relative to the root     |
//! | `fingerprint`      | `mtime` or `hash`                                    |
//!
//! # Example
//!
//! ```json
//! {
//!   "targetDirs": ["content/galleries/*", "content/stories/**"],
//!   "extensions": ["jpg", "png", "webp"],
//!   "maxDepth": 2,
//!   "gitAdd": true
//! }
//! ```
//!
//! A config file ending in `.toml` is read as TOML with the same keys.

pub mod defaults;
mod error;

pub use error::ConfigError;

use crate::{bundle::Strategy, cli::Cli, log};
use anyhow::Result;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration record.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Config {
    /// Absolute project root (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Simulate only: no descriptor writes, no cache persist
    #[serde(skip)]
    pub dry_run: bool,

    /// Ordered directory glob patterns, relative to the root.
    #[serde(default = "defaults::target_dirs")]
    #[educe(Default = defaults::target_dirs())]
    pub target_dirs: Vec<String>,

    /// Image extensions, stored lowercase without leading dot.
    #[serde(default = "defaults::extensions")]
    #[educe(Default = defaults::extensions())]
    pub extensions: Vec<String>,

    /// Recursion bound for the scanner.
    #[serde(default = "defaults::max_depth")]
    #[educe(Default = defaults::max_depth())]
    pub max_depth: usize,

    /// Descriptor header delimiter, matched against trimmed lines.
    #[serde(default = "defaults::frontmatter_delim")]
    #[educe(Default = defaults::frontmatter_delim())]
    pub frontmatter_delim: String,

    #[serde(default = "defaults::r#false")]
    #[educe(Default = defaults::r#false())]
    pub git_add: bool,

    #[serde(default = "defaults::index_file")]
    #[educe(Default = defaults::index_file())]
    pub index_file: String,

    #[serde(default = "defaults::cache_file")]
    #[educe(Default = defaults::cache_file())]
    pub cache_file: PathBuf,

    #[serde(default = "defaults::fingerprint")]
    #[educe(Default = defaults::fingerprint())]
    pub fingerprint: Strategy,
}

impl Config {
    /// Parse configuration from a JSON string
    pub fn from_json_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|err| ConfigError::Json(path.to_path_buf(), err))
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Toml(path.to_path_buf(), err))
    }

    /// Load configuration from file path, picking the format by extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml")) {
            Self::from_toml_str(&content, path)
        } else {
            Self::from_json_str(&content, path)
        }
    }

    /// Load, apply CLI overrides, normalize and validate.
    ///
    /// A missing config file falls back to defaults; a malformed one is fatal.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let root = normalize_path(&expand_tilde(root));
        let config_path = normalize_path(&root.join(&cli.config));

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            log!("config"; "{} not found, using defaults", config_path.display());
            Self::default()
        };

        config.root = root;
        config.config_path = config_path;
        config.update_with_cli(cli);
        config.normalize();
        config.validate()?;

        Ok(config)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        self.dry_run = cli.dry_run;
        Self::update_option(&mut self.fingerprint, cli.fingerprint.as_ref());
        Self::update_option(&mut self.git_add, cli.git_add.as_ref());
        Self::update_option(&mut self.max_depth, cli.max_depth.as_ref());
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Lowercase extensions and strip leading dots, dropping duplicates.
    fn normalize(&mut self) {
        let mut extensions: Vec<String> = self
            .extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        extensions.sort();
        extensions.dedup();
        self.extensions = extensions;
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth < 1 {
            return Err(ConfigError::Validation("`maxDepth` must be at least 1".into()));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "`extensions` must contain at least one extension".into(),
            ));
        }
        if self.frontmatter_delim.trim().is_empty() {
            return Err(ConfigError::Validation(
                "`frontmatterDelim` must not be blank".into(),
            ));
        }
        if self.index_file.trim().is_empty() {
            return Err(ConfigError::Validation("`indexFile` must not be empty".into()));
        }
        Ok(())
    }

    /// Absolute path of the fingerprint cache file.
    pub fn cache_path(&self) -> PathBuf {
        let path = expand_tilde(&self.cache_file);
        if path.is_relative() {
            self.root.join(path)
        } else {
            path
        }
    }

    /// Check whether `path` carries one of the configured image extensions.
    pub fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}

/// Normalize a path to absolute, using canonicalize if the path exists
fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        // For non-existent paths, manually make them absolute
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

// ============================================================================
// Tests
// ============================================================================
