//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the vaultpress.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,

    pub paths: PathsConfig,

    /// URL prefix under which the content directory is served as static assets
    #[serde(default = "default_asset_prefix")]
    pub asset_prefix: String,

    /// Synthesized alias keys that are never emitted
    #[serde(default = "default_reserved_aliases")]
    pub reserved_aliases: Vec<String>,

    /// Top-level directories that are not routable documents
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,

    /// Regex patterns (matched against the path relative to the content root)
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    #[serde(default)]
    pub include_drafts: bool,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_asset_prefix() -> String {
    String::from("/content")
}

fn default_reserved_aliases() -> Vec<String> {
    vec![String::from("index")]
}

fn default_excluded_prefixes() -> Vec<String> {
    vec![String::from("contributor"), String::from("tags")]
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SiteConfig {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub content: PathBuf,
    pub output: PathBuf,

    /// Alias manifest, defaults to `<content>/aliases.json`
    #[serde(default)]
    pub aliases: Option<PathBuf>,

    /// Redirect manifest, defaults to `<content>/redirects.json`
    #[serde(default)]
    pub redirects: Option<PathBuf>,
}

impl Config {
    /// Configuration for a content directory with every other setting defaulted
    pub fn new(content: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            site: SiteConfig::default(),
            paths: PathsConfig {
                content: content.into(),
                output: output.into(),
                aliases: None,
                redirects: None,
            },
            asset_prefix: default_asset_prefix(),
            reserved_aliases: default_reserved_aliases(),
            excluded_prefixes: default_excluded_prefixes(),
            ignore_patterns: Vec::new(),
            include_drafts: false,
            config_path: None,
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Get the content directory, resolved relative to config file
    pub fn content_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.content)
    }

    /// Get the output directory, resolved relative to config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    pub fn alias_manifest_path(&self) -> PathBuf {
        match &self.paths.aliases {
            Some(path) => self.resolve_path(path),
            None => self.content_dir().join("aliases.json"),
        }
    }

    pub fn redirect_manifest_path(&self) -> PathBuf {
        match &self.paths.redirects {
            Some(path) => self.resolve_path(path),
            None => self.content_dir().join("redirects.json"),
        }
    }

    /// Whether a document path falls under an excluded top-level directory
    pub fn is_excluded(&self, path: &vaultpress_types::ContentPath) -> bool {
        path.segments().next().is_some_and(|first| {
            let first = first.to_lowercase();
            self.excluded_prefixes
                .iter()
                .any(|prefix| first.starts_with(&prefix.to_lowercase()))
        })
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(parent) = self.config_path.as_ref().and_then(|p| p.parent()) {
            parent.join(path)
        } else {
            path.to_path_buf()
        }
    }
}
