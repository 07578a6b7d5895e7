//! Run configuration.
//!
//! The partitioner reads the same project config file the rest of the site
//! build uses. Only the keys below matter here; anything else at the top
//! level belongs to other tools and is ignored.
//!
//! ```json
//! {
//!   "contentDir": "content",
//!   "build": {
//!     "mdDir": "build/md",
//!     "vueDir": "build/vue"
//!   },
//!   "partition": {
//!     "indexName": "index.md",
//!     "componentTags": ["slot", "g-image"],
//!     "invalidMetadata": "plain"
//!   }
//! }
//! ```
//!
//! The `partition` table is optional and every key in it has a default. TOML
//! works too when the file ends in `.toml`:
//!
//! ```toml
//! contentDir = "content"
//!
//! [build]
//! mdDir = "build/md"
//! vueDir = "build/vue"
//! ```
//!
//! Relative paths resolve against the directory holding the config file, so
//! a run never depends on the process working directory.

use crate::detect::DEFAULT_COMPONENT_TAGS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file used when none is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Unsupported config format (expected .json or .toml): {0}")]
    UnsupportedFormat(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration as read from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Source content tree.
    pub content_dir: PathBuf,
    /// Destination trees.
    pub build: BuildConfig,
    /// Routing knobs.
    #[serde(default)]
    pub partition: PartitionConfig,
    /// Directory relative paths are resolved against. Set by [`load_config`].
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Destination trees for the two pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BuildConfig {
    /// Documents that render as plain markdown.
    pub md_dir: PathBuf,
    /// Documents (and their resources) that need component rendering.
    pub vue_dir: PathBuf,
}

/// What to do with an index document whose front matter does not decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidMetadataPolicy {
    /// Route it like a plain document.
    #[default]
    Plain,
    /// Route it to the component tree.
    Rich,
}

/// Routing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PartitionConfig {
    /// File name of the document that anchors a directory.
    pub index_name: String,
    /// Tag names whose opening `<tag ` in a body marks it component-driven.
    pub component_tags: Vec<String>,
    /// Routing for index documents with undecodable front matter.
    pub invalid_metadata: InvalidMetadataPolicy,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            index_name: "index.md".to_string(),
            component_tags: DEFAULT_COMPONENT_TAGS.iter().map(|t| t.to_string()).collect(),
            invalid_metadata: InvalidMetadataPolicy::Plain,
        }
    }
}

/// The three roots of a run, resolved to absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trees {
    pub source: PathBuf,
    pub plain: PathBuf,
    pub rich: PathBuf,
}

impl Trees {
    pub fn new(
        source: impl Into<PathBuf>,
        plain: impl Into<PathBuf>,
        rich: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            plain: plain.into(),
            rich: rich.into(),
        }
    }

    /// Resolve each root against the working directory and fold `.`/`..`.
    pub fn absolute(&self) -> std::io::Result<Trees> {
        let absolute = |p: &Path| std::path::absolute(p).map(|p| crate::place::normalize(&p));
        Ok(Trees {
            source: absolute(&self.source)?,
            plain: absolute(&self.plain)?,
            rich: absolute(&self.rich)?,
        })
    }

    /// Reject roots that contain one another. Reconciliation empties the
    /// destinations, so any nesting would delete source files or the other
    /// destination, and a destination under the source would be walked.
    pub fn check_disjoint(&self) -> Result<(), ConfigError> {
        if self.plain.starts_with(&self.rich) || self.rich.starts_with(&self.plain) {
            return Err(ConfigError::Validation(format!(
                "build.mdDir ({}) and build.vueDir ({}) must not contain each other",
                self.plain.display(),
                self.rich.display()
            )));
        }
        for (key, dir) in [("build.mdDir", &self.plain), ("build.vueDir", &self.rich)] {
            if dir.starts_with(&self.source) {
                return Err(ConfigError::Validation(format!(
                    "{key} ({}) must not be inside contentDir ({})",
                    dir.display(),
                    self.source.display()
                )));
            }
            if self.source.starts_with(dir) {
                return Err(ConfigError::Validation(format!(
                    "{key} ({}) must not contain contentDir ({})",
                    dir.display(),
                    self.source.display()
                )));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Build a config directly from the three roots, with default routing.
    pub fn with_trees(trees: &Trees) -> Self {
        Self {
            content_dir: trees.source.clone(),
            build: BuildConfig {
                md_dir: trees.plain.clone(),
                vue_dir: trees.rich.clone(),
            },
            partition: PartitionConfig::default(),
            base_dir: PathBuf::new(),
        }
    }

    /// Resolve the roots against [`Config::base_dir`].
    pub fn trees(&self) -> Trees {
        let resolve = |p: &Path| crate::place::normalize(&self.base_dir.join(p));
        Trees {
            source: resolve(&self.content_dir),
            plain: resolve(&self.build.md_dir),
            rich: resolve(&self.build.vue_dir),
        }
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let index = &self.partition.index_name;
        if index.is_empty() || index.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "partition.indexName must be a plain file name, got {index:?}"
            )));
        }
        if self.partition.component_tags.is_empty() {
            return Err(ConfigError::Validation(
                "partition.componentTags must not be empty".into(),
            ));
        }
        if let Some(tag) = self
            .partition
            .component_tags
            .iter()
            .find(|t| t.is_empty() || t.contains(|c: char| c.is_whitespace() || c == '<'))
        {
            return Err(ConfigError::Validation(format!(
                "partition.componentTags entry {tag:?} is not a tag name"
            )));
        }
        self.trees().absolute()?.check_disjoint()
    }
}

/// Parse config text. The format follows the file extension; anything that
/// is not `.toml` is read as JSON.
pub fn parse_config(content: &str, path: &Path) -> Result<Config, ConfigError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    let config: Config = match ext.as_deref() {
        Some("toml") => toml::from_str(content)?,
        Some("json") | None => serde_json::from_str(content)?,
        Some(_) => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    };
    Ok(config)
}

/// Load, resolve, and validate a config file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config = parse_config(&content, path)?;
    let absolute = std::path::absolute(path)?;
    config.base_dir = absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    config.validate()?;
    Ok(config)
}
