//! Configuration for the retrieval engine.
//!
//! Layered configuration:
//! - Default values
//! - `quarry.toml` configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `QUARRY_` and use double
//! underscores to separate nested levels:
//! - `QUARRY_SEGMENTATION__SECTION_MAX_LENGTH=1500`
//! - `QUARRY_SEARCH__LIMIT=5`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Name of the configuration file searched for in the working directory
/// and its ancestors.
const CONFIG_FILE: &str = "quarry.toml";

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Settings {
    /// Directory for a durable on-disk index. When unset the index lives
    /// in memory and does not survive the process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_path: Option<PathBuf>,

    /// Section segmentation bounds.
    #[serde(default)]
    pub segmentation: SegmentationConfig,

    /// Query-time behavior.
    #[serde(default)]
    pub search: SearchConfig,

    /// Logging levels.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Bounds for the sentence-accumulating segmenter, in characters.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SegmentationConfig {
    /// Sections shorter than this are dropped, never indexed.
    #[serde(default = "default_section_min_length")]
    pub section_min_length: usize,

    /// Soft upper bound; a single sentence longer than this is kept whole.
    #[serde(default = "default_section_max_length")]
    pub section_max_length: usize,

    /// A sentence ending with ':' below this length is treated as a
    /// heading and forces a section break.
    #[serde(default = "default_heading_max_chars")]
    pub heading_max_chars: usize,
}

/// Query-time settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SearchConfig {
    /// Maximum number of ranked sections returned per query.
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

/// Logging configuration consumed by [`crate::logging::init_with_config`].
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level filter (error, warn, info, debug, trace).
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides, e.g. `segment = "debug"`.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_section_min_length() -> usize {
    200
}
fn default_section_max_length() -> usize {
    1000
}
fn default_heading_max_chars() -> usize {
    100
}
fn default_search_limit() -> usize {
    3
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            section_min_length: default_section_min_length(),
            section_max_length: default_section_max_length(),
            heading_max_chars: default_heading_max_chars(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_search_limit(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl SegmentationConfig {
    /// Validate bound ordering.
    pub fn validate(&self) -> Result<(), String> {
        if self.section_min_length >= self.section_max_length {
            return Err(format!(
                "section_min_length ({}) must be less than section_max_length ({})",
                self.section_min_length, self.section_max_length
            ));
        }
        Ok(())
    }
}

impl Settings {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_config_file().unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            // Double underscore becomes a nesting dot; single underscores
            // stay part of the field name.
            .merge(
                Env::prefixed("QUARRY_")
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
            .extract()
            .map_err(Box::new)
    }

    /// Save current configuration to file.
    pub fn save(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// Create a default `quarry.toml` in the working directory.
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }

    /// Find `quarry.toml` searching from the current directory upward.
    fn find_config_file() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        for ancestor in current.ancestors() {
            let candidate = ancestor.join(CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }
}
