//! Configuration file support (`.kml-filter.toml`)
//!
//! Configuration files can be placed in:
//! - User home directory: ~/.kml-filter.toml (user defaults)
//! - Project directory: ./.kml-filter.toml (project defaults)
//! - Custom location via --config flag (replaces both)
//!
//! Precedence order (highest to lowest):
//! 1. Command-line arguments (--source, --output-dir)
//! 2. Project config (./.kml-filter.toml)
//! 3. User config (~/.kml-filter.toml)
//! 4. Built-in defaults

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the home and current directories
pub const CONFIG_FILE_NAME: &str = ".kml-filter.toml";

/// Backing document used when neither CLI nor config name one
pub const DEFAULT_SOURCE: &str = "content/DIRECIONADORES1.kml";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backing document settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceConfig>,

    /// Export settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Path to the KML/KMZ document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory for exported files (defaults to the system temp dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load the explicit `--config` file, or discover and merge the defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        let user = dirs::home_dir().and_then(|home| Self::load_optional(&home.join(CONFIG_FILE_NAME)));
        let project = Self::load_optional(Path::new(CONFIG_FILE_NAME));
        Ok(Self::merge(user, project))
    }

    /// Load a discovered config, warning instead of failing on bad files
    fn load_optional(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => {
                log::debug!("Loaded config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                eprintln!("{} {e:#}", "Warning:".yellow().bold());
                None
            }
        }
    }

    /// Merge configs with precedence: project > user > defaults
    pub fn merge(user: Option<Self>, project: Option<Self>) -> Self {
        let mut merged = Self::default();
        for config in [user, project].into_iter().flatten() {
            if let Some(path) = config.source.and_then(|s| s.path) {
                merged.source = Some(SourceConfig { path: Some(path) });
            }
            if let Some(dir) = config.export.and_then(|e| e.dir) {
                merged.export = Some(ExportConfig { dir: Some(dir) });
            }
        }
        merged
    }

    /// Source document: CLI argument, then config, then [`DEFAULT_SOURCE`]
    pub fn resolve_source(&self, cli: Option<PathBuf>) -> PathBuf {
        cli.or_else(|| self.source.as_ref().and_then(|s| s.path.clone()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE))
    }

    /// Export directory: CLI argument, then config; `None` means temp dir
    pub fn resolve_export_dir(&self, cli: Option<PathBuf>) -> Option<PathBuf> {
        cli.or_else(|| self.export.as_ref().and_then(|e| e.dir.clone()))
    }
}
