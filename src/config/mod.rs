//! Configuration handling
//!
//! Reads `bundle.toml` / `bundle.json` files into [`RawConfig`] values. This
//! is the only layer that touches the filesystem for input; validation is left
//! to [`crate::resolver`].

mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

pub use schema::*;

/// File names looked up when a directory is given instead of a file
pub const CONFIG_FILE_NAMES: [&str; 2] = ["bundle.toml", "bundle.json"];

/// Supported configuration file syntaxes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Pick the syntax from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Some(ConfigFormat::Toml),
            Some("json") => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Parse configuration text in this syntax
    pub fn parse(&self, content: &str) -> Result<RawConfig> {
        match self {
            ConfigFormat::Toml => toml::from_str(content).context("Invalid TOML configuration"),
            ConfigFormat::Json => {
                serde_json::from_str(content).context("Invalid JSON configuration")
            }
        }
    }
}

/// A raw configuration together with where it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Parsed, unvalidated configuration
    pub raw: RawConfig,

    /// Path of the configuration file
    pub path: PathBuf,

    /// Package root (directory containing the configuration file)
    pub root: PathBuf,
}

impl LoadedConfig {
    /// Package name, taken from the root directory name
    pub fn package_name(&self) -> String {
        package_name(&self.root)
    }
}

/// Name of the package rooted at `root`
pub fn package_name(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string())
}

/// Find the configuration file inside a package directory
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Load configuration from a file, or from a package directory
pub fn load<P: AsRef<Path>>(path: P) -> Result<LoadedConfig> {
    let path = path.as_ref();
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let file = if absolute.is_dir() {
        find_config_file(&absolute).with_context(|| {
            format!(
                "No {} found in {}",
                CONFIG_FILE_NAMES.join(" or "),
                absolute.display()
            )
        })?
    } else {
        absolute
    };

    let format = ConfigFormat::from_path(&file).with_context(|| {
        format!(
            "Unsupported config file type (expected .toml or .json): {}",
            file.display()
        )
    })?;

    let content = fs::read_to_string(&file)
        .with_context(|| format!("Failed to read config file: {}", file.display()))?;

    let raw = format
        .parse(&content)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    debug!("Loaded {:?} config from {}", format, file.display());

    // Set root directory to the directory containing the config file
    let root = file
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(LoadedConfig {
        raw,
        path: file,
        root,
    })
}
