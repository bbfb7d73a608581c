//! Multi-package workspaces
//!
//! Discovers package configurations under a repository root and resolves
//! them concurrently. Packages share nothing: each keeps its own externals,
//! and a broken package never prevents its siblings from resolving.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::{self, find_config_file};
use crate::plan::{bind, BoundSpec, FsSourceTree};
use crate::plugins::PluginRegistry;
use crate::resolver::{resolve, ConfigError, ResolutionError};

/// Package directory patterns used when none are given
pub const DEFAULT_PATTERNS: [&str; 1] = ["packages/*"];

/// Directories never searched for packages
const SKIPPED_DIRS: [&str; 3] = ["node_modules", "dist", "target"];

/// Why a single package failed
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("{0:#}")]
    Load(anyhow::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// Result of resolving one package
pub struct PackageOutcome {
    /// Package name (directory name of the package root)
    pub package: String,

    /// Configuration file the package was loaded from
    pub config_path: PathBuf,

    pub result: Result<BoundSpec, PackageError>,
}

impl PackageOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// A set of package configurations resolved together
#[derive(Debug, Clone)]
pub struct Workspace {
    configs: Vec<PathBuf>,
}

impl Workspace {
    /// Workspace made of explicitly named config files or package directories
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self { configs: paths }
    }

    /// Find package configurations under `root`
    ///
    /// The root itself counts as a package when it has a config file. Other
    /// packages are directories whose path relative to `root` matches one of
    /// `patterns`.
    pub fn discover(root: &Path, patterns: &[String]) -> Result<Self> {
        let matcher = build_matcher(patterns)?;
        let mut configs = Vec::new();

        if let Some(config) = find_config_file(root) {
            configs.push(config);
        }

        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !is_skipped(entry));

        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            if !entry.file_type().is_dir() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");

            if !matcher.is_match(&relative) {
                continue;
            }

            match find_config_file(entry.path()) {
                Some(config) => {
                    debug!("Found package config {}", config.display());
                    configs.push(config);
                }
                None => debug!("Skipping {}: no config file", relative),
            }
        }

        configs.sort();
        configs.dedup();

        info!("Discovered {} package(s) under {}", configs.len(), root.display());

        Ok(Self { configs })
    }

    /// Configuration paths in this workspace
    pub fn configs(&self) -> &[PathBuf] {
        &self.configs
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Resolve every package concurrently, returning outcomes in config order
    pub async fn resolve_all(&self, registry: Arc<PluginRegistry>) -> Result<Vec<PackageOutcome>> {
        let mut tasks = JoinSet::new();

        for (index, config_path) in self.configs.iter().cloned().enumerate() {
            let registry = registry.clone();
            tasks.spawn_blocking(move || (index, resolve_package(&config_path, &registry)));
        }

        let mut outcomes = Vec::with_capacity(self.configs.len());
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined.context("Package resolution task panicked")?;
            if let Err(err) = &outcome.result {
                warn!("Package {} failed: {}", outcome.package, err);
            }
            outcomes.push((index, outcome));
        }

        outcomes.sort_by_key(|(index, _)| *index);
        Ok(outcomes.into_iter().map(|(_, outcome)| outcome).collect())
    }
}

/// Load, resolve and bind a single package
pub fn resolve_package(path: &Path, registry: &PluginRegistry) -> PackageOutcome {
    let loaded = match config::load(path) {
        Ok(loaded) => loaded,
        Err(err) => {
            let root = if path.is_dir() {
                path
            } else {
                path.parent().unwrap_or(path)
            };
            return PackageOutcome {
                package: config::package_name(root),
                config_path: path.to_path_buf(),
                result: Err(PackageError::Load(err)),
            };
        }
    };

    let package = loaded.package_name();
    let result = resolve(&loaded.raw)
        .map_err(PackageError::from)
        .and_then(|spec| {
            let sources = FsSourceTree::new(&loaded.root);
            bind(&package, &loaded.root, spec, registry, &sources).map_err(PackageError::from)
        });

    PackageOutcome {
        package,
        config_path: loaded.path,
        result,
    }
}

fn build_matcher(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern.trim_end_matches('/'))
            .literal_separator(true)
            .build()
            .with_context(|| format!("Invalid package pattern: {}", pattern))?;
        builder.add(glob);
    }
    builder.build().context("Failed to compile package patterns")
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.depth() > 0 && (name.starts_with('.') || SKIPPED_DIRS.iter().any(|dir| name == *dir))
}
