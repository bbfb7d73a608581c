//! Plan binding and hand-off to the bundler
//!
//! A [`BuildSpec`] says nothing about the package on disk. Binding checks it
//! against the package's sources and the plugin registry right before it is
//! handed to a [`Bundler`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::plugins::{Plugin, PluginContext, PluginManager, PluginRegistry};
use crate::resolver::ResolutionError;
use crate::spec::BuildSpec;

/// Read-only view of a package's source files
pub trait SourceTree {
    /// Whether `path` (relative to the package root) names an existing module
    fn contains(&self, path: &str) -> bool;

    /// Description used in error messages
    fn describe(&self) -> String;
}

/// Source tree backed by a directory on disk
#[derive(Debug, Clone)]
pub struct FsSourceTree {
    root: PathBuf,
}

impl FsSourceTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceTree for FsSourceTree {
    fn contains(&self, path: &str) -> bool {
        self.root.join(path).is_file()
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// A build spec whose entry and plugins have been located
pub struct BoundSpec {
    package: String,
    root: PathBuf,
    spec: BuildSpec,
    plugins: Vec<Arc<dyn Plugin>>,
}

impl BoundSpec {
    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn spec(&self) -> &BuildSpec {
        &self.spec
    }

    /// Plugin chain with per-invocation options, in resolution order
    pub fn plugin_manager(&self) -> PluginManager {
        let mut manager = PluginManager::new();
        for (plugin, plugin_ref) in self.plugins.iter().zip(self.spec.plugins()) {
            manager.push(
                plugin.clone(),
                PluginContext {
                    root: self.root.clone(),
                    options: plugin_ref.options().cloned(),
                },
            );
        }
        manager
    }

    /// Serializable form consumed by out-of-process bundlers
    pub fn document(&self) -> PlanDocument<'_> {
        PlanDocument {
            package: &self.package,
            fingerprint: self.spec.fingerprint(),
            spec: &self.spec,
        }
    }
}

/// JSON layout of an emitted plan
#[derive(Debug, Serialize)]
pub struct PlanDocument<'a> {
    pub package: &'a str,
    pub fingerprint: String,
    #[serde(flatten)]
    pub spec: &'a BuildSpec,
}

/// Check a spec against its package sources and the plugin registry
pub fn bind(
    package: &str,
    root: &Path,
    spec: BuildSpec,
    registry: &PluginRegistry,
    sources: &dyn SourceTree,
) -> Result<BoundSpec, ResolutionError> {
    if !sources.contains(spec.entry()) {
        return Err(ResolutionError::EntryNotFound {
            entry: spec.entry().to_string(),
            root: sources.describe(),
        });
    }

    let mut plugins: Vec<Arc<dyn Plugin>> = Vec::with_capacity(spec.plugins().len());
    for (index, plugin_ref) in spec.plugins().iter().enumerate() {
        let plugin = registry
            .get(plugin_ref.token())
            .ok_or_else(|| ResolutionError::UnknownPlugin {
                index,
                token: plugin_ref.token().to_string(),
            })?;

        // Aliases share one implementation, so compare capabilities, not tokens
        if let Some(first) = plugins.iter().position(|p| Arc::ptr_eq(p, &plugin)) {
            return Err(ResolutionError::DuplicatePlugin {
                index,
                first,
                token: plugin_ref.token().to_string(),
            });
        }

        plugins.push(plugin);
    }

    debug!("Bound {} with plugins {:?}", package, spec.plugins());

    Ok(BoundSpec {
        package: package.to_string(),
        root: root.to_path_buf(),
        spec,
        plugins,
    })
}

/// The external engine that turns a bound plan into output files
#[async_trait]
pub trait Bundler: Send + Sync {
    /// Build one package, returning the paths it wrote
    async fn bundle(&self, plan: &BoundSpec) -> Result<Vec<PathBuf>>;
}

/// Hands plans to an out-of-process bundler by writing them as JSON files
#[derive(Debug, Clone)]
pub struct JsonPlanWriter {
    out_dir: PathBuf,
    pretty: bool,
}

impl JsonPlanWriter {
    pub fn new(out_dir: impl Into<PathBuf>, pretty: bool) -> Self {
        Self {
            out_dir: out_dir.into(),
            pretty,
        }
    }

    /// Where the plan for `package` is written
    pub fn plan_path(&self, package: &str) -> PathBuf {
        let stem = package.trim_start_matches('@').replace('/', "-");
        self.out_dir.join(format!("{}.plan.json", stem))
    }

    /// Write every plan, refusing to start if two packages share a plan file
    pub async fn write_all(&self, plans: &[&BoundSpec]) -> Result<Vec<PathBuf>> {
        let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
        for plan in plans {
            let path = self.plan_path(plan.package());
            if let Some(other) = claimed.insert(path.clone(), plan.root()) {
                anyhow::bail!(
                    "Packages at {} and {} would both write {}",
                    other.display(),
                    plan.root().display(),
                    path.display()
                );
            }
        }

        let mut written = Vec::with_capacity(plans.len());
        for plan in plans {
            written.extend(self.bundle(plan).await?);
        }
        Ok(written)
    }
}

#[async_trait]
impl Bundler for JsonPlanWriter {
    async fn bundle(&self, plan: &BoundSpec) -> Result<Vec<PathBuf>> {
        let plugins = plan.plugin_manager();
        plugins.run_build_start().await?;

        tokio::fs::create_dir_all(&self.out_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.out_dir.display()))?;

        let document = plan.document();
        let json = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };

        let path = self.plan_path(plan.package());
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write plan: {}", path.display()))?;

        plugins.run_build_end().await?;

        info!("Wrote plan for {} to {}", plan.package(), path.display());

        Ok(vec![path])
    }
}
