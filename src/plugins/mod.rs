//! Plugin capability registry
//!
//! Configurations name plugins by token. The bundler side supplies the actual
//! implementations through a [`PluginRegistry`]; tokens are only looked up
//! when a plan is bound for execution, never during resolution.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Plugin hook context
pub struct PluginContext {
    /// Package root directory
    pub root: PathBuf,

    /// Options the plugin was invoked with in the configuration
    pub options: Option<toml::Table>,
}

/// A capability the bundler can run for a package
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Canonical plugin name for logging and debugging
    fn name(&self) -> &str;

    /// Called before the bundler starts on a package
    async fn build_start(&self, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Called after the bundler has written every output
    async fn build_end(&self, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }
}

/// Maps capability tokens to plugin implementations
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the node-resolve and CommonJS capabilities
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        let resolve: Arc<dyn Plugin> = Arc::new(BuiltinPlugin::new("resolve"));
        registry.register_as(&["resolve", "node-resolve", "@rollup/plugin-node-resolve"], resolve);

        let commonjs: Arc<dyn Plugin> = Arc::new(BuiltinPlugin::new("commonjs"));
        registry.register_as(&["commonjs", "@rollup/plugin-commonjs"], commonjs);

        registry
    }

    /// Register a plugin under its own name
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        let name = plugin.name().to_string();
        self.plugins.insert(name, plugin);
    }

    /// Register a plugin under several tokens
    pub fn register_as(&mut self, tokens: &[&str], plugin: Arc<dyn Plugin>) {
        for token in tokens {
            self.plugins.insert(token.to_string(), plugin.clone());
        }
    }

    /// Look up the plugin behind a token
    pub fn get(&self, token: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(token).cloned()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.plugins.contains_key(token)
    }

    /// Registered tokens, sorted
    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.plugins.keys().map(|s| s.as_str()).collect();
        tokens.sort_unstable();
        tokens
    }
}

/// Runs plugin hooks over one package's plugin chain, in resolution order
pub struct PluginManager {
    plugins: Vec<(Arc<dyn Plugin>, PluginContext)>,
}

impl PluginManager {
    /// Create a manager with no plugins
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Append a plugin to the chain
    pub fn push(&mut self, plugin: Arc<dyn Plugin>, context: PluginContext) {
        self.plugins.push((plugin, context));
    }

    /// Plugin names in execution order
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|(plugin, _)| plugin.name()).collect()
    }

    /// Run build_start hooks
    pub async fn run_build_start(&self) -> Result<()> {
        for (plugin, ctx) in &self.plugins {
            debug!("build_start: {}", plugin.name());
            plugin.build_start(ctx).await?;
        }
        Ok(())
    }

    /// Run build_end hooks
    pub async fn run_build_end(&self) -> Result<()> {
        for (plugin, ctx) in &self.plugins {
            debug!("build_end: {}", plugin.name());
            plugin.build_end(ctx).await?;
        }
        Ok(())
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability whose work happens entirely inside the external bundler
pub struct BuiltinPlugin {
    name: String,
}

impl BuiltinPlugin {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Plugin for BuiltinPlugin {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingPlugin {
        name: String,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Plugin for RecordingPlugin {
        fn name(&self) -> &str {
            &self.name
        }

        async fn build_start(&self, _ctx: &PluginContext) -> Result<()> {
            self.log.lock().unwrap().push(format!("start:{}", self.name));
            Ok(())
        }

        async fn build_end(&self, _ctx: &PluginContext) -> Result<()> {
            self.log.lock().unwrap().push(format!("end:{}", self.name));
            Ok(())
        }
    }

    fn context() -> PluginContext {
        PluginContext {
            root: PathBuf::from("/pkg"),
            options: None,
        }
    }

    #[test]
    fn test_builtin_aliases() {
        let registry = PluginRegistry::with_builtins();

        assert!(registry.contains("resolve"));
        assert!(registry.contains("@rollup/plugin-node-resolve"));
        assert!(registry.contains("@rollup/plugin-commonjs"));
        assert!(!registry.contains("terser"));
        assert_eq!(registry.get("node-resolve").unwrap().name(), "resolve");
        assert_eq!(registry.tokens().len(), 5);
    }

    #[test]
    fn test_register_custom_plugin() {
        let mut registry = PluginRegistry::with_builtins();
        registry.register(Arc::new(BuiltinPlugin::new("banner")));

        assert!(registry.contains("banner"));
        assert_eq!(registry.get("banner").unwrap().name(), "banner");
        assert_eq!(registry.tokens().len(), 6);
    }

    #[tokio::test]
    async fn test_hooks_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = PluginManager::new();
        for name in ["resolve", "commonjs"] {
            let plugin = Arc::new(RecordingPlugin {
                name: name.to_string(),
                log: log.clone(),
            });
            manager.push(plugin, context());
        }

        manager.run_build_start().await.unwrap();
        manager.run_build_end().await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["start:resolve", "start:commonjs", "end:resolve", "end:commonjs"]
        );
    }
}
