//! Normalized build plan types
//!
//! A [`BuildSpec`] is only ever produced by [`crate::resolver::resolve`], so
//! every value of these types already satisfies the configuration invariants.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Module format of an emitted output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModuleFormat {
    #[serde(rename = "amd")]
    Amd,
    #[serde(rename = "cjs")]
    CommonJs,
    #[serde(rename = "es")]
    EsModule,
    #[serde(rename = "iife")]
    Iife,
    #[serde(rename = "umd")]
    Umd,
    #[serde(rename = "system")]
    System,
}

impl ModuleFormat {
    /// Every supported format, in canonical tag order
    pub const ALL: [ModuleFormat; 6] = [
        ModuleFormat::Amd,
        ModuleFormat::CommonJs,
        ModuleFormat::EsModule,
        ModuleFormat::Iife,
        ModuleFormat::Umd,
        ModuleFormat::System,
    ];

    /// Canonical tag as written in plans
    pub fn tag(&self) -> &'static str {
        match self {
            ModuleFormat::Amd => "amd",
            ModuleFormat::CommonJs => "cjs",
            ModuleFormat::EsModule => "es",
            ModuleFormat::Iife => "iife",
            ModuleFormat::Umd => "umd",
            ModuleFormat::System => "system",
        }
    }

    /// Human-readable list of accepted tags, used in error messages
    pub fn expected() -> String {
        let tags: Vec<&str> = Self::ALL.iter().map(|f| f.tag()).collect();
        format!(
            "one of {} (aliases: commonjs, esm, module, systemjs)",
            tags.join(", ")
        )
    }
}

impl FromStr for ModuleFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amd" => Ok(ModuleFormat::Amd),
            "cjs" | "commonjs" => Ok(ModuleFormat::CommonJs),
            "es" | "esm" | "module" => Ok(ModuleFormat::EsModule),
            "iife" => Ok(ModuleFormat::Iife),
            "umd" => Ok(ModuleFormat::Umd),
            "system" | "systemjs" => Ok(ModuleFormat::System),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One file the bundler emits
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputTarget {
    file: String,
    format: ModuleFormat,
}

impl OutputTarget {
    pub(crate) fn new(file: String, format: ModuleFormat) -> Self {
        Self { file, format }
    }

    /// Output path, relative to the package root
    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn format(&self) -> ModuleFormat {
        self.format
    }
}

/// Capability token naming a plugin, plus the options it was invoked with
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginRef {
    token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<toml::Table>,
}

impl PluginRef {
    pub(crate) fn new(token: String, options: Option<toml::Table>) -> Self {
        Self { token, options }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn options(&self) -> Option<&toml::Table> {
        self.options.as_ref()
    }
}

/// Name of a module that is referenced but never bundled
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    pub(crate) fn new(name: String) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated build plan for a single package
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildSpec {
    entry: String,
    outputs: Vec<OutputTarget>,
    plugins: Vec<PluginRef>,
    externals: Vec<ModuleName>,
}

impl BuildSpec {
    pub(crate) fn new(
        entry: String,
        outputs: Vec<OutputTarget>,
        plugins: Vec<PluginRef>,
        externals: Vec<ModuleName>,
    ) -> Self {
        Self {
            entry,
            outputs,
            plugins,
            externals,
        }
    }

    /// Entry module path, relative to the package root
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Output targets in authored order
    pub fn outputs(&self) -> &[OutputTarget] {
        &self.outputs
    }

    /// Plugins in resolution order
    pub fn plugins(&self) -> &[PluginRef] {
        &self.plugins
    }

    pub fn externals(&self) -> &[ModuleName] {
        &self.externals
    }

    /// Whether an import id must be left to the target format's own loader
    pub fn is_external(&self, id: &str) -> bool {
        self.externals.iter().any(|name| name.as_str() == id)
    }

    /// Stable content hash, usable as a cache key by bundlers
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.entry.as_bytes());
        for output in &self.outputs {
            hasher.update(b"\0output\0");
            hasher.update(output.file.as_bytes());
            hasher.update(b"\0");
            hasher.update(output.format.tag().as_bytes());
        }
        for plugin in &self.plugins {
            hasher.update(b"\0plugin\0");
            hasher.update(plugin.token.as_bytes());
            if let Some(options) = &plugin.options {
                hasher.update(b"\0");
                hasher.update(toml::Value::Table(options.clone()).to_string().as_bytes());
            }
        }
        for external in &self.externals {
            hasher.update(b"\0external\0");
            hasher.update(external.0.as_bytes());
        }
        let result = hasher.finalize();
        hex::encode(&result[..8])
    }
}
