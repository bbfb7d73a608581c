//! Configuration schema definitions
//!
//! These types mirror a configuration file exactly as authored. Shape
//! checks beyond what serde enforces happen in the resolver.

use serde::{Deserialize, Serialize};

/// A package's bundler configuration, before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    /// Entry module path
    #[serde(default)]
    pub input: String,

    /// Output targets, in emission order
    #[serde(default)]
    pub output: RawOutputs,

    /// Plugin invocations, in resolution order
    #[serde(default)]
    pub plugins: Vec<RawPlugin>,

    /// Module names left out of the bundle
    #[serde(default)]
    pub external: Vec<String>,
}

/// `output` may be a single target or a list of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawOutputs {
    Many(Vec<RawOutput>),
    One(RawOutput),
}

impl Default for RawOutputs {
    fn default() -> Self {
        RawOutputs::Many(Vec::new())
    }
}

impl RawOutputs {
    /// View as a list regardless of how it was written
    pub fn as_slice(&self) -> &[RawOutput] {
        match self {
            RawOutputs::Many(outputs) => outputs,
            RawOutputs::One(output) => std::slice::from_ref(output),
        }
    }
}

/// A single output target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawOutput {
    /// Output file path
    #[serde(default)]
    pub file: String,

    /// Module format tag
    #[serde(default)]
    pub format: String,
}

/// A plugin invocation: either a bare token or a token with options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPlugin {
    Token(String),
    Invocation(RawPluginInvocation),
}

/// A plugin table: `{ name = "...", options = { ... } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawPluginInvocation {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<toml::Table>,
}

impl RawPlugin {
    pub fn name(&self) -> &str {
        match self {
            RawPlugin::Token(name) => name,
            RawPlugin::Invocation(invocation) => &invocation.name,
        }
    }

    pub fn options(&self) -> Option<&toml::Table> {
        match self {
            RawPlugin::Token(_) => None,
            RawPlugin::Invocation(invocation) => invocation.options.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_output_table() {
        let raw: RawConfig = toml::from_str(
            r#"
            input = "src/index.js"
            output = { file = "dist/index.js", format = "es" }
            "#,
        )
        .unwrap();

        assert_eq!(raw.output.as_slice().len(), 1);
        assert_eq!(raw.output.as_slice()[0].format, "es");
    }

    #[test]
    fn test_plugin_forms() {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "input": "src/index.js",
                "plugins": ["resolve", {"name": "commonjs", "options": {"sourceMap": false}}]
            }"#,
        )
        .unwrap();

        assert_eq!(raw.plugins[0], RawPlugin::Token("resolve".to_string()));
        assert_eq!(raw.plugins[1].name(), "commonjs");
        assert_eq!(
            raw.plugins[1].options().and_then(|o| o.get("sourceMap")),
            Some(&toml::Value::Boolean(false))
        );
    }

    #[test]
    fn test_misspelled_plugin_field_rejected() {
        let result = serde_json::from_str::<RawConfig>(
            r#"{
                "input": "src/index.js",
                "plugins": [{"name": "resolve", "opts": {"browser": true}}]
            }"#,
        );
        assert!(result.is_err());

        let result = toml::from_str::<RawConfig>(
            r#"
            input = "src/index.js"
            plugins = [{ name = "resolve", option = { browser = true } }]
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_sections_default_empty() {
        let raw: RawConfig = toml::from_str("").unwrap();
        assert_eq!(raw, RawConfig::default());
        assert!(raw.output.as_slice().is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = toml::from_str::<RawConfig>("entry = \"src/index.js\"").unwrap_err();
        assert!(err.to_string().contains("entry"));
    }
}
