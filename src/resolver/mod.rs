//! Configuration resolution
//!
//! Turns an as-authored [`RawConfig`] into a [`BuildSpec`]. Resolution is a
//! pure function of its input: it never reads the filesystem, so resolving the
//! same configuration twice always yields equal specs. Checks that need the
//! package on disk or a plugin registry happen later, in [`crate::plan::bind`].

mod error;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::config::{RawConfig, RawOutput, RawPlugin};
use crate::spec::{BuildSpec, ModuleFormat, ModuleName, OutputTarget, PluginRef};
use crate::utils::{is_absolute_path, normalize_path};

pub use error::{ConfigError, ConfigErrorKind, ResolutionError};

/// Plugin tokens: lowercase, optionally scoped (`@rollup/plugin-commonjs`)
static PLUGIN_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:@[a-z0-9][a-z0-9._-]*/)?[a-z0-9][a-z0-9._-]*$").unwrap()
});

/// Module names: bare or scoped package name, optional subpath, optional `node:` prefix
static MODULE_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:node:)?(?:@[\w.~-]+/)?[\w~$][\w.~$-]*(?:/[\w.~$@-]+)*$").unwrap()
});

const ENTRY_SHAPE: &str = "a path to the entry module, relative to the package root";
const OUTPUTS_SHAPE: &str = "at least one { file, format } target";
const FILE_SHAPE: &str = "an output file path";
const PLUGIN_SHAPE: &str = "a lowercase plugin token such as \"resolve\" or \"@rollup/plugin-commonjs\"";
const EXTERNAL_SHAPE: &str = "a module name such as \"react\" or \"@scope/pkg/sub\", not a file path";

/// Validate and normalize a raw configuration
pub fn resolve(raw: &RawConfig) -> Result<BuildSpec, ConfigError> {
    let entry = resolve_entry(&raw.input)?;
    let outputs = resolve_outputs(raw.output.as_slice(), &entry)?;
    let plugins = resolve_plugins(&raw.plugins)?;
    let externals = resolve_externals(&raw.external, &raw.input, &entry)?;

    debug!(
        "Resolved entry {} with {} output(s), {} plugin(s), {} external(s)",
        entry,
        outputs.len(),
        plugins.len(),
        externals.len()
    );

    Ok(BuildSpec::new(entry, outputs, plugins, externals))
}

fn resolve_entry(input: &str) -> Result<String, ConfigError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ConfigError::new(
            "input",
            ConfigErrorKind::Missing {
                expected: ENTRY_SHAPE.to_string(),
            },
        ));
    }

    let invalid = || {
        ConfigError::new(
            "input",
            ConfigErrorKind::Invalid {
                found: input.to_string(),
                expected: ENTRY_SHAPE.to_string(),
            },
        )
    };

    if is_url(input) || is_absolute_path(input) {
        return Err(invalid());
    }

    // The entry must stay inside the package root
    let entry = normalize_path(input);
    if entry.is_empty() || entry == ".." || entry.starts_with("../") {
        return Err(invalid());
    }

    Ok(entry)
}

fn resolve_outputs(raw: &[RawOutput], entry: &str) -> Result<Vec<OutputTarget>, ConfigError> {
    if raw.is_empty() {
        return Err(ConfigError::new(
            "output",
            ConfigErrorKind::Empty {
                expected: OUTPUTS_SHAPE.to_string(),
            },
        ));
    }

    let mut outputs: Vec<OutputTarget> = Vec::with_capacity(raw.len());

    for (index, output) in raw.iter().enumerate() {
        let file_field = format!("output[{}].file", index);
        let format_field = format!("output[{}].format", index);

        let authored = output.file.trim();
        if authored.is_empty() {
            return Err(ConfigError::new(
                file_field,
                ConfigErrorKind::Missing {
                    expected: FILE_SHAPE.to_string(),
                },
            ));
        }

        let file = normalize_path(authored);
        if is_url(authored) || file.is_empty() || file == "/" || file.ends_with("..") {
            return Err(ConfigError::new(
                file_field,
                ConfigErrorKind::Invalid {
                    found: authored.to_string(),
                    expected: FILE_SHAPE.to_string(),
                },
            ));
        }

        if file == entry {
            return Err(ConfigError::new(
                file_field,
                ConfigErrorKind::OverwritesEntry {
                    value: authored.to_string(),
                },
            ));
        }

        if let Some(first) = outputs.iter().position(|o| o.file() == file) {
            return Err(ConfigError::new(
                file_field,
                ConfigErrorKind::Duplicate {
                    value: authored.to_string(),
                    first: format!("output[{}].file", first),
                },
            ));
        }

        let tag = output.format.trim();
        if tag.is_empty() {
            return Err(ConfigError::new(
                format_field,
                ConfigErrorKind::Missing {
                    expected: ModuleFormat::expected(),
                },
            ));
        }

        let format: ModuleFormat = tag.parse().map_err(|_| {
            ConfigError::new(
                format_field,
                ConfigErrorKind::Invalid {
                    found: tag.to_string(),
                    expected: ModuleFormat::expected(),
                },
            )
        })?;

        outputs.push(OutputTarget::new(file, format));
    }

    Ok(outputs)
}

fn resolve_plugins(raw: &[RawPlugin]) -> Result<Vec<PluginRef>, ConfigError> {
    let mut plugins: Vec<PluginRef> = Vec::with_capacity(raw.len());

    for (index, plugin) in raw.iter().enumerate() {
        let field = format!("plugins[{}]", index);
        let token = plugin.name().trim();

        if !PLUGIN_TOKEN_REGEX.is_match(token) {
            return Err(ConfigError::new(
                field,
                ConfigErrorKind::Invalid {
                    found: plugin.name().to_string(),
                    expected: PLUGIN_SHAPE.to_string(),
                },
            ));
        }

        if let Some(first) = plugins.iter().position(|p| p.token() == token) {
            return Err(ConfigError::new(
                field,
                ConfigErrorKind::Duplicate {
                    value: token.to_string(),
                    first: format!("plugins[{}]", first),
                },
            ));
        }

        plugins.push(PluginRef::new(token.to_string(), plugin.options().cloned()));
    }

    Ok(plugins)
}

fn resolve_externals(
    raw: &[String],
    input: &str,
    entry: &str,
) -> Result<Vec<ModuleName>, ConfigError> {
    let mut externals: Vec<ModuleName> = Vec::with_capacity(raw.len());

    for (index, name) in raw.iter().enumerate() {
        let field = format!("external[{}]", index);
        let name = name.trim();

        if name.is_empty() {
            return Err(ConfigError::new(
                field,
                ConfigErrorKind::Missing {
                    expected: EXTERNAL_SHAPE.to_string(),
                },
            ));
        }

        if name == input.trim() || name == entry {
            return Err(ConfigError::new(
                field,
                ConfigErrorKind::ExternalIsEntry {
                    value: name.to_string(),
                },
            ));
        }

        if !MODULE_NAME_REGEX.is_match(name) {
            return Err(ConfigError::new(
                field,
                ConfigErrorKind::Invalid {
                    found: name.to_string(),
                    expected: EXTERNAL_SHAPE.to_string(),
                },
            ));
        }

        // The exclusion list is a set: repeats collapse onto the first occurrence
        if externals.iter().any(|e| e.as_str() == name) {
            debug!("Ignoring repeated external {}", name);
            continue;
        }

        externals.push(ModuleName::new(name.to_string()));
    }

    Ok(externals)
}

/// `scheme://...` or `scheme:...` with a scheme longer than a drive letter
fn is_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|url| url.scheme().len() > 1)
        .unwrap_or(false)
}
