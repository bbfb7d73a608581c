//! Error types for configuration resolution

use thiserror::Error;

/// A configuration that does not have the required shape
///
/// `field` is a path into the authored configuration such as `input`,
/// `output[1].file` or `external[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid `{field}`: {kind}")]
pub struct ConfigError {
    pub field: String,
    pub kind: ConfigErrorKind,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, kind: ConfigErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

/// What is wrong with the offending field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigErrorKind {
    #[error("missing value, expected {expected}")]
    Missing { expected: String },

    #[error("must not be empty, expected {expected}")]
    Empty { expected: String },

    #[error("{found:?} is not valid, expected {expected}")]
    Invalid { found: String, expected: String },

    #[error("{value:?} is already declared at `{first}`")]
    Duplicate { value: String, first: String },

    #[error("{value:?} names the entry module, which is always bundled")]
    ExternalIsEntry { value: String },

    #[error("{value:?} would overwrite the entry module")]
    OverwritesEntry { value: String },
}

/// A valid configuration that cannot be executed against the package
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("entry module `{entry}` not found in {root}")]
    EntryNotFound { entry: String, root: String },

    #[error("unknown plugin `{token}` at `plugins[{index}]`")]
    UnknownPlugin { index: usize, token: String },

    #[error("plugin `{token}` at `plugins[{index}]` is the same capability as `plugins[{first}]`")]
    DuplicatePlugin {
        index: usize,
        first: usize,
        token: String,
    },
}
