//! bundlespec library
//!
//! Resolves per-package bundler configurations into validated build plans.

pub mod cli;
pub mod config;
pub mod plan;
pub mod plugins;
pub mod resolver;
pub mod spec;
pub mod utils;
pub mod workspace;

pub use cli::Cli;
pub use resolver::{resolve, ConfigError, ResolutionError};
pub use spec::BuildSpec;
