//! Command-line interface for bundlespec
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `check`: Validate package configurations
//! - `plan`: Emit normalized build plans for the bundler
//! - `init`: Scaffold a package configuration

mod check;
mod init;
mod plan;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use crate::plugins::PluginRegistry;
use crate::utils::relative_path;
use crate::workspace::{PackageOutcome, Workspace, DEFAULT_PATTERNS};

pub use check::CheckCommand;
pub use init::{InitCommand, InitFormat};
pub use plan::PlanCommand;

/// Validate per-package bundler configurations and emit normalized build plans
#[derive(Parser, Debug)]
#[command(name = "bundlespec")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate package configurations without emitting anything
    Check(CheckCommand),

    /// Resolve package configurations into build plans
    Plan(PlanCommand),

    /// Create a package configuration
    Init(InitCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Check(cmd) => cmd.execute().await,
            Commands::Plan(cmd) => cmd.execute().await,
            Commands::Init(cmd) => cmd.execute().await,
        }
    }
}

/// Which packages a command operates on
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Config files or package directories (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Discover every package under this workspace root
    #[arg(short, long, value_name = "DIR", conflicts_with = "paths")]
    pub workspace: Option<PathBuf>,

    /// Package directory glob, relative to the workspace root (repeatable)
    #[arg(long = "pattern", value_name = "GLOB", requires = "workspace")]
    pub patterns: Vec<String>,
}

impl TargetArgs {
    /// Build the workspace these arguments describe
    pub fn workspace(&self) -> Result<Workspace> {
        if let Some(root) = &self.workspace {
            let patterns = if self.patterns.is_empty() {
                DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()
            } else {
                self.patterns.clone()
            };
            info!("Discovering packages under {}", root.display());
            return Workspace::discover(root, &patterns);
        }

        if self.paths.is_empty() {
            Ok(Workspace::from_paths(vec![PathBuf::from(".")]))
        } else {
            Ok(Workspace::from_paths(self.paths.clone()))
        }
    }

    /// Resolve every targeted package against the built-in plugin registry
    pub async fn resolve(&self) -> Result<Vec<PackageOutcome>> {
        let workspace = self.workspace()?;
        if workspace.is_empty() {
            anyhow::bail!("No package configurations found");
        }
        workspace
            .resolve_all(Arc::new(PluginRegistry::with_builtins()))
            .await
    }
}

/// Print one status line per package, returning how many failed
fn report(outcomes: &[PackageOutcome]) -> usize {
    let cwd = std::env::current_dir().ok();
    let mut failed = 0;

    for outcome in outcomes {
        let location = cwd
            .as_deref()
            .and_then(|cwd| relative_path(cwd, &outcome.config_path))
            .unwrap_or_else(|| outcome.config_path.display().to_string());

        match &outcome.result {
            Ok(bound) => {
                let spec = bound.spec();
                let formats: Vec<&str> = spec.outputs().iter().map(|o| o.format().tag()).collect();
                eprintln!(
                    "  {} {} {} {}",
                    "✓".green(),
                    outcome.package.bold(),
                    format!("[{}]", formats.join(", ")).cyan(),
                    location.dimmed()
                );
            }
            Err(err) => {
                failed += 1;
                eprintln!(
                    "  {} {} {}\n      {}",
                    "✗".red(),
                    outcome.package.bold(),
                    location.dimmed(),
                    err.to_string().red()
                );
            }
        }
    }

    failed
}
