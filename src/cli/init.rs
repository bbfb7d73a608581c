//! Package initialization command

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;

use crate::config::{self, RawConfig, RawOutput, RawOutputs, RawPlugin};
use crate::resolver::resolve;

/// Create a package configuration
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Package directory
    #[arg(default_value = ".")]
    pub dir: String,

    /// Package name used for output file names (defaults to the directory name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Configuration file syntax
    #[arg(short, long, value_enum, default_value_t = InitFormat::Toml)]
    pub format: InitFormat,

    /// Module left out of the bundle (repeatable)
    #[arg(short, long = "external", value_name = "MODULE")]
    pub externals: Vec<String>,

    /// Overwrite an existing configuration
    #[arg(long)]
    pub force: bool,
}

/// Syntax of the generated configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InitFormat {
    Toml,
    Json,
}

impl InitFormat {
    fn file_name(&self) -> &'static str {
        match self {
            InitFormat::Toml => "bundle.toml",
            InitFormat::Json => "bundle.json",
        }
    }
}

impl InitCommand {
    pub async fn execute(&self) -> Result<()> {
        let package_dir = Path::new(&self.dir);

        if let Some(existing) = config::find_config_file(package_dir) {
            if !self.force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    existing.display()
                );
            }
        }

        fs::create_dir_all(package_dir).context("Failed to create package directory")?;

        let name = match &self.name {
            Some(name) => name.clone(),
            None => {
                let absolute = std::env::current_dir()?.join(package_dir);
                config::package_name(&fs::canonicalize(&absolute).unwrap_or(absolute))
            }
        };

        eprintln!("{} Initializing package {}...\n", "→".blue(), name.cyan());

        let raw = self.generate_config(&name);
        resolve(&raw).context("Generated configuration is invalid")?;

        let content = match self.format {
            InitFormat::Toml => toml::to_string_pretty(&raw)?,
            InitFormat::Json => serde_json::to_string_pretty(&raw)? + "\n",
        };

        let file_name = self.format.file_name();
        fs::write(package_dir.join(file_name), content)
            .with_context(|| format!("Failed to write {}", file_name))?;
        eprintln!("  {} Created {}", "✓".green(), file_name.cyan());

        // A leftover config in the other syntax would shadow the new one
        for stale in config::CONFIG_FILE_NAMES.iter().filter(|name| **name != file_name) {
            let path = package_dir.join(stale);
            if path.is_file() {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
                eprintln!("  {} Removed {}", "✓".green(), stale.cyan());
            }
        }

        let entry = package_dir.join(&raw.input);
        if !entry.exists() {
            if let Some(parent) = entry.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&entry, "export {};\n").context("Failed to write entry module")?;
            eprintln!("  {} Created {}", "✓".green(), raw.input.cyan());
        }

        eprintln!("\n{} Package initialized\n", "✓".green().bold());

        Ok(())
    }

    fn generate_config(&self, name: &str) -> RawConfig {
        let stem = name.trim_start_matches('@').replace('/', "-");

        RawConfig {
            input: "src/index.js".to_string(),
            output: RawOutputs::Many(vec![
                RawOutput {
                    file: format!("dist/{}.cjs", stem),
                    format: "cjs".to_string(),
                },
                RawOutput {
                    file: format!("dist/{}.mjs", stem),
                    format: "es".to_string(),
                },
            ]),
            plugins: vec![
                RawPlugin::Token("resolve".to_string()),
                RawPlugin::Token("commonjs".to_string()),
            ],
            external: self.externals.clone(),
        }
    }
}
