//! bundlespec - validate bundler configurations and emit build plans
//!
//! Reads `bundle.toml` / `bundle.json` package configurations, checks them,
//! and hands normalized build plans to an external bundling engine.
//!
//! # Features
//! - TOML and JSON package configurations
//! - Strict validation with field-level error messages
//! - Concurrent resolution of every package in a workspace
//! - JSON plan output for out-of-process bundlers

use anyhow::Result;
use bundlespec_lib::Cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("bundlespec=debug,bundlespec_lib=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("bundlespec=info,bundlespec_lib=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    cli.execute().await
}
