//! Check command implementation

use std::time::Instant;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::{report, TargetArgs};
use crate::utils::format_duration;

/// Validate package configurations without emitting anything
#[derive(Args, Debug)]
pub struct CheckCommand {
    #[command(flatten)]
    pub target: TargetArgs,
}

impl CheckCommand {
    pub async fn execute(&self) -> Result<()> {
        let start = Instant::now();

        eprintln!("{} Checking package configurations...", "→".blue());

        let outcomes = self.target.resolve().await?;
        let failed = report(&outcomes);

        if failed > 0 {
            anyhow::bail!("{} of {} package(s) failed", failed, outcomes.len());
        }

        eprintln!(
            "\n{} {} package(s) valid in {}\n",
            "✓".green().bold(),
            outcomes.len(),
            format_duration(start.elapsed())
        );

        Ok(())
    }
}
