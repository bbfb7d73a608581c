//! Plan command implementation

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;

use super::{report, TargetArgs};
use crate::plan::JsonPlanWriter;
use crate::utils::format_duration;

/// Resolve package configurations into build plans
#[derive(Args, Debug)]
pub struct PlanCommand {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Write one `<package>.plan.json` per package here instead of printing to stdout
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Pretty-print JSON
    #[arg(long)]
    pub pretty: bool,
}

impl PlanCommand {
    pub async fn execute(&self) -> Result<()> {
        let start = Instant::now();

        let outcomes = self.target.resolve().await?;
        let failed = report(&outcomes);
        let bound: Vec<_> = outcomes.iter().filter_map(|o| o.result.as_ref().ok()).collect();

        match &self.out {
            Some(out_dir) => {
                let writer = JsonPlanWriter::new(out_dir, self.pretty);
                for path in writer.write_all(&bound).await? {
                    eprintln!("  {} {}", "•".dimmed(), path.display().to_string().cyan());
                }
            }
            None => {
                let documents: Vec<_> = bound.iter().map(|plan| plan.document()).collect();
                let json = if self.pretty {
                    serde_json::to_string_pretty(&documents)?
                } else {
                    serde_json::to_string(&documents)?
                };
                println!("{}", json);
            }
        }

        info!("Planned {} package(s) in {}", bound.len(), format_duration(start.elapsed()));

        if failed > 0 {
            anyhow::bail!("{} of {} package(s) failed", failed, outcomes.len());
        }

        eprintln!(
            "\n{} Planned {} package(s) in {}\n",
            "✓".green().bold(),
            bound.len(),
            format_duration(start.elapsed())
        );

        Ok(())
    }
}
