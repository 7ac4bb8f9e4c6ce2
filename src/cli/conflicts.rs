//! The `conflicts` command: dry-run conflict detection.

use super::common::{load_mutations, print_json};
use crate::core::Priority;
use crate::engine::ConflictDetector;
use crate::provider::{Provider, ProviderRegistry, select_by_minimum_priority};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args)]
pub struct ConflictsCommand {
    /// JSON file holding the mutation batch to check.
    #[arg(long)]
    mutations: PathBuf,

    /// Only check providers at or above this priority tier.
    #[arg(long, value_enum, default_value_t = Priority::Low)]
    min_priority: Priority,

    /// Project directory for project-scope paths.
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,

    /// Emit machine-readable JSON instead of a table.
    #[arg(long)]
    json: bool,
}

impl ConflictsCommand {
    pub fn execute(self) -> Result<()> {
        let mutations = load_mutations(&self.mutations)?;
        let registry = ProviderRegistry::new()?;
        let targets: Vec<&Provider> = select_by_minimum_priority(registry.all(), self.min_priority);

        let conflicts =
            ConflictDetector::new(&registry).detect(&targets, &mutations, &self.project_dir)?;

        if self.json {
            return print_json(&conflicts);
        }

        if conflicts.is_empty() {
            println!("{}", "No conflicts detected".green());
            return Ok(());
        }

        for conflict in &conflicts {
            println!(
                "{} {} / {}: {}",
                "conflict".yellow().bold(),
                conflict.provider_id,
                conflict.server_name,
                conflict.detail
            );
        }
        println!("\n{} conflict(s) detected", conflicts.len());
        Ok(())
    }
}
