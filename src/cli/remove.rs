//! The `remove` command: delete server entries from provider configs.

use super::common::print_json;
use crate::core::{Priority, Scope};
use crate::engine::TransactionalBatchInstaller;
use crate::lockstate::LockStateStore;
use crate::provider::ProviderRegistry;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args)]
pub struct RemoveCommand {
    /// Server names to remove.
    #[arg(required = true)]
    names: Vec<String>,

    /// Scope to remove from.
    #[arg(long, value_enum, default_value_t = Scope::Project)]
    scope: Scope,

    /// Only target providers at or above this priority tier.
    #[arg(long, value_enum, default_value_t = Priority::Low)]
    min_priority: Priority,

    /// Project directory for project-scope paths.
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,

    /// Emit the full batch result as JSON.
    #[arg(long)]
    json: bool,
}

impl RemoveCommand {
    pub async fn execute(self) -> Result<()> {
        let registry = ProviderRegistry::new()?;
        let lock_state = LockStateStore::open_default()?;

        let result = TransactionalBatchInstaller::new(&registry)
            .with_lock_state(&lock_state)
            .remove_with_rollback(
                registry.all(),
                &self.names,
                self.scope,
                self.min_priority,
                &self.project_dir,
            )
            .await?;

        if self.json {
            print_json(&result)?;
        } else if result.applied_count == 0 {
            println!("Nothing to remove");
        } else {
            for outcome in &result.outcomes {
                let status = if outcome.success { "removed".green() } else { "failed".red() };
                println!("{status} {} / {}", outcome.provider_id, outcome.server_name);
            }
        }

        if result.success {
            Ok(())
        } else {
            Err(anyhow::anyhow!("remove batch failed; touched files were rolled back"))
        }
    }
}
