//! The `install` command: apply a mutation batch transactionally.

use super::common::{load_mutations, print_json};
use crate::core::{ConflictPolicy, Priority};
use crate::engine::{InstallOptions, TransactionalBatchInstaller};
use crate::lockstate::LockStateStore;
use crate::provider::ProviderRegistry;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args)]
pub struct InstallCommand {
    /// JSON file holding the mutation batch to apply.
    #[arg(long)]
    mutations: PathBuf,

    /// How to resolve detected conflicts.
    #[arg(long, value_enum, default_value_t = ConflictPolicy::Fail)]
    policy: ConflictPolicy,

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

impl InstallCommand {
    pub async fn execute(self) -> Result<()> {
        let mutations = load_mutations(&self.mutations)?;
        let registry = ProviderRegistry::new()?;
        let lock_state = LockStateStore::open_default()?;

        let options =
            InstallOptions { minimum_priority: self.min_priority, policy: self.policy };
        let result = TransactionalBatchInstaller::new(&registry)
            .with_lock_state(&lock_state)
            .install_with_rollback(registry.all(), &mutations, &options, &self.project_dir)
            .await?;

        if self.json {
            print_json(&result)?;
        } else {
            for outcome in &result.outcomes {
                let status = if outcome.success { "ok".green() } else { "failed".red() };
                print!("{status} {} / {} ({})", outcome.provider_id, outcome.server_name, outcome.scope);
                match &outcome.error {
                    Some(error) => println!(": {error}"),
                    None => println!(),
                }
            }
            for skipped in &result.skipped {
                println!(
                    "{} {} / {} ({} conflict(s))",
                    "skipped".yellow(),
                    skipped.provider_id,
                    skipped.server_name,
                    skipped.conflicts.len()
                );
            }
            if result.rollback_performed {
                println!("{}", "Batch failed; all files restored".red().bold());
            }
        }

        if result.success {
            Ok(())
        } else {
            let mut message = String::from("install batch failed");
            if result.rollback_performed {
                message.push_str("; all touched files were rolled back");
            }
            if !result.rollback_errors.is_empty() {
                message.push_str(&format!(
                    " ({} file(s) could not be restored)",
                    result.rollback_errors.len()
                ));
            }
            Err(anyhow::anyhow!(message))
        }
    }
}
