//! The `providers` command: list known providers.

use super::common::print_json;
use crate::core::Priority;
use crate::provider::{ProviderRegistry, select_by_minimum_priority};
use anyhow::Result;
use clap::Args;
use colored::Colorize;

#[derive(Args)]
pub struct ProvidersCommand {
    /// Only show providers at or above this priority tier.
    #[arg(long, value_enum, default_value_t = Priority::Low)]
    min_priority: Priority,

    /// Emit machine-readable JSON instead of a table.
    #[arg(long)]
    json: bool,
}

impl ProvidersCommand {
    pub fn execute(self) -> Result<()> {
        let registry = ProviderRegistry::new()?;
        let selected = select_by_minimum_priority(registry.all(), self.min_priority);

        if self.json {
            return print_json(&selected);
        }

        for provider in selected {
            let transports: Vec<&str> =
                provider.supported_transports.iter().map(|t| t.as_str()).collect();
            println!(
                "{:<12} {:<8} {:<18} {:<10} {}",
                provider.id.bold(),
                provider.priority,
                provider.format,
                format!("{:?}", provider.status).to_lowercase(),
                transports.join(",")
            );
        }
        Ok(())
    }
}
