//! The `lock` command: inspect the persisted lock state.

use super::common::print_json;
use crate::lockstate::LockStateStore;
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

#[derive(Args)]
pub struct LockCommand {
    #[command(subcommand)]
    command: LockSubcommand,
}

#[derive(Subcommand)]
enum LockSubcommand {
    /// Print the lock state.
    Show {
        /// Emit raw JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },
}

impl LockCommand {
    pub fn execute(self) -> Result<()> {
        let store = LockStateStore::open_default()?;
        match self.command {
            LockSubcommand::Show { json } => {
                let state = store.read();
                if json {
                    return print_json(&state);
                }

                println!("{}: {}", "lock file".bold(), store.path().display());
                if state.mcp_servers.is_empty() {
                    println!("No MCP servers recorded");
                } else {
                    for (name, entry) in &state.mcp_servers {
                        println!(
                            "{:<16} {:<8} agents: {}",
                            name.bold(),
                            if entry.global { "global" } else { "project" },
                            entry.agents.join(", ")
                        );
                    }
                }
                if !state.skills.is_empty() {
                    println!("\n{} skill(s) recorded", state.skills.len());
                }
                Ok(())
            }
        }
    }
}
