//! mcpsync CLI entry point
//!
//! Parses command-line arguments, executes the selected command, and turns
//! failures into user-friendly error output with suggestions.

use anyhow::Result;
use clap::Parser;
use mcpsync::cli;
use mcpsync::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
