//! stitch CLI entry point
//!
//! Parses arguments, runs the command and reports failures on stderr.

use anyhow::Result;
use clap::Parser;
use stitch_cli::cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            cli::display_error(&e);
            std::process::exit(1);
        }
    }
}
