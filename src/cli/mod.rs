//! Command-line interface for stitch.
//!
//! # Available Commands
//!
//! - `render` - Resolve a document (frontmatter, includes, layouts, filters)
//!   and write the result
//! - `ext` - Print the extension a document's output will have
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug logging
//! - `--quiet` - Only log errors
//!
//! Without either flag the log level comes from `RUST_LOG`, defaulting to
//! `warn` so every inline error marker is also reported on stderr.
//!
//! # Example
//!
//! ```bash
//! # Render a page of a site rooted in ./site
//! stitch render index.html --root site -o public/index.html
//!
//! # Provide data to the top-level document
//! stitch render post.md --data '{"author": "Ada"}'
//!
//! # Where will post.md end up?
//! stitch ext post.md   # prints ".html"
//! ```

mod ext;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use crate::core::TemplateError;

/// Logging configuration derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Explicit log level; `None` defers to `RUST_LOG`.
    pub log_level: Option<String>,
}

impl CliConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// Calling this more than once is harmless; later calls are ignored.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Recursive template resolver.
#[derive(Parser)]
#[command(
    name = "stitch",
    about = "Resolve templates with frontmatter, includes, layouts and filter chains",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a document and write the output.
    Render(render::RenderCommand),

    /// Print the predicted output extension of a document.
    Ext(ext::ExtCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };
        CliConfig { log_level }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Render(cmd) => cmd.execute().await,
            Commands::Ext(cmd) => cmd.execute(),
        }
    }
}

/// Print an error chain to stderr the way the binary reports failures.
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{}: {}", "error".red().bold(), error);
    for cause in error.chain().skip(1) {
        eprintln!("{}: {}", "caused by".yellow(), cause);
    }
    if let Some(TemplateError::MissingResource { .. }) = error.downcast_ref::<TemplateError>() {
        eprintln!("{}: check the path and the --root directory", "suggestion".green());
    }
}
