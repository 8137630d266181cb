//! The `render` command.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::ResolveConfig;
use crate::expression::{Map, Value};
use crate::resolver::Resolver;
use crate::source::FsSource;

#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Document to render, relative to the root directory.
    file: String,

    /// Site root that include and layout paths are resolved against.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// JSON object passed to the document as data.
    #[arg(long)]
    data: Option<String>,

    /// Resolver configuration file (defaults to `<root>/stitch.toml`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the output here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl RenderCommand {
    pub async fn execute(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => ResolveConfig::load_from(path).await?,
            None => ResolveConfig::load_or_default(&self.root).await?,
        };
        debug!("Using {:?}", config);
        let data = parse_data(self.data.as_deref())?;

        let resolver = Resolver::new(FsSource::new(&self.root)).with_config(config);
        let output = resolver
            .resolve_path(&self.file, data)
            .await
            .with_context(|| format!("Failed to render {}", self.file))?;

        match &self.output {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
                }
                tokio::fs::write(path, output)
                    .await
                    .with_context(|| format!("Failed to write output to {}", path.display()))?;
            }
            None => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(output.as_bytes()).await?;
                stdout.flush().await?;
            }
        }
        Ok(())
    }
}

fn parse_data(data: Option<&str>) -> Result<Map> {
    let Some(data) = data else {
        return Ok(Map::new());
    };
    let json: serde_json::Value =
        serde_json::from_str(data).context("Failed to parse --data as JSON")?;
    match Value::from(json) {
        Value::Object(map) => Ok(map),
        other => bail!("--data must be a JSON object, got {}", other.type_name()),
    }
}
