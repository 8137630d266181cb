//! Resolver configuration.
//!
//! A site may carry a `stitch.toml` next to its documents:
//!
//! ```toml
//! # Root for bare include paths such as include("nav.html")
//! includes_root = "_includes"
//! # Root for layout references in frontmatter
//! layouts_root = "_layouts"
//! # "shallow" replaces caller keys, "deep" merges nested objects
//! merge = "shallow"
//! # "error" renders an inline marker for missing includes, "empty" renders nothing
//! missing = "error"
//! ```
//!
//! Every key is optional and a missing file yields [`ResolveConfig::default`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use stitch_cli::config::ResolveConfig;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ResolveConfig::load_or_default(Path::new("site")).await?;
//! println!("includes live in {}", config.includes_root);
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::constants::{CONFIG_FILE_NAME, DEFAULT_INCLUDES_ROOT, DEFAULT_LAYOUTS_ROOT};

pub use crate::resolver::merge::MergePolicy;

/// What a missing include or layout turns into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// An inline `resource not found` marker.
    #[default]
    Error,
    /// Nothing; a missing layout leaves the body unwrapped.
    Empty,
}

/// Settings the resolver consults while walking a document graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolveConfig {
    pub includes_root: String,
    pub layouts_root: String,
    pub merge: MergePolicy,
    pub missing: MissingPolicy,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            includes_root: DEFAULT_INCLUDES_ROOT.to_string(),
            layouts_root: DEFAULT_LAYOUTS_ROOT.to_string(),
            merge: MergePolicy::default(),
            missing: MissingPolicy::default(),
        }
    }
}

impl ResolveConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse resolver configuration")
    }

    /// Load configuration from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load `<dir>/stitch.toml`, or the defaults when it does not exist.
    pub async fn load_or_default(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        let exists = fs::try_exists(&path)
            .await
            .with_context(|| format!("Failed to check for config at {}", path.display()))?;
        if exists {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }
}
