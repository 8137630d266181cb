//! Document sources.
//!
//! The resolver never touches storage directly. It asks a [`Source`] for the
//! raw text behind a path identifier and gets back either the text, `None`
//! when nothing lives at that path, or an error when the lookup itself failed.
//!
//! - [`MemorySource`] keeps documents in a map, handy for tests and embedding.
//! - [`FsSource`] reads files below a root directory with `tokio::fs`.
//!
//! Path identifiers are forward-slash strings relative to the source root
//! (a leading `/` is tolerated). Both sources normalise them before lookup.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use tracing::debug;

use crate::resolver::paths::normalize;

/// Fetches the raw text of a document by path identifier.
pub trait Source: Send + Sync {
    /// Load `path`. `Ok(None)` means the resource does not exist.
    fn fetch<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<String>>>;
}

/// An in-memory source.
///
/// ```rust
/// use stitch_cli::source::MemorySource;
///
/// let source = MemorySource::new()
///     .with("index.html", "<h1>{{ title }}</h1>")
///     .with("./_includes/nav.html", "<nav></nav>");
/// assert!(source.contains("_includes/nav.html"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, path: &str, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: &str, content: impl Into<String>) {
        self.documents.insert(normalize(path), content.into());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.documents.contains_key(&normalize(path))
    }
}

impl Source for MemorySource {
    fn fetch<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
        Box::pin(async move { Ok(self.documents.get(&normalize(path)).cloned()) })
    }
}

/// A source backed by files below `root`.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a path identifier onto a file below the root.
    ///
    /// Identifiers that normalise to somewhere above the root are rejected.
    fn file_path(&self, path: &str) -> Result<PathBuf> {
        let normalized = normalize(path);
        let relative = Path::new(&normalized);
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            anyhow::bail!("path '{}' escapes the source root {}", path, self.root.display());
        }
        Ok(self.root.join(relative))
    }
}

impl Source for FsSource {
    fn fetch<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
        Box::pin(async move {
            let file = self.file_path(path)?;
            debug!("Reading {}", file.display());
            match tokio::fs::read_to_string(&file).await {
                Ok(content) => Ok(Some(content)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => {
                    Err(e).with_context(|| format!("Failed to read file: {}", file.display()))
                }
            }
        })
    }
}
