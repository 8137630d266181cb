//! Recursive document resolution.
//!
//! The [`Resolver`] ties every other module together. For each document it
//!
//! 1. extracts the frontmatter and merges it over the caller's data,
//! 2. binds an `include(path, data?)` function into that data,
//! 3. runs the preprocessor selected for the document's path,
//! 4. renders the placeholders with the effective filter registry,
//! 5. wraps the result in the layout named by the frontmatter, if any.
//!
//! Includes and layouts recurse through the same steps. Every recursive call
//! carries a [`ResolutionStack`] of the paths currently being resolved on
//! that branch; re-entering one of them is a cycle. An include cycle only
//! collapses the include call site to an inline marker, while a layout cycle
//! turns the whole document into the marker since the layout wraps all of it.
//!
//! # Examples
//!
//! ```rust
//! use stitch_cli::expression::Map;
//! use stitch_cli::resolver::Resolver;
//! use stitch_cli::source::MemorySource;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let source = MemorySource::new()
//!     .with("index.html", "---\ntitle: Hello\nlayout: base\n---\n<h1>{{ title }}</h1>")
//!     .with("_layouts/base.html", "<body>{{ content | safe }}</body>");
//!
//! let resolver = Resolver::new(source);
//! let html = resolver.resolve_path("index.html", Map::new()).await?;
//! assert_eq!(html, "<body><h1>Hello</h1></body>");
//! # Ok(())
//! # }
//! ```

pub mod merge;
pub mod paths;

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::config::{MissingPolicy, ResolveConfig};
use crate::constants::{INCLUDE_HELPER, LAYOUT_CONTENT_KEY, LAYOUT_KEY};
use crate::core::{Result, TemplateError};
use crate::expression::{Map, Value};
use crate::filters::FilterRegistry;
use crate::frontmatter::{self, Frontmatter};
use crate::preprocess::PreprocessorSet;
use crate::source::Source;
use crate::templating;
use merge::merge;

/// The paths being resolved on one branch of the document graph.
///
/// Pushing returns a new stack and leaves the original untouched, so sibling
/// includes never see each other's frames.
#[derive(Clone, Default)]
pub struct ResolutionStack {
    top: Option<Arc<Frame>>,
}

struct Frame {
    path: String,
    below: Option<Arc<Frame>>,
}

impl ResolutionStack {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn push(&self, path: &str) -> Self {
        Self {
            top: Some(Arc::new(Frame {
                path: path.to_string(),
                below: self.top.clone(),
            })),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.frames().any(|frame| frame.path == path)
    }

    pub fn depth(&self) -> usize {
        self.frames().count()
    }

    /// Paths from the outermost document to the innermost.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.frames().map(|f| f.path.as_str()).collect();
        paths.reverse();
        paths
    }

    fn frames(&self) -> impl Iterator<Item = &Frame> {
        std::iter::successors(self.top.as_deref(), |frame| frame.below.as_deref())
    }
}

impl fmt::Debug for ResolutionStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.paths()).finish()
    }
}

/// Resolves documents fetched from a [`Source`].
///
/// Cloning is cheap; clones share the source, filters and configuration.
#[derive(Clone)]
pub struct Resolver {
    source: Arc<dyn Source>,
    filters: Arc<FilterRegistry>,
    preprocessors: PreprocessorSet,
    config: Arc<ResolveConfig>,
}

impl Resolver {
    /// A resolver with the built-in filters, the default preprocessors and
    /// the default configuration.
    pub fn new(source: impl Source + 'static) -> Self {
        Self::from_shared(Arc::new(source))
    }

    pub fn from_shared(source: Arc<dyn Source>) -> Self {
        Self {
            source,
            filters: Arc::new(FilterRegistry::builtin()),
            preprocessors: PreprocessorSet::default(),
            config: Arc::new(ResolveConfig::default()),
        }
    }

    /// Add caller filters on top of the built-in ones; same-named caller
    /// filters win.
    #[must_use]
    pub fn with_filters(mut self, filters: &FilterRegistry) -> Self {
        self.filters = Arc::new(FilterRegistry::builtin().merged(filters));
        self
    }

    #[must_use]
    pub fn with_preprocessors(mut self, preprocessors: PreprocessorSet) -> Self {
        self.preprocessors = preprocessors;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: ResolveConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }

    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    pub fn preprocessors(&self) -> &PreprocessorSet {
        &self.preprocessors
    }

    /// Extension of the output `path` resolves to, without resolving it.
    pub fn output_extension(&self, path: &str) -> String {
        self.preprocessors.predicted_extension(path)
    }

    /// Resolve `content` as if it lived at `path`.
    ///
    /// Never fails: every problem is rendered as an inline error marker, and a
    /// layout cycle makes the whole result a single marker.
    pub async fn resolve(&self, content: &str, path: &str, data: Map) -> String {
        let path = paths::normalize(path);
        let stack = ResolutionStack::new().push(&path);
        match self.resolve_in(content.to_string(), path.clone(), data, stack).await {
            Ok(output) => output,
            Err(err) if err.is_cyclic() => {
                warn!("Layout cycle while resolving {}, replacing the document", path);
                err.marker()
            }
            Err(err) => {
                warn!("Resolution failed: {}", err);
                err.marker()
            }
        }
    }

    /// Fetch `path` from the source and resolve it.
    ///
    /// Only the top-level fetch can fail; everything below it is contained
    /// in the output.
    pub async fn resolve_path(&self, path: &str, data: Map) -> Result<String> {
        let path = paths::normalize(path);
        let content = self.fetch(&path).await?.ok_or_else(|| TemplateError::MissingResource {
            path: path.clone(),
        })?;
        Ok(self.resolve(&content, &path, data).await)
    }

    async fn fetch(&self, path: &str) -> Result<Option<String>> {
        self.source.fetch(path).await.map_err(|e| TemplateError::Source {
            path: path.to_string(),
            message: format!("{e:#}"),
        })
    }

    fn resolve_in(
        &self,
        content: String,
        path: String,
        data: Map,
        stack: ResolutionStack,
    ) -> BoxFuture<'static, Result<String>> {
        let resolver = self.clone();
        Box::pin(async move {
            debug!("Resolving {} (depth {})", path, stack.depth());
            let Frontmatter { metadata, body } = frontmatter::extract(&content);
            let layout = metadata.get(LAYOUT_KEY).cloned();

            let mut merged = merge(&data, metadata, resolver.config.merge);
            merged.remove(INCLUDE_HELPER);
            let include = resolver.include_function(&path, &merged, &stack);
            merged.insert(INCLUDE_HELPER.to_string(), include);

            let processed = resolver.preprocess(&path, &body, &merged).await;
            let rendered = templating::render(&processed, &merged, &resolver.filters).await;

            match layout {
                Some(layout) => resolver.wrap_in_layout(&layout, &path, merged, rendered, &stack).await,
                None => Ok(rendered),
            }
        })
    }

    async fn preprocess(&self, path: &str, body: &str, data: &Map) -> String {
        let Some(preprocessor) = self.preprocessors.select(path) else {
            return body.to_string();
        };
        debug!("Preprocessing {} with '{}'", path, preprocessor.name());
        match preprocessor.process(body, data).await {
            Ok(processed) => processed,
            Err(err) => {
                warn!("Preprocessing {} failed: {}", path, err);
                err.marker()
            }
        }
    }

    /// The `include(path, data?)` function bound into the data of the
    /// document at `current`.
    fn include_function(&self, current: &str, data: &Map, stack: &ResolutionStack) -> Value {
        let resolver = self.clone();
        let current = current.to_string();
        let data = data.clone();
        let stack = stack.clone();
        Value::function(INCLUDE_HELPER, move |args| {
            let target = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| TemplateError::expression("include expects a path"))?;
            let path = paths::resolve_include(&current, target, &resolver.config.includes_root);
            if stack.contains(&path) {
                warn!("Cyclic include of {} from {}", path, current);
                return Err(TemplateError::CyclicDependency { path });
            }

            let extra = match args.get(1) {
                None => Map::new(),
                Some(value) if value.is_nullish() => Map::new(),
                Some(value) => value.as_object().cloned().ok_or_else(|| {
                    TemplateError::expression(format!(
                        "include data must be an object, got {}",
                        value.type_name()
                    ))
                })?,
            };
            let data = merge(&data, extra, resolver.config.merge);
            let stack = stack.push(&path);
            Ok(Value::pending(resolver.clone().include(path, data, stack)))
        })
    }

    async fn include(self, path: String, data: Map, stack: ResolutionStack) -> Result<Value> {
        debug!("Including {}", path);
        match self.fetch(&path).await? {
            Some(content) => Ok(Value::from(self.resolve_in(content, path, data, stack).await?)),
            None => match self.config.missing {
                MissingPolicy::Error => Err(TemplateError::MissingResource { path }),
                MissingPolicy::Empty => {
                    debug!("Include {} not found, rendering nothing", path);
                    Ok(Value::from(""))
                }
            },
        }
    }

    async fn wrap_in_layout(
        &self,
        layout: &Value,
        path: &str,
        mut data: Map,
        rendered: String,
        stack: &ResolutionStack,
    ) -> Result<String> {
        let reference = match layout.as_str().map(str::trim) {
            Some(reference) if !reference.is_empty() => reference,
            Some(_) => return Ok(rendered),
            None => {
                if !layout.is_nullish() {
                    warn!("Ignoring {} layout reference in {}", layout.type_name(), path);
                }
                return Ok(rendered);
            }
        };

        let extension = self.preprocessors.predicted_extension(path);
        let layout_path = paths::resolve_layout(reference, &self.config.layouts_root, &extension);
        if stack.contains(&layout_path) {
            warn!("Cyclic layout {} in {}", layout_path, path);
            return Err(TemplateError::CyclicDependency { path: layout_path });
        }

        let content = match self.fetch(&layout_path).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                let err = TemplateError::MissingResource { path: layout_path };
                return Ok(match self.config.missing {
                    MissingPolicy::Error => self.unwrapped(&err, rendered),
                    MissingPolicy::Empty => rendered,
                });
            }
            Err(err) => return Ok(self.unwrapped(&err, rendered)),
        };

        debug!("Wrapping {} in {}", path, layout_path);
        data.insert(LAYOUT_CONTENT_KEY.to_string(), Value::safe(rendered));
        let stack = stack.push(&layout_path);
        self.resolve_in(content, layout_path, data, stack).await
    }

    /// The body with a marker in front, for a layout that could not be loaded.
    fn unwrapped(&self, err: &TemplateError, rendered: String) -> String {
        warn!("Layout not applied: {}", err);
        let mut out = err.marker();
        out.push_str(&rendered);
        out
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("filters", &self.filters)
            .field("preprocessors", &self.preprocessors)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
