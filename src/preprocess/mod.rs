//! Content preprocessors.
//!
//! A [`Preprocessor`] turns a source format into text the rendering engine
//! consumes: it claims paths through a [`PathMatcher`], declares the extension
//! of the file it produces and transforms content asynchronously. Transforms
//! may call back into the resolver through the `include` function bound in the
//! document data, which is the same function placeholders call, so cycle
//! detection covers both.
//!
//! A [`PreprocessorSet`] is an ordered list; dispatch picks the first
//! preprocessor whose matcher accepts the path. The default set is
//! `html`, `css`, `markdown`.

pub mod css;
pub mod html;
pub mod markdown;

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use regex::Regex;

use crate::constants::INCLUDE_HELPER;
use crate::core::{Result, TemplateError};
use crate::expression::{Map, Value};

pub use css::CssPreprocessor;
pub use html::HtmlPreprocessor;
pub use markdown::MarkdownPreprocessor;

/// Decides which paths a preprocessor claims.
#[derive(Debug, Clone)]
pub enum PathMatcher {
    /// Matches paths ending with any of the suffixes.
    Suffix(Vec<String>),
    /// Matches paths the regular expression finds a match in.
    Pattern(Regex),
}

impl PathMatcher {
    pub fn suffix(suffix: impl Into<String>) -> Self {
        Self::Suffix(vec![suffix.into()])
    }

    pub fn suffixes<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Suffix(suffixes.into_iter().map(Into::into).collect())
    }

    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern).map(Self::Pattern).map_err(|e| TemplateError::Preprocess {
            preprocessor: "matcher".to_string(),
            message: e.to_string(),
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Suffix(suffixes) => suffixes.iter().any(|s| path.ends_with(s.as_str())),
            Self::Pattern(re) => re.is_match(path),
        }
    }
}

/// A pluggable, path-matched content transform.
pub trait Preprocessor: Send + Sync {
    fn name(&self) -> &str;

    fn matcher(&self) -> &PathMatcher;

    /// Extension (with leading dot) of the output this preprocessor produces.
    fn output_extension(&self) -> &str;

    /// Transform `content`; `data` is the document's merged data, including
    /// the bound `include` function.
    fn process<'a>(&'a self, content: &'a str, data: &'a Map) -> BoxFuture<'a, Result<String>>;

    fn matches(&self, path: &str) -> bool {
        self.matcher().matches(path)
    }
}

/// Ordered preprocessor list used for dispatch.
#[derive(Clone)]
pub struct PreprocessorSet {
    preprocessors: Vec<Arc<dyn Preprocessor>>,
}

impl PreprocessorSet {
    /// A set with no preprocessors; every document passes through unchanged.
    pub fn empty() -> Self {
        Self {
            preprocessors: Vec::new(),
        }
    }

    /// Append `preprocessor`; earlier entries take precedence.
    pub fn with(mut self, preprocessor: impl Preprocessor + 'static) -> Self {
        self.preprocessors.push(Arc::new(preprocessor));
        self
    }

    /// Insert `preprocessor` ahead of every existing entry.
    pub fn with_first(mut self, preprocessor: impl Preprocessor + 'static) -> Self {
        self.preprocessors.insert(0, Arc::new(preprocessor));
        self
    }

    /// The preprocessor dispatch picks for `path`.
    pub fn select(&self, path: &str) -> Option<&Arc<dyn Preprocessor>> {
        self.preprocessors.iter().find(|p| p.matches(path))
    }

    /// The extension the output for `path` will have, without running anything.
    ///
    /// This is the selected preprocessor's output extension, or the path's own
    /// extension when none matches. A file name without a dot yields `""`.
    pub fn predicted_extension(&self, path: &str) -> String {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let Some(dot) = file_name.rfind('.') else {
            return String::new();
        };
        match self.select(path) {
            Some(p) if !p.output_extension().is_empty() => p.output_extension().to_string(),
            _ => file_name[dot..].to_string(),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.preprocessors.iter().map(|p| p.name()).collect()
    }
}

impl Default for PreprocessorSet {
    fn default() -> Self {
        Self::empty()
            .with(HtmlPreprocessor::new())
            .with(CssPreprocessor::new())
            .with(MarkdownPreprocessor::new())
    }
}

impl fmt::Debug for PreprocessorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreprocessorSet").field("preprocessors", &self.names()).finish()
    }
}

/// Resolve `target` through the `include` function bound in `data`.
///
/// Returns `None` when no `include` function is bound. Failures come back as
/// their inline marker so a transform never aborts on a broken include.
pub(crate) async fn call_include(data: &Map, target: Value, extra: Map) -> Option<String> {
    let include = match data.get(INCLUDE_HELPER) {
        Some(include @ Value::Function(_)) => include.clone(),
        _ => return None,
    };
    let outcome = match include.call(vec![target, Value::Object(extra)]) {
        Ok(Value::Pending(pending)) => pending.resolve().await,
        other => other,
    };
    Some(match outcome {
        Ok(value) => value.to_text(),
        Err(err) => {
            tracing::warn!("Include failed during preprocessing: {}", err);
            err.marker()
        }
    })
}
