//! Filters applied to placeholder values.
//!
//! A filter receives the value produced so far in a placeholder's chain plus
//! its evaluated arguments, and returns the next value. Filters may return a
//! [`Value::Pending`]; the rendering engine awaits whatever is left pending at
//! the end of the chain.
//!
//! Filters are looked up by name in a [`FilterRegistry`]. The registry is an
//! open set: callers register their own filters next to the built-ins, and a
//! caller filter replaces a built-in of the same name.
//!
//! ```
//! use stitch_cli::expression::Value;
//! use stitch_cli::filters::FilterRegistry;
//!
//! let mut custom = FilterRegistry::new();
//! custom.register("shout", |input: Value, _args: Vec<Value>| -> stitch_cli::core::Result<Value> {
//!     Ok(Value::from(input.to_text().to_uppercase()))
//! });
//! let filters = FilterRegistry::builtin().merged(&custom);
//! assert!(filters.get("shout").is_ok());
//! assert!(filters.get("json").is_ok());
//! ```

mod builtin;
mod format;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use strsim::levenshtein;

use crate::core::{Result, TemplateError};
use crate::expression::Value;

pub use format::{DEFAULT_LOCALE, FALLBACK_LOCALE};

/// Maximum Levenshtein distance, as a percentage of the requested name's
/// length, for a registered filter to be offered as a suggestion.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// A named post-processing step in a placeholder's filter chain.
pub trait Filter: Send + Sync {
    fn apply(&self, input: Value, args: Vec<Value>) -> Result<Value>;
}

impl<F> Filter for F
where
    F: Fn(Value, Vec<Value>) -> Result<Value> + Send + Sync,
{
    fn apply(&self, input: Value, args: Vec<Value>) -> Result<Value> {
        self(input, args)
    }
}

/// Name → filter mapping.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<dyn Filter>>,
}

impl FilterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in filter.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }

    /// Register `filter` under `name`, replacing any filter of that name.
    pub fn register(&mut self, name: impl Into<String>, filter: impl Filter + 'static) -> &mut Self {
        self.filters.insert(name.into(), Arc::new(filter));
        self
    }

    /// This registry with every filter of `overrides` layered on top.
    pub fn merged(&self, overrides: &FilterRegistry) -> Self {
        let mut filters = self.filters.clone();
        filters.extend(overrides.filters.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
        Self { filters }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Look up a filter, failing with [`TemplateError::UnknownFilter`].
    pub fn get(&self, name: &str) -> Result<Arc<dyn Filter>> {
        self.filters.get(name).cloned().ok_or_else(|| TemplateError::UnknownFilter {
            name: name.to_string(),
            suggestion: self.suggest(name),
        })
    }

    /// Sorted names of all registered filters.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn suggest(&self, name: &str) -> Option<String> {
        let limit = name.len() * SIMILARITY_THRESHOLD_PERCENT / 100;
        self.filters
            .keys()
            .map(|candidate| (levenshtein(name, candidate), candidate))
            .filter(|(distance, _)| *distance <= limit)
            .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)))
            .map(|(_, candidate)| candidate.clone())
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry").field("filters", &self.names()).finish()
    }
}
