//! Test utilities for stitch
//!
//! Shared helpers for unit and integration tests: a once-only tracing
//! subscriber and a small in-memory site fixture.
//!
//! # Example
//!
//! ```rust,no_run
//! use stitch_cli::test_utils::{SiteFixture, init_test_logging};
//!
//! # async fn example() {
//! init_test_logging(None);
//! let site = SiteFixture::new()
//!     .page("index.html", "---\nlayout: base\n---\nbody")
//!     .layout("base.html", "<main>{{ content }}</main>");
//! let out = site.resolver().resolve_path("index.html", Default::default()).await;
//! # }
//! ```

use std::sync::Once;

use serde_json::Value as JsonValue;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::constants::{DEFAULT_INCLUDES_ROOT, DEFAULT_LAYOUTS_ROOT};
use crate::expression::{Map, Value};
use crate::resolver::Resolver;
use crate::source::MemorySource;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call installs a subscriber. `level` wins over `RUST_LOG`;
/// with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// An in-memory site laid out with the default include and layout roots.
#[derive(Debug, Clone, Default)]
pub struct SiteFixture {
    source: MemorySource,
}

impl SiteFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document at `path` (relative to the site root).
    #[must_use]
    pub fn page(mut self, path: &str, content: &str) -> Self {
        self.source.insert(path, content);
        self
    }

    /// Add a document below `_includes/`.
    #[must_use]
    pub fn include(self, name: &str, content: &str) -> Self {
        self.page(&format!("{DEFAULT_INCLUDES_ROOT}/{name}"), content)
    }

    /// Add a document below `_layouts/`.
    #[must_use]
    pub fn layout(self, name: &str, content: &str) -> Self {
        self.page(&format!("{DEFAULT_LAYOUTS_ROOT}/{name}"), content)
    }

    pub fn source(&self) -> MemorySource {
        self.source.clone()
    }

    /// A resolver with default settings over the fixture's documents.
    pub fn resolver(&self) -> Resolver {
        Resolver::new(self.source())
    }
}

/// Convert a `serde_json::json!` object into render data.
///
/// Non-object values yield empty data.
pub fn data(json: JsonValue) -> Map {
    match Value::from(json) {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
