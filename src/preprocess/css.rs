//! CSS preprocessor: inlines `@import` statements.
//!
//! `@import "vendor/reset.css";` and `@import url("vendor/reset.css");` are
//! replaced by the resolved stylesheet, including the statement's line break.
//! Import paths are relative to the importing stylesheet. Imports of remote
//! URLs (`http:`, `https:`, `//`) are left in place.

use futures::future::BoxFuture;
use regex::Regex;

use super::{PathMatcher, Preprocessor, call_include};
use crate::core::{Result, TemplateError};
use crate::expression::{Map, Value};

const IMPORT_PATTERN: &str = r#"@import\s+(?:url\()?["']([^"'\n]+)["']\)?\s*;[ \t]*\r?\n?"#;

pub struct CssPreprocessor {
    matcher: PathMatcher,
}

impl CssPreprocessor {
    pub fn new() -> Self {
        Self {
            matcher: PathMatcher::suffix(".css"),
        }
    }
}

impl Default for CssPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

fn is_remote(target: &str) -> bool {
    target.starts_with("http:") || target.starts_with("https:") || target.starts_with("//")
}

/// Make a bare import path explicitly relative to the importing file.
fn relative_target(target: &str) -> String {
    if target.starts_with("./") || target.starts_with("../") || target.starts_with('/') {
        target.to_string()
    } else {
        format!("./{target}")
    }
}

async fn inline_imports(content: &str, data: &Map) -> Result<String> {
    let pattern = Regex::new(IMPORT_PATTERN).map_err(|e| TemplateError::Preprocess {
        preprocessor: "css".to_string(),
        message: e.to_string(),
    })?;
    let imports: Vec<_> = pattern
        .captures_iter(content)
        .filter_map(|caps| Some((caps.get(0)?.range(), caps.get(1)?.as_str().to_string())))
        .filter(|(_, target)| !is_remote(target))
        .collect();

    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    for (range, target) in imports {
        out.push_str(&content[cursor..range.start]);
        let target = Value::from(relative_target(&target));
        match call_include(data, target, Map::new()).await {
            Some(stylesheet) => out.push_str(&stylesheet),
            None => out.push_str(&content[range.clone()]),
        }
        cursor = range.end;
    }
    out.push_str(&content[cursor..]);
    Ok(out)
}

impl Preprocessor for CssPreprocessor {
    fn name(&self) -> &str {
        "css"
    }

    fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    fn output_extension(&self) -> &str {
        ".css"
    }

    fn process<'a>(&'a self, content: &'a str, data: &'a Map) -> BoxFuture<'a, Result<String>> {
        Box::pin(inline_imports(content, data))
    }
}
