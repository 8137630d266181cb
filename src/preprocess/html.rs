//! HTML preprocessor: expands `<html-include>` directives.
//!
//! ```html
//! <html-include src="nav.html" active="home">
//! ```
//!
//! is replaced by the resolved `nav.html`, rendered with the directive's
//! attributes (`src`, `active`) merged into its data. Without an `include`
//! function in the data the directive is left untouched.

use std::ops::Range;

use futures::future::BoxFuture;
use regex::Regex;

use super::{PathMatcher, Preprocessor, call_include};
use crate::core::{Result, TemplateError};
use crate::expression::{Map, Value};

const DIRECTIVE_PATTERN: &str = r#"<html-include((?:\s+[a-z]{1,100}="[^"\n]{0,1024}")+)\s*/?>"#;
const ATTRIBUTE_PATTERN: &str = r#"([a-z]{1,100})="([^"\n]{0,1024})""#;

pub struct HtmlPreprocessor {
    matcher: PathMatcher,
}

impl HtmlPreprocessor {
    pub fn new() -> Self {
        Self {
            matcher: PathMatcher::suffixes([".html", ".htm", ".muh"]),
        }
    }
}

impl Default for HtmlPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

struct Directive {
    range: Range<usize>,
    attributes: Map,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| TemplateError::Preprocess {
        preprocessor: "html".to_string(),
        message: e.to_string(),
    })
}

fn find_directives(content: &str) -> Result<Vec<Directive>> {
    let directive = compile(DIRECTIVE_PATTERN)?;
    let attribute = compile(ATTRIBUTE_PATTERN)?;
    Ok(directive
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let attributes = attribute
                .captures_iter(caps.get(1)?.as_str())
                .map(|attr| (attr[1].to_string(), Value::from(&attr[2])))
                .collect();
            Some(Directive {
                range: whole.range(),
                attributes,
            })
        })
        .collect())
}

/// Replace every `<html-include>` directive in `content`.
pub(crate) async fn expand_includes(content: &str, data: &Map) -> Result<String> {
    let directives = find_directives(content)?;
    if directives.is_empty() {
        return Ok(content.to_string());
    }

    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    for Directive { range, attributes } in directives {
        out.push_str(&content[cursor..range.start]);
        let original = &content[range.clone()];
        let replacement = match attributes.get("src").cloned() {
            Some(src) => call_include(data, src, attributes).await,
            None if data.contains_key(crate::constants::INCLUDE_HELPER) => Some(
                TemplateError::expression("html-include requires a src attribute").marker(),
            ),
            None => None,
        };
        out.push_str(replacement.as_deref().unwrap_or(original));
        cursor = range.end;
    }
    out.push_str(&content[cursor..]);
    Ok(out)
}

impl Preprocessor for HtmlPreprocessor {
    fn name(&self) -> &str {
        "html"
    }

    fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    fn output_extension(&self) -> &str {
        ".html"
    }

    fn process<'a>(&'a self, content: &'a str, data: &'a Map) -> BoxFuture<'a, Result<String>> {
        Box::pin(expand_includes(content, data))
    }
}
