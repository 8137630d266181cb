//! Markdown preprocessor.
//!
//! Converts CommonMark (with tables and strikethrough) to HTML using
//! `pulldown-cmark`, then expands `<html-include>` directives like the HTML
//! preprocessor. Placeholders and escaped braces are shielded from the
//! converter so expressions such as `{{ a > b }}` reach the rendering engine
//! untouched.

use futures::future::BoxFuture;
use pulldown_cmark::{Options, Parser, html};
use regex::{Captures, Regex};

use super::html::expand_includes;
use super::{PathMatcher, Preprocessor};
use crate::core::{Result, TemplateError};
use crate::expression::Map;
use crate::templating::placeholder::scan;

const SHIELD_PREFIX: &str = "STITCHSHIELD";
const SHIELD_PATTERN: &str = r"STITCHSHIELD(\d+)X";

pub struct MarkdownPreprocessor {
    matcher: PathMatcher,
    options: Options,
}

impl MarkdownPreprocessor {
    pub fn new() -> Self {
        Self {
            matcher: PathMatcher::suffix(".md"),
            options: Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH,
        }
    }

    /// Convert Markdown to HTML, leaving template syntax intact.
    pub fn to_html(&self, markdown: &str) -> Result<String> {
        let (shielded, originals) = shield(markdown);
        let mut out = String::with_capacity(shielded.len() * 3 / 2);
        html::push_html(&mut out, Parser::new_ext(&shielded, self.options));
        unshield(&out, &originals)
    }
}

impl Default for MarkdownPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Swap placeholders and `\{` `\}` escapes for inert tokens.
fn shield(markdown: &str) -> (String, Vec<String>) {
    let mut originals = Vec::new();
    let mut out = String::with_capacity(markdown.len());
    let mut token = |original: &str, out: &mut String| {
        out.push_str(&format!("{SHIELD_PREFIX}{}X", originals.len()));
        originals.push(original.to_string());
    };

    let mut cursor = 0;
    for span in scan(markdown) {
        shield_escapes(&markdown[cursor..span.range.start], &mut out, &mut token);
        token(&markdown[span.range.clone()], &mut out);
        cursor = span.range.end;
    }
    shield_escapes(&markdown[cursor..], &mut out, &mut token);
    (out, originals)
}

fn shield_escapes(text: &str, out: &mut String, token: &mut impl FnMut(&str, &mut String)) {
    let mut rest = text;
    while let Some(pos) = rest.find('\\') {
        let escaped = &rest[pos..];
        if escaped.starts_with("\\{") || escaped.starts_with("\\}") {
            out.push_str(&rest[..pos]);
            token(&escaped[..2], out);
            rest = &escaped[2..];
        } else {
            out.push_str(&rest[..pos + 1]);
            rest = &escaped[1..];
        }
    }
    out.push_str(rest);
}

fn unshield(html: &str, originals: &[String]) -> Result<String> {
    let pattern = Regex::new(SHIELD_PATTERN).map_err(|e| TemplateError::Preprocess {
        preprocessor: "markdown".to_string(),
        message: e.to_string(),
    })?;
    Ok(pattern
        .replace_all(html, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| originals.get(i))
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned())
}

impl Preprocessor for MarkdownPreprocessor {
    fn name(&self) -> &str {
        "markdown"
    }

    fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    fn output_extension(&self) -> &str {
        ".html"
    }

    fn process<'a>(&'a self, content: &'a str, data: &'a Map) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let html = self.to_html(content)?;
            expand_includes(&html, data).await
        })
    }
}
