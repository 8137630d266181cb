//! Placeholder scanning and filter-chain parsing.
//!
//! A placeholder is `{{ expression | filter: arg, arg | filter }}` on a single
//! line. The scanner pairs each `{{` with the first `}}` after it, so the
//! shortest possible span wins. The chain is split on every `|`, whether or not
//! it sits inside a string or a sub-expression; expressions that need a literal
//! `|` or the `||` operator cannot be written inside a placeholder.

use std::ops::Range;

use crate::constants::MAX_PLACEHOLDER_CHARS;
use crate::core::{Result, TemplateError};

/// A placeholder's location in the source and its inner text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<'a> {
    /// Byte range of the whole `{{ ... }}` span.
    pub range: Range<usize>,
    pub inner: &'a str,
}

/// Find every placeholder span in `content`, in order.
pub fn scan(content: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut pos = 0;
    while let Some(offset) = content[pos..].find("{{") {
        let open = pos + offset;
        match closing(content, open + 2) {
            Some(close) => {
                spans.push(Span {
                    range: open..close + 2,
                    inner: &content[open + 2..close],
                });
                pos = close + 2;
            }
            // No span starts here; retry one character further on.
            None => pos = open + 1,
        }
    }
    spans
}

/// Byte offset of the `}}` closing a span whose inner text starts at `start`.
fn closing(content: &str, start: usize) -> Option<usize> {
    let mut chars = content[start..].char_indices();
    // The inner text holds at least one character.
    let (_, first) = chars.next()?;
    if first == '\n' {
        return None;
    }
    for (count, (offset, c)) in chars.enumerate() {
        if content[start + offset..].starts_with("}}") {
            return Some(start + offset);
        }
        if c == '\n' || count + 1 >= MAX_PLACEHOLDER_CHARS {
            return None;
        }
    }
    None
}

/// One `name: args` step of a filter chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCall {
    pub name: String,
    /// Unparsed argument list; empty when the filter takes no arguments.
    pub args: String,
}

/// A placeholder split into its main expression and filter chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub expression: String,
    pub filters: Vec<FilterCall>,
}

impl Placeholder {
    pub fn parse(inner: &str) -> Result<Self> {
        let mut parts = inner.trim().split('|').map(str::trim);
        let expression = parts.next().unwrap_or_default().to_string();
        let filters = parts.map(parse_filter_call).collect::<Result<Vec<_>>>()?;
        Ok(Self {
            expression,
            filters,
        })
    }
}

fn parse_filter_call(source: &str) -> Result<FilterCall> {
    let name_len = source
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_alphabetic() || *c == '_' || (*i > 0 && c.is_ascii_digit())))
        .map_or(source.len(), |(i, _)| i);
    let (name, rest) = source.split_at(name_len);
    if name.is_empty() {
        return Err(TemplateError::syntax(format!("invalid filter expression '{source}'")));
    }
    let args = match rest.trim_start().strip_prefix(':') {
        Some(args) => args.trim().to_string(),
        None if rest.trim().is_empty() => String::new(),
        None => {
            return Err(TemplateError::syntax(format!("invalid filter expression '{source}'")));
        }
    };
    Ok(FilterCall {
        name: name.to_string(),
        args,
    })
}
