//! Placeholder rendering.
//!
//! [`render`] replaces every `{{ ... }}` span in a text with the value of its
//! expression after the span's filter chain has run. Text outside placeholders
//! is copied unchanged, except that `\{` and `\}` are turned into literal braces
//! once the whole text has been rendered.
//!
//! # Evaluation
//!
//! The main expression is evaluated in a scope holding the caller's data in
//! front of the built-in helpers (see [`crate::helpers`]). Its value is then
//! coerced:
//!
//! 1. `undefined` becomes empty text,
//! 2. a function is called without arguments and its result is used,
//! 3. a pending value is awaited.
//!
//! Each filter of the chain receives the previous value plus its own arguments,
//! which are evaluated in the same scope. A pending value left at the end of the
//! chain is awaited.
//!
//! # Escaping
//!
//! Output is HTML-escaped unless the placeholder is marked safe, either by a
//! `safe` filter anywhere in its chain or because the main expression is a
//! layout's `content`. The decision belongs to each placeholder, so
//! placeholders rendered concurrently never affect each other's escaping.
//!
//! # Failures
//!
//! A placeholder that fails for any reason (syntax, reference or type error,
//! unknown filter, rejected pending value) renders as
//! `<template-error>Error: <message></template-error>` and the rest of the
//! text renders normally.
//!
//! ```
//! # tokio_test_block(async {
//! use stitch_cli::expression::{Map, Value};
//! use stitch_cli::filters::FilterRegistry;
//! use stitch_cli::templating::render;
//!
//! let mut data = Map::new();
//! data.insert("title".to_string(), Value::from("<Hi>"));
//! let filters = FilterRegistry::builtin();
//! assert_eq!(render("{{ title }}!", &data, &filters).await, "&lt;Hi&gt;!");
//! assert_eq!(render("{{ title | safe }}!", &data, &filters).await, "<Hi>!");
//! # });
//! # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

pub mod escape;
pub mod placeholder;

use futures::future::join_all;

use crate::core::Result;
use crate::expression::{Map, Scope, Value, evaluate, parse_argument_list, parse_expression};
use crate::filters::FilterRegistry;
use crate::helpers;
use escape::{escape_html, unescape_braces};
use placeholder::{Placeholder, scan};

/// Render every placeholder of `content` against `data`.
pub async fn render(content: &str, data: &Map, filters: &FilterRegistry) -> String {
    let spans = scan(content);
    if spans.is_empty() {
        return unescape_braces(content).into_owned();
    }

    let scope = Scope::child(&Scope::new(helpers::builtin()), data.clone());
    let rendered =
        join_all(spans.iter().map(|span| render_placeholder(span.inner, &scope, filters))).await;

    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    for (span, text) in spans.iter().zip(rendered) {
        out.push_str(&content[cursor..span.range.start]);
        out.push_str(&text);
        cursor = span.range.end;
    }
    out.push_str(&content[cursor..]);
    unescape_braces(&out).into_owned()
}

async fn render_placeholder(inner: &str, scope: &Scope, filters: &FilterRegistry) -> String {
    match evaluate_placeholder(inner, scope, filters).await {
        Ok((text, true)) => text,
        Ok((text, false)) => escape_html(&text),
        Err(err) => {
            tracing::warn!("Failed to render placeholder '{}': {}", inner.trim(), err);
            err.marker()
        }
    }
}

/// Await a pending value and split off its safe tag.
async fn settle(value: Value) -> Result<(Value, bool)> {
    let (value, safe) = value.unwrap_safe();
    let value = match value {
        Value::Pending(pending) => pending.resolve().await?,
        other => other,
    };
    let (value, settled_safe) = value.unwrap_safe();
    Ok((value, safe || settled_safe))
}

/// Evaluate one placeholder to its text and whether that text is safe.
///
/// Filters always receive untagged values. A safe tag returned by any filter
/// marks the whole placeholder safe, wherever that filter sits in the chain.
async fn evaluate_placeholder(
    inner: &str,
    scope: &Scope,
    filters: &FilterRegistry,
) -> Result<(String, bool)> {
    let placeholder = Placeholder::parse(inner)?;
    let value = match evaluate(&parse_expression(&placeholder.expression)?, scope)? {
        Value::Undefined => Value::from(""),
        Value::Function(f) => f.call(Vec::new())?,
        other => other,
    };
    let (mut value, mut safe) = settle(value).await?;

    for call in &placeholder.filters {
        let filter = filters.get(&call.name)?;
        let args = parse_argument_list(&call.args)?
            .iter()
            .map(|arg| evaluate(arg, scope))
            .collect::<Result<Vec<_>>>()?;
        let (next, marked) = filter.apply(value, args)?.unwrap_safe();
        value = next;
        safe |= marked;
    }

    let (value, settled_safe) = settle(value).await?;
    Ok((value.to_text(), safe || settled_safe))
}
