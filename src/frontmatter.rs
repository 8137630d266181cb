//! Frontmatter extraction.
//!
//! A document may open with a metadata block:
//!
//! ```text
//! ---
//! title: "Hello"
//! layout: article
//! tags: ["a", "b"]
//! ---
//! <h1>{{ title }}</h1>
//! ```
//!
//! Each `key: value` line is read as a JSON literal, falling back to the raw
//! text when the value is not valid JSON (so `layout: article` yields the
//! string `"article"`). Blank lines and lines starting with `#` are skipped.
//!
//! Opening the block with `---json` instead switches to a single JSON object:
//!
//! ```text
//! ---json
//! {"title": "Hello", "layout": "article"}
//! ---
//! ```
//!
//! A document without an opening delimiter on its first line, or without a
//! closing delimiter line, has no frontmatter and its body is the whole text.

use crate::constants::{FRONTMATTER_DELIMITER, FRONTMATTER_JSON_DELIMITER};
use crate::expression::{Map, Value};

/// A document split into its metadata and body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    pub metadata: Map,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Lines,
    Json,
}

/// Byte positions of a frontmatter block.
#[derive(Debug, Clone, Copy)]
struct Boundaries {
    kind: BlockKind,
    /// Start of the block's interior (after the opening line).
    inner_start: usize,
    /// Start of the closing delimiter line.
    inner_end: usize,
    /// Start of the body (after the closing line).
    body_start: usize,
}

fn boundaries(content: &str) -> Option<Boundaries> {
    let first_line_end = content.find('\n')?;
    let kind = match content[..first_line_end].trim_end_matches('\r') {
        FRONTMATTER_DELIMITER => BlockKind::Lines,
        FRONTMATTER_JSON_DELIMITER => BlockKind::Json,
        _ => return None,
    };

    let inner_start = first_line_end + 1;
    let mut line_start = inner_start;
    while line_start <= content.len() {
        let line_end = content[line_start..].find('\n').map_or(content.len(), |i| line_start + i);
        if content[line_start..line_end].trim_end_matches('\r') == FRONTMATTER_DELIMITER {
            return Some(Boundaries {
                kind,
                inner_start,
                inner_end: line_start,
                body_start: (line_end + 1).min(content.len()),
            });
        }
        line_start = line_end + 1;
    }
    None
}

/// Split `content` into frontmatter metadata and body.
pub fn extract(content: &str) -> Frontmatter {
    let Some(bounds) = boundaries(content) else {
        return Frontmatter {
            metadata: Map::new(),
            body: content.to_string(),
        };
    };

    let inner = &content[bounds.inner_start..bounds.inner_end];
    let metadata = match bounds.kind {
        BlockKind::Json => parse_json_block(inner),
        BlockKind::Lines => parse_lines(inner),
    };
    Frontmatter {
        metadata,
        body: content[bounds.body_start..].to_string(),
    }
}

fn parse_json_block(inner: &str) -> Map {
    match serde_json::from_str::<serde_json::Value>(inner) {
        Ok(json @ serde_json::Value::Object(_)) => match Value::from(json) {
            Value::Object(map) => map,
            _ => Map::new(),
        },
        Ok(other) => {
            tracing::warn!("Ignoring JSON frontmatter that is not an object: {}", other);
            Map::new()
        }
        Err(e) => {
            tracing::warn!("Warning: Unable to parse JSON frontmatter: {}", e);
            Map::new()
        }
    }
}

fn parse_lines(inner: &str) -> Map {
    let mut metadata = Map::new();
    for line in inner.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, raw)) = line.split_once(':') else {
            tracing::warn!("Ignoring frontmatter line without a key: {}", line);
            continue;
        };
        let raw = raw.trim();
        let value = serde_json::from_str::<serde_json::Value>(raw)
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(raw));
        metadata.insert(key.trim().to_string(), value);
    }
    metadata
}
