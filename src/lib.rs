//! stitch - recursive template resolution
//!
//! Resolves documents that combine per-document metadata, file includes,
//! layout wrapping and `{{ expression | filter }}` placeholders into final
//! text, detecting cycles across the whole include/layout graph.
//!
//! # Architecture Overview
//!
//! For every document the [`resolver`] runs the same pipeline:
//!
//! 1. [`frontmatter`] splits the document into metadata and body,
//! 2. the metadata is merged over the caller's data and an `include` function
//!    is bound into it,
//! 3. a [`preprocess`] transform selected by path turns the body into text the
//!    rendering engine consumes (Markdown to HTML, `<html-include>` tags,
//!    CSS `@import`s),
//! 4. [`templating`] evaluates the placeholders with the [`expression`]
//!    interpreter and the [`filters`] registry,
//! 5. a layout named in the metadata wraps the result.
//!
//! Includes and layouts recurse through the same pipeline. Failures never
//! abort a resolution; they render as
//! `<template-error>Error: ...</template-error>` where they happened.
//!
//! # Core Modules
//!
//! - [`core`] - Error types
//! - [`expression`] - Expression language: parser, values and interpreter
//! - [`filters`] - Filter trait, registry and built-in filters
//! - [`helpers`] - Functions available in every placeholder (`fetchJson`, `fetchText`)
//! - [`templating`] - Placeholder scanning, evaluation and escaping
//! - [`frontmatter`] - Metadata block extraction
//! - [`preprocess`] - Path-matched content transforms
//! - [`resolver`] - The recursive orchestrator and cycle detection
//! - [`source`] - Where document text comes from
//! - [`config`] - `stitch.toml` settings
//! - [`cli`] - The `stitch` command
//!
//! # Example
//!
//! ```rust
//! use stitch_cli::expression::Map;
//! use stitch_cli::resolver::Resolver;
//! use stitch_cli::source::MemorySource;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let source = MemorySource::new().with("_includes/greeting.html", "Hello, {{ name }}!");
//! let resolver = Resolver::new(source);
//!
//! let out = resolver
//!     .resolve(r#"<p>{{ include("greeting.html", {name: "Ada"}) }}</p>"#, "index.html", Map::new())
//!     .await;
//! assert_eq!(out, "<p>Hello, Ada!</p>");
//! # }
//! ```

// Core functionality
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod resolver;
pub mod source;

// Rendering
pub mod expression;
pub mod filters;
pub mod frontmatter;
pub mod helpers;
pub mod preprocess;
pub mod templating;

// Test utilities (available for both unit and integration tests)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
