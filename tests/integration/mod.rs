//! Integration test suite for stitch
//!
//! End-to-end tests that resolve whole document graphs through the public
//! API and the `stitch` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **resolve**: Frontmatter, includes, layouts and cycles against an in-memory site
//! - **preprocessors**: Markdown, `<html-include>` and CSS bundling through the resolver
//! - **filters**: Built-in and caller filters inside resolved documents
//! - **fs_source**: Sites on disk and `stitch.toml` configuration
//! - **cli**: The `stitch` binary

mod cli;
mod filters;
mod fs_source;
mod preprocessors;
mod resolve;

pub const CYCLIC_MARKER: &str = "<template-error>Error: cyclic dependency detected.</template-error>";
