//! Error handling for stitch
//!
//! Every failure that can happen while resolving a document is represented by
//! [`TemplateError`]. None of them is fatal to a resolution: the resolver and the
//! rendering engine catch them at the point where they occur and substitute an
//! inline marker (see [`TemplateError::marker`]) so the rest of the document
//! still renders.
//!
//! # Error Categories
//!
//! - **Expression evaluation**: [`TemplateError::Expression`], [`TemplateError::Syntax`]
//! - **Filter lookup**: [`TemplateError::UnknownFilter`]
//! - **Dependency graph**: [`TemplateError::CyclicDependency`]
//! - **Resources**: [`TemplateError::MissingResource`], [`TemplateError::Source`]
//! - **Content transforms**: [`TemplateError::Preprocess`]
//!
//! # Examples
//!
//! ```rust
//! use stitch_cli::core::TemplateError;
//!
//! let err = TemplateError::CyclicDependency {
//!     path: "_layouts/base.html".to_string(),
//! };
//! assert_eq!(
//!     err.marker(),
//!     "<template-error>Error: cyclic dependency detected.</template-error>"
//! );
//! ```

use thiserror::Error;

use crate::constants::{ERROR_MARKER_CLOSE, ERROR_MARKER_OPEN};

/// Errors raised while evaluating placeholders or resolving documents.
///
/// The type is `Clone` because a rejected pending value may be observed by more
/// than one consumer (pending values are shared futures).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// An expression evaluated to an error (type error, bad call, rejected value).
    #[error("{message}")]
    Expression {
        message: String,
    },

    /// The expression or filter expression could not be parsed.
    #[error("{message}")]
    Syntax {
        message: String,
    },

    /// A filter name that is not registered was used in a filter chain.
    #[error("unregistered or invalid filter: {name}{}", suggestion_suffix(.suggestion))]
    UnknownFilter {
        name: String,
        suggestion: Option<String>,
    },

    /// A path re-entered the resolution stack.
    #[error("cyclic dependency detected.")]
    CyclicDependency {
        path: String,
    },

    /// The resolve collaborator reported that a path does not exist.
    #[error("resource not found: {path}")]
    MissingResource {
        path: String,
    },

    /// The resolve collaborator failed while fetching a path.
    #[error("failed to load '{path}': {message}")]
    Source {
        path: String,
        message: String,
    },

    /// A preprocessor failed to transform a document.
    #[error("preprocessor '{preprocessor}' failed: {message}")]
    Preprocess {
        preprocessor: String,
        message: String,
    },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{name}'?)"),
        None => String::new(),
    }
}

impl TemplateError {
    /// Shorthand for an [`TemplateError::Expression`] error.
    pub fn expression(message: impl Into<String>) -> Self {
        Self::Expression {
            message: message.into(),
        }
    }

    /// Shorthand for a [`TemplateError::Syntax`] error.
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    /// Render this error as the inline marker substituted into documents.
    ///
    /// The format is fixed: `<template-error>Error: <message></template-error>`.
    pub fn marker(&self) -> String {
        format!("{ERROR_MARKER_OPEN}Error: {self}{ERROR_MARKER_CLOSE}")
    }

    /// Whether this error was caused by re-entering the resolution stack.
    pub fn is_cyclic(&self) -> bool {
        matches!(self, Self::CyclicDependency { .. })
    }
}

/// Result alias used throughout the rendering engine.
pub type Result<T, E = TemplateError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_marker() {
        let err = TemplateError::expression("boom");
        assert_eq!(err.marker(), "<template-error>Error: boom</template-error>");
    }

    #[test]
    fn test_cyclic_marker_is_exact() {
        let err = TemplateError::CyclicDependency {
            path: "a.html".to_string(),
        };
        assert!(err.is_cyclic());
        assert_eq!(
            err.marker(),
            "<template-error>Error: cyclic dependency detected.</template-error>"
        );
    }

    #[test]
    fn test_unknown_filter_with_suggestion() {
        let err = TemplateError::UnknownFilter {
            name: "revese".to_string(),
            suggestion: Some("reverse".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "unregistered or invalid filter: revese (did you mean 'reverse'?)"
        );

        let err = TemplateError::UnknownFilter {
            name: "zzz".to_string(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "unregistered or invalid filter: zzz");
    }

    #[test]
    fn test_missing_resource_message() {
        let err = TemplateError::MissingResource {
            path: "_includes/nav.html".to_string(),
        };
        assert!(!err.is_cyclic());
        assert_eq!(err.to_string(), "resource not found: _includes/nav.html");
    }
}
