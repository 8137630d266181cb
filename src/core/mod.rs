//! Core types shared by every stage of the resolver.
//!
//! The only abstraction living here is the error taxonomy. Everything that can
//! go wrong while a document is resolved is a [`TemplateError`], and every
//! [`TemplateError`] can be rendered as an inline marker so that failures stay
//! local to the fragment that produced them.
//!
//! # Modules
//!
//! - `error` - [`TemplateError`] and the crate-wide [`Result`] alias

pub mod error;

pub use error::{Result, TemplateError};
