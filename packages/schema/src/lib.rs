//! # Mailcraft Schema
//!
//! Validates untyped document payloads (typically JSON from a generative
//! source) against the document model before they are trusted.
//!
//! Validation never stops at the first problem: every issue is collected
//! with its path so the source can correct the whole payload in one retry.
//! A payload either validates completely and yields a typed
//! [`Template`](mailcraft_document::Template), or is rejected.

pub mod error;
pub mod rules;
pub mod validate;

pub use error::{SchemaError, SchemaResult, ValidationIssue, ValidationIssues};
pub use validate::{
    check_template, validate_element, validate_json, validate_section, validate_template,
    Validator,
};
