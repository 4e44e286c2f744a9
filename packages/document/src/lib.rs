//! # Mailcraft Document
//!
//! Typed model of an email document:
//!
//! ```text
//! Template
//!  └─ Section*          (style, pending deletion flag)
//!      └─ Row*          (style)
//!          └─ Column*   (span 1..=12, style)
//!              └─ Element*   (type tag, layout, properties)
//! ```
//!
//! Identifiers are unique within a template and are the only key used to
//! correlate entities across two versions of the same email.

pub mod ast;
pub mod defaults;
pub mod id_generator;
pub mod placeholder;
pub mod style;

pub use ast::*;
pub use defaults::{single_column_section, starter_template};
pub use id_generator::{IDGenerator, NodeKind};
pub use placeholder::{Fillable, Placeholder, PLACEHOLDER_IMAGE, PLACEHOLDER_LINK, PLACEHOLDER_TEXT};
