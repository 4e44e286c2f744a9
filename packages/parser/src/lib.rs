//! # Mailcraft Parser
//!
//! Reads table-based email markup back into a [`Template`].
//!
//! Parsing runs in two passes: [`dom::build_tree`] reads the markup into a
//! generic node tree, then [`Parser`] maps that tree onto the
//! document model. Fragments that cannot be mapped are skipped and logged;
//! only a missing content container fails the whole parse.
//!
//! [`Template`]: mailcraft_document::Template

pub mod dom;
pub mod error;
pub mod parser;

pub use dom::{build_tree, parse_document, ElementNode, Node};
pub use error::{ParseError, ParseResult};
pub use parser::{
    infer_kind, parse, parse_strict, parse_with_options, ParseOptions, ParseReport, Parser,
    Skipped, DEFAULT_CONTAINER_CLASS,
};
