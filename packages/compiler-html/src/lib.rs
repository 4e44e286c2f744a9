//! # Mailcraft HTML Compiler
//!
//! Renders a [`Template`](mailcraft_document::Template) to nested-table
//! email markup. Ids, grid spans and element kinds are written as
//! attributes so `mailcraft-parser` can rebuild the same tree.

mod compiler;
mod elements;

pub use compiler::{
    compile_to_html, escape_attribute, escape_text, render, CompileError, CompileOptions,
    CompileResult,
};
pub use elements::compile_element;
