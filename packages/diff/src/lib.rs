//! # Mailcraft Diff
//!
//! Compares two versions of a template by node identity and reports, per
//! section, which rows, columns and elements were added, removed, modified
//! or moved. Field changes are kept nested (`layout.padding.top`) so a
//! reviewer can see which group of properties changed.

mod compare;
mod differ;
mod types;

pub use compare::{change_at, diff_values, ChangeMap, FieldChange};
pub use differ::{diff_templates, diff_templates_with_options, DiffOptions};
pub use types::*;
