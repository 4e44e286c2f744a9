//! Error types for the editor

use crate::change::ChangeStatus;
use crate::merge::MergeError;
use crate::mutations::MutationError;
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] mailcraft_parser::ParseError),

    #[error("Schema error: {0}")]
    Schema(#[from] mailcraft_schema::SchemaError),

    #[error("Render error: {0}")]
    Compile(#[from] mailcraft_compiler_html::CompileError),

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Change not found: {0}")]
    ChangeNotFound(String),

    #[error("Change {id} is already {status}")]
    AlreadyResolved { id: String, status: ChangeStatus },

    #[error("Change {0} belongs to a superseded batch")]
    Superseded(String),

    #[error("Batch not found: {0}")]
    BatchNotFound(String),

    #[error("Change {change} belongs to batch {found}, expected {expected}")]
    BatchMismatch {
        change: String,
        expected: String,
        found: String,
    },

    #[error("Duplicate change id: {0}")]
    DuplicateChange(String),

    #[error("Generated content has no usable sections")]
    NoUsableContent,

    #[error("Project not found: {0}")]
    ProjectNotFound(String),
}
