use std::fmt;
use thiserror::Error;

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template failed validation with {} issue(s):\n{0}", .0.len())]
    Invalid(ValidationIssues),
}

impl SchemaError {
    /// Issues found, empty for JSON syntax errors
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            SchemaError::Invalid(issues) => issues.issues(),
            SchemaError::Json(_) => &[],
        }
    }
}

/// A single problem found in a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path to the offending value, e.g. `sections[0].rows[0].id`
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.path, self.message)
        }
    }
}

/// All issues found in one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationIssues {
    issues: Vec<ValidationIssue>,
}

impl ValidationIssues {
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn into_inner(self) -> Vec<ValidationIssue> {
        self.issues
    }

    /// Whether any issue sits at `path`
    pub fn has_path(&self, path: &str) -> bool {
        self.issues.iter().any(|i| i.path == path)
    }
}

impl From<Vec<ValidationIssue>> for ValidationIssues {
    fn from(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }
}

impl fmt::Display for ValidationIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}
