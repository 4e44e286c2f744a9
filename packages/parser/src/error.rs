use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("No content container found (looked for class \"{class}\", then the first table in the first body row)")]
    ContainerNotFound { class: String },
}

impl ParseError {
    pub fn container_not_found(class: impl Into<String>) -> Self {
        Self::ContainerNotFound {
            class: class.into(),
        }
    }
}
