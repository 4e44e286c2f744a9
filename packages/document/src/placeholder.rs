//! Placeholder tokens for content that is intentionally missing.
//!
//! A generative source may leave an image, link or text body blank on
//! purpose so that the user (or a follow-up step) fills it in later. Those
//! fields hold one of three reserved literals instead of being null, and
//! every consumer has to treat them as a first-class value:
//!
//! ```text
//! concrete value   "https://example.com"      -> Fillable::Value
//! placeholder      "@@PLACEHOLDER_LINK@@"     -> Fillable::Placeholder(Link)
//! invalid          ""                         -> rejected by the validator
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

pub const PLACEHOLDER_IMAGE: &str = "@@PLACEHOLDER_IMAGE@@";
pub const PLACEHOLDER_LINK: &str = "@@PLACEHOLDER_LINK@@";
pub const PLACEHOLDER_TEXT: &str = "@@PLACEHOLDER_TEXT@@";

/// Which kind of value a placeholder stands in for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Image,
    Link,
    Text,
}

impl Placeholder {
    pub const ALL: [Placeholder; 3] = [Placeholder::Image, Placeholder::Link, Placeholder::Text];

    /// The reserved literal used on the wire
    pub fn token(self) -> &'static str {
        match self {
            Placeholder::Image => PLACEHOLDER_IMAGE,
            Placeholder::Link => PLACEHOLDER_LINK,
            Placeholder::Text => PLACEHOLDER_TEXT,
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.token() == token)
    }

    /// Short marker used in `data-placeholder` attributes
    pub fn marker(self) -> &'static str {
        match self {
            Placeholder::Image => "image",
            Placeholder::Link => "link",
            Placeholder::Text => "text",
        }
    }

    pub fn from_marker(marker: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.marker() == marker)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A string field that may legally hold a placeholder token.
///
/// Serialized as a plain string: the token itself for placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Fillable {
    Value(String),
    Placeholder(Placeholder),
}

impl Fillable {
    pub fn value(value: impl Into<String>) -> Self {
        Fillable::from(value.into())
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Fillable::Placeholder(_))
    }

    pub fn placeholder(&self) -> Option<Placeholder> {
        match self {
            Fillable::Placeholder(p) => Some(*p),
            Fillable::Value(_) => None,
        }
    }

    /// The concrete value, if one has been supplied
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Fillable::Value(v) => Some(v),
            Fillable::Placeholder(_) => None,
        }
    }

    /// Wire representation (the token for placeholders)
    pub fn as_str(&self) -> &str {
        match self {
            Fillable::Value(v) => v,
            Fillable::Placeholder(p) => p.token(),
        }
    }
}

impl From<String> for Fillable {
    fn from(s: String) -> Self {
        match Placeholder::from_token(&s) {
            Some(p) => Fillable::Placeholder(p),
            None => Fillable::Value(s),
        }
    }
}

impl From<&str> for Fillable {
    fn from(s: &str) -> Self {
        Fillable::from(s.to_string())
    }
}

impl From<Placeholder> for Fillable {
    fn from(p: Placeholder) -> Self {
        Fillable::Placeholder(p)
    }
}

impl From<Fillable> for String {
    fn from(f: Fillable) -> Self {
        match f {
            Fillable::Value(v) => v,
            Fillable::Placeholder(p) => p.token().to_string(),
        }
    }
}

impl fmt::Display for Fillable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
