use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Structural node kinds that carry a markup id attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Section,
    Row,
    Column,
    Element,
}

impl NodeKind {
    pub fn prefix(self) -> &'static str {
        match self {
            NodeKind::Section => "section-",
            NodeKind::Row => "row-",
            NodeKind::Column => "column-",
            NodeKind::Element => "element-",
        }
    }

    /// `section-<id>` style attribute value
    pub fn dom_id(self, id: &str) -> String {
        format!("{}{}", self.prefix(), id)
    }

    /// Recover the model id from an attribute value, if it uses this kind's prefix
    pub fn parse_dom_id(self, attr: &str) -> Option<&str> {
        attr.strip_prefix(self.prefix()).filter(|id| !id.is_empty())
    }
}

/// Identifier source for new nodes.
///
/// Random mode hands out v4 UUIDs; sequential mode produces `<seed>-<n>`
/// so tests can predict ids.
#[derive(Debug, Clone, Default)]
pub struct IDGenerator {
    seed: Option<String>,
    count: u32,
}

impl IDGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequential(seed: impl Into<String>) -> Self {
        Self {
            seed: Some(seed.into()),
            count: 0,
        }
    }

    pub fn new_id(&mut self) -> String {
        match &self.seed {
            Some(seed) => {
                self.count += 1;
                format!("{}-{}", seed, self.count)
            }
            None => Uuid::new_v4().to_string(),
        }
    }
}
