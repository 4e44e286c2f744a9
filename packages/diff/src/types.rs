use crate::compare::ChangeMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Added,
    Removed,
    Modified,
    Unchanged,
}

/// Position change of an entity that exists in both versions.
///
/// Parents are absent for sections (their parent is the template).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_parent: Option<String>,
    pub from_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_parent: Option<String>,
    pub to_index: usize,
}

impl Move {
    pub fn changed_parent(&self) -> bool {
        self.from_parent != self.to_parent
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDiff {
    pub id: String,
    /// Element type tag (the old one for removed elements)
    #[serde(rename = "type")]
    pub element_type: String,
    pub status: DiffStatus,
    #[serde(default, skip_serializing_if = "ChangeMap::is_empty")]
    pub changes: ChangeMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moved: Option<Move>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDiff {
    pub id: String,
    pub status: DiffStatus,
    #[serde(default, skip_serializing_if = "ChangeMap::is_empty")]
    pub changes: ChangeMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moved: Option<Move>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowDiff {
    pub id: String,
    pub status: DiffStatus,
    #[serde(default, skip_serializing_if = "ChangeMap::is_empty")]
    pub changes: ChangeMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moved: Option<Move>,
    pub columns: Vec<ColumnDiff>,
}

/// Diff of one section. Elements are listed flat, in the new render order,
/// followed by the ones removed from this section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDiff {
    pub id: String,
    pub status: DiffStatus,
    #[serde(default, skip_serializing_if = "ChangeMap::is_empty")]
    pub changes: ChangeMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moved: Option<Move>,
    pub rows: Vec<RowDiff>,
    pub elements: Vec<ElementDiff>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionKind {
    /// Two nodes of the old template share the id
    DuplicateInOld,
    /// Two nodes of the new template share the id
    DuplicateInNew,
    /// The id names a different kind of node in each version
    KindMismatch,
    /// The id names elements of different types in each version
    TypeChanged,
}

/// An identifier whose reuse may alias two unrelated entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCollision {
    pub id: String,
    pub kind: CollisionKind,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDiffResult {
    pub has_changes: bool,
    /// Name and global style changes
    #[serde(default)]
    pub template_changes: ChangeMap,
    pub sections: Vec<SectionDiff>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collisions: Vec<IdCollision>,
}

/// Element counts per status, for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub moved: usize,
}

macro_rules! impl_changed {
    ($($ty:ty),*) => {
        $(impl $ty {
            /// Anything other than an unchanged entity in its old position
            pub fn is_changed(&self) -> bool {
                self.status != DiffStatus::Unchanged || self.moved.is_some()
            }
        })*
    };
}

impl_changed!(ElementDiff, ColumnDiff, RowDiff, SectionDiff);

impl SectionDiff {
    pub fn element(&self, id: &str) -> Option<&ElementDiff> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn row(&self, id: &str) -> Option<&RowDiff> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Every column diff of every row
    pub fn columns(&self) -> impl Iterator<Item = &ColumnDiff> {
        self.rows.iter().flat_map(|r| r.columns.iter())
    }
}

impl TemplateDiffResult {
    pub fn section(&self, id: &str) -> Option<&SectionDiff> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn elements(&self) -> impl Iterator<Item = &ElementDiff> {
        self.sections.iter().flat_map(|s| s.elements.iter())
    }

    pub fn element(&self, id: &str) -> Option<&ElementDiff> {
        self.elements().find(|e| e.id == id)
    }

    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary::default();
        for element in self.elements() {
            match element.status {
                DiffStatus::Added => summary.added += 1,
                DiffStatus::Removed => summary.removed += 1,
                DiffStatus::Modified => summary.modified += 1,
                DiffStatus::Unchanged => {}
            }
            if element.moved.is_some() {
                summary.moved += 1;
            }
        }
        summary
    }
}
