//! Identity-keyed template diffing
//!
//! Every node is matched by id across the whole template, not by position,
//! so an element that moved to another column is reported once, as moved,
//! under the section that holds it now.

use crate::compare::{diff_values, ChangeMap};
use crate::types::*;
use mailcraft_common::{collect_ids, duplicate_ids};
use mailcraft_document::{Column, Element, NodeKind, Row, Section, Template};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Keep entities that neither changed nor moved in the result
    pub report_unchanged: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            report_unchanged: true,
        }
    }
}

/// Diff two versions of a template. Neither input is modified.
pub fn diff_templates(old: &Template, new: &Template) -> TemplateDiffResult {
    diff_templates_with_options(old, new, &DiffOptions::default())
}

#[instrument(skip_all, fields(old = %old.id, new = %new.id))]
pub fn diff_templates_with_options(
    old: &Template,
    new: &Template,
    options: &DiffOptions,
) -> TemplateDiffResult {
    let differ = Differ {
        old: Index::build(old),
        new: Index::build(new),
    };

    let collisions = differ.collisions(old, new);
    for collision in &collisions {
        warn!(id = %collision.id, kind = ?collision.kind, "{}", collision.detail);
    }

    let template_changes = diff_values(&template_snapshot(old), &template_snapshot(new));

    let mut sections: Vec<SectionDiff> = new
        .sections
        .iter()
        .enumerate()
        .map(|(index, section)| differ.section(index, section))
        .collect();
    sections.extend(
        old.sections
            .iter()
            .filter(|s| !differ.new.sections.contains_key(s.id.as_str()))
            .map(|s| differ.removed_section(s)),
    );

    let has_changes = !template_changes.is_empty() || sections.iter().any(SectionDiff::is_changed);

    if !options.report_unchanged {
        prune(&mut sections);
    }

    debug!(sections = sections.len(), has_changes, "diffed templates");

    TemplateDiffResult {
        has_changes,
        template_changes,
        sections,
        collisions,
    }
}

fn prune(sections: &mut Vec<SectionDiff>) {
    sections.retain(SectionDiff::is_changed);
    for section in sections {
        section.rows.retain(RowDiff::is_changed);
        for row in &mut section.rows {
            row.columns.retain(ColumnDiff::is_changed);
        }
        section.elements.retain(ElementDiff::is_changed);
    }
}

struct Entry<'a, T> {
    parent: &'a str,
    index: usize,
    node: &'a T,
}

/// Nodes of one template by id. The first node seen wins a duplicated id.
struct Index<'a> {
    sections: HashMap<&'a str, (usize, &'a Section)>,
    rows: HashMap<&'a str, Entry<'a, Row>>,
    columns: HashMap<&'a str, Entry<'a, Column>>,
    elements: HashMap<&'a str, Entry<'a, Element>>,
}

impl<'a> Index<'a> {
    fn build(template: &'a Template) -> Self {
        let mut index = Index {
            sections: HashMap::new(),
            rows: HashMap::new(),
            columns: HashMap::new(),
            elements: HashMap::new(),
        };

        for (si, section) in template.sections.iter().enumerate() {
            index.sections.entry(section.id.as_str()).or_insert((si, section));
            for (ri, row) in section.rows.iter().enumerate() {
                index.rows.entry(row.id.as_str()).or_insert(Entry {
                    parent: &section.id,
                    index: ri,
                    node: row,
                });
                for (ci, column) in row.columns.iter().enumerate() {
                    index.columns.entry(column.id.as_str()).or_insert(Entry {
                        parent: &row.id,
                        index: ci,
                        node: column,
                    });
                    for (ei, element) in column.elements.iter().enumerate() {
                        index.elements.entry(element.id()).or_insert(Entry {
                            parent: &column.id,
                            index: ei,
                            node: element,
                        });
                    }
                }
            }
        }

        index
    }

    fn contains(&self, kind: NodeKind, id: &str) -> bool {
        match kind {
            NodeKind::Section => self.sections.contains_key(id),
            NodeKind::Row => self.rows.contains_key(id),
            NodeKind::Column => self.columns.contains_key(id),
            NodeKind::Element => self.elements.contains_key(id),
        }
    }

    fn kind_of(&self, id: &str) -> Option<NodeKind> {
        [NodeKind::Section, NodeKind::Row, NodeKind::Column, NodeKind::Element]
            .into_iter()
            .find(|kind| self.contains(*kind, id))
    }
}

struct Differ<'a> {
    old: Index<'a>,
    new: Index<'a>,
}

impl<'a> Differ<'a> {
    fn collisions(&self, old: &Template, new: &Template) -> Vec<IdCollision> {
        let mut collisions = Vec::new();

        for id in duplicate_ids(old) {
            collisions.push(IdCollision {
                detail: format!("id {id:?} is used by more than one node of the old template"),
                id,
                kind: CollisionKind::DuplicateInOld,
            });
        }
        for id in duplicate_ids(new) {
            collisions.push(IdCollision {
                detail: format!("id {id:?} is used by more than one node of the new template"),
                id,
                kind: CollisionKind::DuplicateInNew,
            });
        }

        for (kind, id) in collect_ids(new) {
            if self.old.contains(kind, &id) {
                continue;
            }
            if let Some(old_kind) = self.old.kind_of(&id) {
                collisions.push(IdCollision {
                    detail: format!("id {id:?} was a {old_kind:?} and is now a {kind:?}"),
                    id,
                    kind: CollisionKind::KindMismatch,
                });
            }
        }

        for (id, entry) in &self.new.elements {
            if let Some(old) = self.old.elements.get(id) {
                if old.node.kind() != entry.node.kind() {
                    collisions.push(IdCollision {
                        id: id.to_string(),
                        kind: CollisionKind::TypeChanged,
                        detail: format!(
                            "element {id:?} changed type from {} to {}",
                            old.node.kind(),
                            entry.node.kind()
                        ),
                    });
                }
            }
        }
        collisions.sort_by(|a, b| a.id.cmp(&b.id).then(a.detail.cmp(&b.detail)));

        collisions
    }

    fn section(&self, to_index: usize, section: &Section) -> SectionDiff {
        let Some(&(from_index, old)) = self.old.sections.get(section.id.as_str()) else {
            return SectionDiff {
                id: section.id.clone(),
                status: DiffStatus::Added,
                changes: ChangeMap::new(),
                moved: None,
                rows: self.rows(Some(section), None),
                elements: self.elements(Some(section), None),
            };
        };

        let changes = diff_values(&section_snapshot(old), &section_snapshot(section));
        let moved = (from_index != to_index).then(|| Move {
            from_parent: None,
            from_index,
            to_parent: None,
            to_index,
        });
        let rows = self.rows(Some(section), Some(old));
        let elements = self.elements(Some(section), Some(old));

        let modified = !changes.is_empty()
            || rows.iter().any(RowDiff::is_changed)
            || elements.iter().any(ElementDiff::is_changed)
            || departed(
                old.rows.iter().map(|r| r.id.as_str()),
                section.rows.iter().map(|r| r.id.as_str()),
            )
            || departed(old.elements().map(Element::id), section.elements().map(Element::id));

        SectionDiff {
            id: section.id.clone(),
            status: status(modified),
            changes,
            moved,
            rows,
            elements,
        }
    }

    fn removed_section(&self, section: &Section) -> SectionDiff {
        SectionDiff {
            id: section.id.clone(),
            status: DiffStatus::Removed,
            changes: ChangeMap::new(),
            moved: None,
            rows: self.rows(None, Some(section)),
            elements: self.elements(None, Some(section)),
        }
    }

    fn rows(&self, new: Option<&Section>, old: Option<&Section>) -> Vec<RowDiff> {
        let mut diffs = Vec::new();

        if let Some(section) = new {
            for (to_index, row) in section.rows.iter().enumerate() {
                diffs.push(self.row(&section.id, to_index, row));
            }
        }
        if let Some(section) = old {
            for row in &section.rows {
                if !self.new.rows.contains_key(row.id.as_str()) {
                    diffs.push(RowDiff {
                        id: row.id.clone(),
                        status: DiffStatus::Removed,
                        changes: ChangeMap::new(),
                        moved: None,
                        columns: self.columns(None, Some(row)),
                    });
                }
            }
        }

        diffs
    }

    fn row(&self, section_id: &str, to_index: usize, row: &Row) -> RowDiff {
        let Some(entry) = self.old.rows.get(row.id.as_str()) else {
            return RowDiff {
                id: row.id.clone(),
                status: DiffStatus::Added,
                changes: ChangeMap::new(),
                moved: None,
                columns: self.columns(Some(row), None),
            };
        };

        let changes = diff_values(&style_snapshot(&entry.node.style), &style_snapshot(&row.style));
        let columns = self.columns(Some(row), Some(entry.node));
        let modified = !changes.is_empty()
            || columns.iter().any(ColumnDiff::is_changed)
            || departed(
                entry.node.columns.iter().map(|c| c.id.as_str()),
                row.columns.iter().map(|c| c.id.as_str()),
            );

        RowDiff {
            id: row.id.clone(),
            status: status(modified),
            changes,
            moved: moved(entry, section_id, to_index),
            columns,
        }
    }

    fn columns(&self, new: Option<&Row>, old: Option<&Row>) -> Vec<ColumnDiff> {
        let mut diffs = Vec::new();

        if let Some(row) = new {
            for (to_index, column) in row.columns.iter().enumerate() {
                let diff = match self.old.columns.get(column.id.as_str()) {
                    Some(entry) => {
                        let changes =
                            diff_values(&column_snapshot(entry.node), &column_snapshot(column));
                        ColumnDiff {
                            id: column.id.clone(),
                            status: status(!changes.is_empty()),
                            changes,
                            moved: moved(entry, &row.id, to_index),
                        }
                    }
                    None => ColumnDiff {
                        id: column.id.clone(),
                        status: DiffStatus::Added,
                        changes: ChangeMap::new(),
                        moved: None,
                    },
                };
                diffs.push(diff);
            }
        }
        if let Some(row) = old {
            for column in &row.columns {
                if !self.new.columns.contains_key(column.id.as_str()) {
                    diffs.push(ColumnDiff {
                        id: column.id.clone(),
                        status: DiffStatus::Removed,
                        changes: ChangeMap::new(),
                        moved: None,
                    });
                }
            }
        }

        diffs
    }

    fn elements(&self, new: Option<&Section>, old: Option<&Section>) -> Vec<ElementDiff> {
        let mut diffs = Vec::new();

        if let Some(section) = new {
            for column in section.rows.iter().flat_map(|r| r.columns.iter()) {
                for (to_index, element) in column.elements.iter().enumerate() {
                    diffs.push(self.element(&column.id, to_index, element));
                }
            }
        }
        if let Some(section) = old {
            for element in section.elements() {
                if !self.new.elements.contains_key(element.id()) {
                    diffs.push(ElementDiff {
                        id: element.id().to_string(),
                        element_type: element.kind().tag().to_string(),
                        status: DiffStatus::Removed,
                        changes: ChangeMap::new(),
                        moved: None,
                    });
                }
            }
        }

        diffs
    }

    fn element(&self, column_id: &str, to_index: usize, element: &Element) -> ElementDiff {
        let element_type = element.kind().tag().to_string();

        let Some(entry) = self.old.elements.get(element.id()) else {
            return ElementDiff {
                id: element.id().to_string(),
                element_type,
                status: DiffStatus::Added,
                changes: ChangeMap::new(),
                moved: None,
            };
        };

        let changes = diff_values(&element_snapshot(entry.node), &element_snapshot(element));

        ElementDiff {
            id: element.id().to_string(),
            element_type,
            status: status(!changes.is_empty()),
            changes,
            moved: moved(entry, column_id, to_index),
        }
    }
}

fn status(modified: bool) -> DiffStatus {
    if modified {
        DiffStatus::Modified
    } else {
        DiffStatus::Unchanged
    }
}

/// Whether some child of the old node is no longer a child of the new one
fn departed<'b>(old: impl Iterator<Item = &'b str>, new: impl Iterator<Item = &'b str>) -> bool {
    let current: HashSet<&str> = new.collect();
    old.into_iter().any(|id| !current.contains(id))
}

fn moved<T>(old: &Entry<'_, T>, to_parent: &str, to_index: usize) -> Option<Move> {
    if old.parent == to_parent && old.index == to_index {
        return None;
    }
    Some(Move {
        from_parent: Some(old.parent.to_string()),
        from_index: old.index,
        to_parent: Some(to_parent.to_string()),
        to_index,
    })
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

// Snapshots hold only the fields a node owns. Ids and children are matched
// separately and `pendingDeletion` is review state, not content.

fn template_snapshot(template: &Template) -> Value {
    json!({
        "name": template.name,
        "globalStyles": to_json(&template.global_styles),
    })
}

fn section_snapshot(section: &Section) -> Value {
    style_snapshot(&section.style)
}

fn style_snapshot(style: &mailcraft_document::StyleMap) -> Value {
    json!({ "style": to_json(style) })
}

fn column_snapshot(column: &Column) -> Value {
    json!({ "span": column.span, "style": to_json(&column.style) })
}

/// `type`, `layout` and the element's properties, flattened to one level
fn element_snapshot(element: &Element) -> Value {
    let mut snapshot = Map::new();
    snapshot.insert("type".to_string(), Value::from(element.kind().tag()));
    snapshot.insert("layout".to_string(), to_json(element.layout()));

    if let Value::Object(mut fields) = to_json(element) {
        if let Some(Value::Object(properties)) = fields.remove("properties") {
            snapshot.extend(properties);
        }
    }

    Value::Object(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailcraft_document::{Fillable, Layout, TextProps, Typography};

    fn text(id: &str, content: &str) -> Element {
        Element::Text {
            id: id.to_string(),
            layout: Layout::default(),
            properties: TextProps {
                content: Fillable::value(content),
                typography: Typography::default(),
            },
        }
    }

    #[test]
    fn test_element_snapshot_is_flat() {
        let snapshot = element_snapshot(&text("e1", "Hi"));

        assert_eq!(snapshot["type"], "text");
        assert_eq!(snapshot["content"], "Hi");
        assert!(snapshot.get("id").is_none());
        assert!(snapshot.get("properties").is_none());
        assert!(snapshot["layout"].is_object());
    }

    #[test]
    fn test_pending_deletion_is_ignored() {
        let mut old = Template::new("t", "T");
        old.sections.push(Section {
            id: "s1".to_string(),
            style: Default::default(),
            rows: Vec::new(),
            pending_deletion: false,
        });
        let mut new = old.clone();
        new.sections[0].pending_deletion = true;

        let diff = diff_templates(&old, &new);
        assert!(!diff.has_changes);
    }
}
