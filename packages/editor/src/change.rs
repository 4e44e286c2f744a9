//! # Change Records
//!
//! A [`PendingChange`] is one reviewable proposal against the live template.
//! Changes are produced in batches (one per generation request) by
//! [`changes_from_diff`] and resolved by the
//! [`ChangeBatchManager`](crate::ChangeBatchManager).
//!
//! ## Granularity
//!
//! Members of a batch never touch the same content, so they can be accepted
//! in any order:
//!
//! - template name, global styles and section order form one `template_edit`
//! - added and removed sections are one change each
//! - a section whose style or row/column skeleton changed, or whose
//!   surviving elements were reordered or moved between columns, becomes a
//!   single `section_edit` carrying the whole new section
//! - every other section contributes one change per added, removed or
//!   modified element

use mailcraft_diff::{DiffStatus, SectionDiff, TemplateDiffResult};
use mailcraft_document::{Column, Element, IDGenerator, Section, Template};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    ElementAdd,
    ElementEdit,
    ElementDelete,
    SectionAdd,
    SectionEdit,
    SectionDelete,
    /// Name, global styles and section order
    TemplateEdit,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::ElementAdd => "element_add",
            ChangeType::ElementEdit => "element_edit",
            ChangeType::ElementDelete => "element_delete",
            ChangeType::SectionAdd => "section_add",
            ChangeType::SectionEdit => "section_edit",
            ChangeType::SectionDelete => "section_delete",
            ChangeType::TemplateEdit => "template_edit",
        }
    }

    pub fn is_add(self) -> bool {
        matches!(self, ChangeType::ElementAdd | ChangeType::SectionAdd)
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `pending` is the only state with outgoing transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ChangeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeStatus::Pending => "pending",
            ChangeStatus::Accepted => "accepted",
            ChangeStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted change record. Field names are the storage column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingChange {
    pub id: String,
    pub project_id: String,
    pub batch_id: String,
    pub target_id: String,
    pub change_type: ChangeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_content: Option<Value>,
    pub status: ChangeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_rationale: Option<String>,
    /// Column holding the element (elements only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Index in the new sibling sequence (adds only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    /// Nearest preceding sibling present in both versions (adds only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_id: Option<String>,
}

impl PendingChange {
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        batch_id: impl Into<String>,
        target_id: impl Into<String>,
        change_type: ChangeType,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            batch_id: batch_id.into(),
            target_id: target_id.into(),
            change_type,
            old_content: None,
            new_content: None,
            status: ChangeStatus::Pending,
            ai_rationale: None,
            parent_id: None,
            position: None,
            after_id: None,
        }
    }

    pub fn with_old(mut self, content: Value) -> Self {
        self.old_content = Some(content);
        self
    }

    pub fn with_new(mut self, content: Value) -> Self {
        self.new_content = Some(content);
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.ai_rationale = Some(rationale.into());
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == ChangeStatus::Pending
    }
}

/// Where a batch of changes comes from
#[derive(Debug, Clone)]
pub struct ChangeContext {
    pub project_id: String,
    pub batch_id: String,
    pub rationale: Option<String>,
}

impl ChangeContext {
    pub fn new(project_id: impl Into<String>, batch_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            batch_id: batch_id.into(),
            rationale: None,
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }
}

/// Turn a diff of `old` -> `new` into one batch of pending changes
pub fn changes_from_diff(
    old: &Template,
    new: &Template,
    diff: &TemplateDiffResult,
    context: &ChangeContext,
    ids: &mut IDGenerator,
) -> Vec<PendingChange> {
    let mut builder = Builder {
        context,
        ids,
        old: Lookup::build(old),
        new: Lookup::build(new),
        old_sections: old.sections.iter().map(|s| s.id.as_str()).collect(),
        changes: Vec::new(),
    };

    builder.template_edit(old, new, diff);

    for section_diff in &diff.sections {
        match section_diff.status {
            DiffStatus::Added => builder.section_add(new, section_diff),
            DiffStatus::Removed => builder.section_delete(old, section_diff),
            DiffStatus::Modified | DiffStatus::Unchanged => {
                let (Some(before), Some(after)) =
                    (old.section(&section_diff.id), new.section(&section_diff.id))
                else {
                    continue;
                };
                if needs_section_edit(section_diff, before, after, &builder) {
                    builder.section_edit(before, after);
                } else {
                    builder.element_changes(section_diff);
                }
            }
        }
    }

    debug!(
        batch = %context.batch_id,
        changes = builder.changes.len(),
        "generated changes from diff"
    );

    builder.changes
}

/// Elements of one template by id, with their column and index
struct Lookup<'a> {
    elements: HashMap<&'a str, (&'a Column, usize, &'a Element)>,
}

impl<'a> Lookup<'a> {
    fn build(template: &'a Template) -> Self {
        let mut elements = HashMap::new();
        for column in template.columns() {
            for (index, element) in column.elements.iter().enumerate() {
                elements.entry(element.id()).or_insert((column, index, element));
            }
        }
        Self { elements }
    }

    fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }
}

struct Builder<'a> {
    context: &'a ChangeContext,
    ids: &'a mut IDGenerator,
    old: Lookup<'a>,
    new: Lookup<'a>,
    old_sections: HashSet<&'a str>,
    changes: Vec<PendingChange>,
}

impl<'a> Builder<'a> {
    fn push(&mut self, change: PendingChange) {
        let change = match &self.context.rationale {
            Some(rationale) => change.with_rationale(rationale.clone()),
            None => change,
        };
        self.changes.push(change);
    }

    fn change(&mut self, target_id: &str, change_type: ChangeType) -> PendingChange {
        PendingChange::new(
            self.ids.new_id(),
            &self.context.project_id,
            &self.context.batch_id,
            target_id,
            change_type,
        )
    }

    fn template_edit(&mut self, old: &Template, new: &Template, diff: &TemplateDiffResult) {
        let surviving_old: Vec<&str> = old
            .sections
            .iter()
            .map(|s| s.id.as_str())
            .filter(|id| new.section(id).is_some())
            .collect();
        let surviving_new: Vec<&str> = new
            .sections
            .iter()
            .map(|s| s.id.as_str())
            .filter(|id| old.section(id).is_some())
            .collect();
        let reordered = surviving_old != surviving_new;

        if diff.template_changes.is_empty() && !reordered {
            return;
        }

        let mut before = json!({ "name": old.name, "globalStyles": to_json(&old.global_styles) });
        let mut after = json!({ "name": new.name, "globalStyles": to_json(&new.global_styles) });
        if reordered {
            before["sectionOrder"] = json!(old.sections.iter().map(|s| &s.id).collect::<Vec<_>>());
            after["sectionOrder"] = json!(new.sections.iter().map(|s| &s.id).collect::<Vec<_>>());
        }

        let change = self
            .change(&old.id, ChangeType::TemplateEdit)
            .with_old(before)
            .with_new(after);
        self.push(change);
    }

    fn section_add(&mut self, new: &Template, diff: &SectionDiff) {
        let Some(position) = new.section_index(&diff.id) else {
            return;
        };
        let after_id = new.sections[..position]
            .iter()
            .rev()
            .find(|s| self.old_sections.contains(s.id.as_str()))
            .map(|s| s.id.clone());

        let mut change = self
            .change(&diff.id, ChangeType::SectionAdd)
            .with_new(to_json(&new.sections[position]));
        change.position = Some(position);
        change.after_id = after_id;
        self.push(change);
    }

    fn section_delete(&mut self, old: &Template, diff: &SectionDiff) {
        let Some(section) = old.section(&diff.id) else {
            return;
        };
        let change = self.change(&diff.id, ChangeType::SectionDelete).with_old(to_json(section));
        self.push(change);
    }

    fn section_edit(&mut self, before: &Section, after: &Section) {
        let change = self
            .change(&after.id, ChangeType::SectionEdit)
            .with_old(to_json(before))
            .with_new(to_json(after));
        self.push(change);
    }

    fn element_changes(&mut self, diff: &SectionDiff) {
        for element_diff in &diff.elements {
            match element_diff.status {
                DiffStatus::Added => {
                    let Some(&(column, position, element)) =
                        self.new.elements.get(element_diff.id.as_str())
                    else {
                        continue;
                    };
                    let after_id = column.elements[..position]
                        .iter()
                        .rev()
                        .find(|e| self.old.contains(e.id()))
                        .map(|e| e.id().to_string());

                    let mut change = self
                        .change(&element_diff.id, ChangeType::ElementAdd)
                        .with_new(to_json(element))
                        .with_parent(&column.id);
                    change.position = Some(position);
                    change.after_id = after_id;
                    self.push(change);
                }
                DiffStatus::Removed => {
                    let Some(&(column, _, element)) =
                        self.old.elements.get(element_diff.id.as_str())
                    else {
                        continue;
                    };
                    let change = self
                        .change(&element_diff.id, ChangeType::ElementDelete)
                        .with_old(to_json(element))
                        .with_parent(&column.id);
                    self.push(change);
                }
                DiffStatus::Modified => {
                    let (Some(&(_, _, before)), Some(&(column, _, after))) = (
                        self.old.elements.get(element_diff.id.as_str()),
                        self.new.elements.get(element_diff.id.as_str()),
                    ) else {
                        continue;
                    };
                    let change = self
                        .change(&element_diff.id, ChangeType::ElementEdit)
                        .with_old(to_json(before))
                        .with_new(to_json(after))
                        .with_parent(&column.id);
                    self.push(change);
                }
                DiffStatus::Unchanged => {}
            }
        }
    }
}

/// Whether a surviving section must be replaced as a whole
fn needs_section_edit(
    diff: &SectionDiff,
    before: &Section,
    after: &Section,
    builder: &Builder<'_>,
) -> bool {
    if !diff.changes.is_empty()
        || diff.rows.iter().any(|r| r.is_changed())
        || diff.columns().any(|c| c.is_changed())
    {
        return true;
    }

    // Skeleton is identical, so every column exists on both sides. Compare
    // the elements that survive in each column, in order.
    let old_columns: HashMap<&str, &Column> = before
        .rows
        .iter()
        .flat_map(|r| r.columns.iter())
        .map(|c| (c.id.as_str(), c))
        .collect();

    for column in after.rows.iter().flat_map(|r| r.columns.iter()) {
        let Some(old_column) = old_columns.get(column.id.as_str()) else {
            return true;
        };
        let kept_now: Vec<&str> = column
            .elements
            .iter()
            .map(Element::id)
            .filter(|id| builder.old.contains(id))
            .collect();
        let kept_before: Vec<&str> = old_column
            .elements
            .iter()
            .map(Element::id)
            .filter(|id| builder.new.contains(id))
            .collect();
        if kept_now != kept_before {
            return true;
        }
    }

    false
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
