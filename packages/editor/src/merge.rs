//! # Change Merging
//!
//! Applies an accepted [`PendingChange`] to the live template.
//!
//! Payloads are untrusted: element and section content is validated before
//! it is deserialized. Merges are written so that members of one batch
//! commute:
//!
//! - adds are anchored to `after_id`, a sibling that exists in both versions,
//!   and step past siblings added by the same batch with a lower `position`
//! - re-adding an id that is already present replaces it in place
//! - deletes of content that is already gone are no-ops
//! - `section_add` and `section_edit` replace the whole section and drop
//!   stale copies of its elements elsewhere
//! - `template_edit` reorders sections by rank, keeping unranked sections
//!   behind their current predecessor

use crate::change::{ChangeType, PendingChange};
use mailcraft_document::{Element, GlobalStyles, Section, Template};
use mailcraft_schema::{validate_element, validate_section, ValidationIssue, ValidationIssues};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MergeError {
    #[error("Change {0} carries no new content")]
    MissingContent(String),

    #[error("Change {change} carries invalid content:\n{issues}")]
    InvalidContent { change: String, issues: ValidationIssues },

    #[error("Content id {found} does not match target {target}")]
    IdMismatch { target: String, found: String },

    #[error("Target not found: {0}")]
    TargetNotFound(String),

    #[error("Parent not found: {0}")]
    ParentNotFound(String),
}

pub type MergeResult<T> = Result<T, MergeError>;

/// Merge `change` into `template`. `batch` holds the other members of the
/// change's batch and is only consulted to order sibling adds.
pub fn merge_change(
    template: &mut Template,
    change: &PendingChange,
    batch: &[PendingChange],
) -> MergeResult<()> {
    debug!(
        change = %change.id,
        kind = %change.change_type,
        target = %change.target_id,
        "merging change"
    );

    match change.change_type {
        ChangeType::ElementAdd => merge_element_add(template, change, batch),
        ChangeType::ElementEdit => merge_element_edit(template, change),
        ChangeType::ElementDelete => {
            if template.remove_element(&change.target_id).is_none() {
                debug!(target = %change.target_id, "element already removed");
            }
            Ok(())
        }
        ChangeType::SectionAdd => merge_section_add(template, change, batch),
        ChangeType::SectionEdit => merge_section_edit(template, change),
        ChangeType::SectionDelete => {
            let before = template.sections.len();
            template.sections.retain(|s| s.id != change.target_id);
            if template.sections.len() == before {
                debug!(target = %change.target_id, "section already removed");
            }
            Ok(())
        }
        ChangeType::TemplateEdit => merge_template_edit(template, change),
    }
}

fn merge_element_add(
    template: &mut Template,
    change: &PendingChange,
    batch: &[PendingChange],
) -> MergeResult<()> {
    let element = element_content(change)?;

    if let Some(existing) = template.element_mut(&change.target_id) {
        *existing = element;
        return Ok(());
    }

    let column = match &change.parent_id {
        Some(parent) => template
            .column_mut(parent)
            .ok_or_else(|| MergeError::ParentNotFound(parent.clone()))?,
        None => {
            let last = template
                .columns()
                .last()
                .map(|c| c.id.clone())
                .ok_or_else(|| MergeError::ParentNotFound(change.target_id.clone()))?;
            template
                .column_mut(&last)
                .ok_or(MergeError::ParentNotFound(last))?
        }
    };

    let siblings: Vec<&str> = column.elements.iter().map(Element::id).collect();
    let index = insertion_index(&siblings, change, batch);
    column.elements.insert(index, element);
    Ok(())
}

fn merge_element_edit(template: &mut Template, change: &PendingChange) -> MergeResult<()> {
    let element = element_content(change)?;
    let existing = template
        .element_mut(&change.target_id)
        .ok_or_else(|| MergeError::TargetNotFound(change.target_id.clone()))?;
    *existing = element;
    Ok(())
}

fn merge_section_add(
    template: &mut Template,
    change: &PendingChange,
    batch: &[PendingChange],
) -> MergeResult<()> {
    let section = section_content(change)?;
    drop_carried_elements(template, &section, &change.target_id);

    if let Some(existing) = template.section_mut(&change.target_id) {
        *existing = section;
        return Ok(());
    }

    let siblings: Vec<&str> = template.sections.iter().map(|s| s.id.as_str()).collect();
    let index = insertion_index(&siblings, change, batch);
    template.sections.insert(index, section);
    Ok(())
}

fn merge_section_edit(template: &mut Template, change: &PendingChange) -> MergeResult<()> {
    let section = section_content(change)?;
    let index = template
        .section_index(&change.target_id)
        .ok_or_else(|| MergeError::TargetNotFound(change.target_id.clone()))?;

    drop_carried_elements(template, &section, &change.target_id);
    template.sections[index] = section;
    Ok(())
}

/// Remove elements carried by `section` from every other section, so an
/// element moved between sections is never left behind in both
fn drop_carried_elements(template: &mut Template, section: &Section, target_id: &str) {
    let carried: HashSet<&str> = section.elements().map(Element::id).collect();
    for other in template.sections.iter_mut().filter(|s| s.id != target_id) {
        for column in other.rows.iter_mut().flat_map(|r| r.columns.iter_mut()) {
            column.elements.retain(|e| !carried.contains(e.id()));
        }
    }
}

fn merge_template_edit(template: &mut Template, change: &PendingChange) -> MergeResult<()> {
    let content = change
        .new_content
        .as_ref()
        .ok_or_else(|| MergeError::MissingContent(change.id.clone()))?;

    if let Some(name) = content.get("name") {
        match name.as_str().map(str::trim) {
            Some(name) if !name.is_empty() => template.name = name.to_string(),
            _ => return Err(invalid(change, "name", "must be a non-empty string")),
        }
    }

    if let Some(styles) = content.get("globalStyles") {
        template.global_styles = deserialize::<GlobalStyles>(change, styles, "globalStyles")?;
    }

    if let Some(order) = content.get("sectionOrder") {
        let order: Vec<String> = deserialize(change, order, "sectionOrder")?;
        reorder_sections(&mut template.sections, &order);
    }

    Ok(())
}

/// Stable reorder by rank in `order`. A section missing from `order` moves
/// with the section in front of it.
fn reorder_sections(sections: &mut Vec<Section>, order: &[String]) {
    let rank: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    let mut groups: Vec<(Option<usize>, Vec<Section>)> = Vec::new();
    for section in sections.drain(..) {
        match rank.get(section.id.as_str()) {
            Some(&r) => groups.push((Some(r), vec![section])),
            None => match groups.last_mut() {
                Some((_, group)) => group.push(section),
                None => groups.push((None, vec![section])),
            },
        }
    }

    // `None` sorts first, so sections ahead of every ranked one stay on top
    groups.sort_by_key(|(rank, _)| *rank);
    sections.extend(groups.into_iter().flat_map(|(_, group)| group));
}

/// Index after `after_id` (or at the front), past siblings added by the same
/// batch that belong before this one
fn insertion_index(siblings: &[&str], change: &PendingChange, batch: &[PendingChange]) -> usize {
    let mut index = match (&change.after_id, change.position) {
        (Some(after), position) => siblings
            .iter()
            .position(|id| *id == after.as_str())
            .map(|i| i + 1)
            .unwrap_or_else(|| position.unwrap_or(siblings.len()).min(siblings.len())),
        (None, Some(_)) => 0,
        (None, None) => siblings.len(),
    };

    let Some(position) = change.position else {
        return index;
    };

    let earlier: HashSet<&str> = batch
        .iter()
        .filter(|other| {
            other.id != change.id
                && other.change_type == change.change_type
                && other.parent_id == change.parent_id
                && other.position.is_some_and(|p| p < position)
        })
        .map(|other| other.target_id.as_str())
        .collect();

    while index < siblings.len() && earlier.contains(siblings[index]) {
        index += 1;
    }
    index
}

fn element_content(change: &PendingChange) -> MergeResult<Element> {
    let content = new_content(change)?;
    let issues = validate_element(content, "element");
    if !issues.is_empty() {
        return Err(MergeError::InvalidContent {
            change: change.id.clone(),
            issues: ValidationIssues::from(issues),
        });
    }
    let element: Element = deserialize(change, content, "element")?;
    check_id(change, element.id())?;
    Ok(element)
}

fn section_content(change: &PendingChange) -> MergeResult<Section> {
    let content = new_content(change)?;
    let issues = validate_section(content, "section");
    if !issues.is_empty() {
        return Err(MergeError::InvalidContent {
            change: change.id.clone(),
            issues: ValidationIssues::from(issues),
        });
    }
    let mut section: Section = deserialize(change, content, "section")?;
    check_id(change, &section.id)?;
    section.pending_deletion = false;
    Ok(section)
}

fn new_content(change: &PendingChange) -> MergeResult<&Value> {
    change
        .new_content
        .as_ref()
        .ok_or_else(|| MergeError::MissingContent(change.id.clone()))
}

fn check_id(change: &PendingChange, found: &str) -> MergeResult<()> {
    if found == change.target_id {
        Ok(())
    } else {
        Err(MergeError::IdMismatch {
            target: change.target_id.clone(),
            found: found.to_string(),
        })
    }
}

fn deserialize<T: DeserializeOwned>(
    change: &PendingChange,
    value: &Value,
    path: &str,
) -> MergeResult<T> {
    serde_json::from_value(value.clone()).map_err(|e| invalid(change, path, &e.to_string()))
}

fn invalid(change: &PendingChange, path: &str, message: &str) -> MergeError {
    MergeError::InvalidContent {
        change: change.id.clone(),
        issues: ValidationIssues::from(vec![ValidationIssue::new(path, message)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template() -> Template {
        serde_json::from_value(json!({
            "id": "t1",
            "name": "News",
            "version": 2,
            "sections": [
                { "id": "s1", "rows": [{ "id": "r1", "columns": [{ "id": "c1", "span": 12, "elements": [
                    { "type": "text", "id": "a", "properties": { "content": "A" } },
                    { "type": "text", "id": "b", "properties": { "content": "B" } }
                ] }] }] },
                { "id": "s2", "rows": [] }
            ]
        }))
        .unwrap()
    }

    fn text(id: &str, content: &str) -> Value {
        json!({ "type": "text", "id": id, "properties": { "content": content } })
    }

    fn add(id: &str, after: Option<&str>, position: usize) -> PendingChange {
        let mut change = PendingChange::new(format!("ch-{id}"), "p", "b", id, ChangeType::ElementAdd)
            .with_new(text(id, id))
            .with_parent("c1");
        change.after_id = after.map(str::to_string);
        change.position = Some(position);
        change
    }

    fn element_ids(template: &Template) -> Vec<String> {
        template.elements().map(|e| e.id().to_string()).collect()
    }

    #[test]
    fn test_sibling_adds_commute() {
        let batch = vec![add("x", None, 0), add("y", None, 1), add("z", Some("a"), 3)];

        let mut forward = template();
        for change in &batch {
            merge_change(&mut forward, change, &batch).unwrap();
        }
        let mut backward = template();
        for change in batch.iter().rev() {
            merge_change(&mut backward, change, &batch).unwrap();
        }

        assert_eq!(element_ids(&forward), vec!["x", "y", "a", "z", "b"]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_add_without_parent_appends() {
        let mut change = add("x", None, 0);
        change.parent_id = None;
        change.position = None;

        let mut template = template();
        merge_change(&mut template, &change, &[]).unwrap();
        assert_eq!(element_ids(&template), vec!["a", "b", "x"]);
    }

    #[test]
    fn test_invalid_content_is_rejected() {
        let change = PendingChange::new("ch", "p", "b", "a", ChangeType::ElementEdit).with_new(json!({
            "type": "button", "id": "a", "properties": { "content": "Go", "href": "" }
        }));

        let mut template = template();
        let err = merge_change(&mut template, &change, &[]).unwrap_err();
        match err {
            MergeError::InvalidContent { issues, .. } => assert!(issues.has_path("element.properties.href")),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(element_ids(&template), vec!["a", "b"]);
    }

    #[test]
    fn test_content_id_must_match_target() {
        let change = PendingChange::new("ch", "p", "b", "a", ChangeType::ElementEdit).with_new(text("other", "A"));
        assert_eq!(
            merge_change(&mut template(), &change, &[]).unwrap_err(),
            MergeError::IdMismatch {
                target: "a".to_string(),
                found: "other".to_string()
            }
        );
    }

    #[test]
    fn test_edit_of_missing_element_fails() {
        let change = PendingChange::new("ch", "p", "b", "zz", ChangeType::ElementEdit).with_new(text("zz", "Z"));
        assert_eq!(
            merge_change(&mut template(), &change, &[]).unwrap_err(),
            MergeError::TargetNotFound("zz".to_string())
        );
    }

    #[test]
    fn test_deletes_are_idempotent() {
        let mut template = template();
        let element = PendingChange::new("ch1", "p", "b", "a", ChangeType::ElementDelete);
        let section = PendingChange::new("ch2", "p", "b", "s2", ChangeType::SectionDelete);

        for _ in 0..2 {
            merge_change(&mut template, &element, &[]).unwrap();
            merge_change(&mut template, &section, &[]).unwrap();
        }

        assert_eq!(element_ids(&template), vec!["b"]);
        assert_eq!(template.sections.len(), 1);
    }

    #[test]
    fn test_section_edit_takes_elements_from_other_sections() {
        let mut template = template();
        let change = PendingChange::new("ch", "p", "b", "s2", ChangeType::SectionEdit).with_new(json!({
            "id": "s2",
            "rows": [{ "id": "r2", "columns": [{ "id": "c2", "span": 12, "elements": [text("b", "B moved")] }] }]
        }));

        merge_change(&mut template, &change, &[]).unwrap();

        assert_eq!(template.sections[0].elements().count(), 1);
        assert_eq!(template.parent_column_id("b"), Some("c2"));
    }

    #[test]
    fn test_section_add_takes_elements_from_other_sections() {
        let mut template = template();
        let mut change = PendingChange::new("ch", "p", "b", "s3", ChangeType::SectionAdd).with_new(json!({
            "id": "s3",
            "rows": [{ "id": "r3", "columns": [{ "id": "c3", "span": 12, "elements": [text("b", "B")] }] }]
        }));
        change.after_id = Some("s1".to_string());
        change.position = Some(1);

        merge_change(&mut template, &change, &[]).unwrap();

        assert_eq!(element_ids(&template), vec!["a", "b"]);
        assert_eq!(template.parent_column_id("b"), Some("c3"));
        let order: Vec<_> = template.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(order, vec!["s1", "s3", "s2"]);
    }

    #[test]
    fn test_reorder_keeps_unranked_behind_predecessor() {
        let mut template = template();
        template.sections.push(Section {
            id: "s3".to_string(),
            style: Default::default(),
            rows: Vec::new(),
            pending_deletion: false,
        });
        let change = PendingChange::new("ch", "p", "b", "t1", ChangeType::TemplateEdit)
            .with_new(json!({ "name": "Renamed", "sectionOrder": ["s3", "s1"] }));

        merge_change(&mut template, &change, &[]).unwrap();

        let order: Vec<_> = template.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(order, vec!["s3", "s1", "s2"]);
        assert_eq!(template.name, "Renamed");
    }
}
