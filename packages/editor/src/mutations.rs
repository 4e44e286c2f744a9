//! # Direct Mutations
//!
//! Semantic edits made by a person in the editor, as opposed to the
//! reviewable [`PendingChange`](crate::PendingChange)s that come from
//! generation.
//!
//! ## Semantics
//!
//! - Every mutation is checked before anything is written; a failed
//!   mutation leaves the template untouched.
//! - Element edits are validated with the same rules as generated payloads,
//!   so a direct edit cannot produce content the validator would reject.
//! - `UpdateContent` and `SetProperty` are atomic replacements, last write
//!   wins.
//! - `RemoveNode` removes a section, row, column or element together with
//!   everything it contains.

use mailcraft_common::{collect_ids, walk_column_mut, walk_row_mut, walk_section_mut, VisitorMut};
use mailcraft_document::{
    style, Column, Element, Fillable, GlobalStyles, Layout, Row, Section, Template,
};
use mailcraft_schema::rules::is_color;
use mailcraft_schema::{validate_element, ValidationIssues};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

const MIN_CONTENT_WIDTH: u32 = 320;
const MAX_CONTENT_WIDTH: u32 = 1200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Mutation {
    /// Replace the main text body of an element
    #[serde(rename_all = "camelCase")]
    UpdateContent { element_id: String, content: Fillable },

    /// Set one property of an element. `name` may be a dotted path into
    /// nested groups (`typography.color`); a null value clears the field.
    #[serde(rename_all = "camelCase")]
    SetProperty {
        element_id: String,
        name: String,
        value: Value,
    },

    #[serde(rename_all = "camelCase")]
    SetLayout { element_id: String, layout: Layout },

    /// Set or clear (`None`) a style property of a section, row or column
    #[serde(rename_all = "camelCase")]
    SetStyle {
        node_id: String,
        property: String,
        value: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    InsertElement {
        column_id: String,
        index: usize,
        element: Element,
    },

    /// Relocate an element, possibly into another section
    #[serde(rename_all = "camelCase")]
    MoveElement {
        element_id: String,
        column_id: String,
        index: usize,
    },

    #[serde(rename_all = "camelCase")]
    RemoveNode { node_id: String },

    RenameTemplate { name: String },

    SetGlobalStyles { styles: GlobalStyles },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Parent not found: {0}")]
    ParentNotFound(String),

    #[error("Element {0} has no text content")]
    NoContent(String),

    #[error("Edit would produce invalid content:\n{0}")]
    InvalidContent(ValidationIssues),

    #[error("Id already in use: {0}")]
    DuplicateId(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

pub type MutationResult<T> = Result<T, MutationError>;

impl Mutation {
    /// Apply mutation to the template with validation
    pub fn apply(&self, template: &mut Template) -> MutationResult<()> {
        self.validate(template)?;

        match self {
            Mutation::UpdateContent { element_id, content } => {
                let content = content.clone();
                Self::edit_element(template, element_id, |element| {
                    let slot = element
                        .content_mut()
                        .ok_or_else(|| MutationError::NoContent(element_id.clone()))?;
                    *slot = content;
                    Ok(())
                })
            }

            Mutation::SetProperty { element_id, name, value } => {
                Self::apply_set_property(template, element_id, name, value)
            }

            Mutation::SetLayout { element_id, layout } => {
                let layout = layout.clone();
                Self::edit_element(template, element_id, |element| {
                    *element.layout_mut() = layout;
                    Ok(())
                })
            }

            Mutation::SetStyle { node_id, property, value } => {
                let mut setter = StyleSetter {
                    node_id,
                    property: style::to_camel_case(property.trim()),
                    value: value.as_deref().map(str::trim),
                    found: false,
                };
                setter.visit_template_mut(template);
                Ok(())
            }

            Mutation::InsertElement { column_id, index, element } => {
                let column = template
                    .column_mut(column_id)
                    .ok_or_else(|| MutationError::ParentNotFound(column_id.clone()))?;
                let index = (*index).min(column.elements.len());
                column.elements.insert(index, element.clone());
                Ok(())
            }

            Mutation::MoveElement { element_id, column_id, index } => {
                let element = template
                    .remove_element(element_id)
                    .ok_or_else(|| MutationError::NodeNotFound(element_id.clone()))?;
                let column = template
                    .column_mut(column_id)
                    .ok_or_else(|| MutationError::ParentNotFound(column_id.clone()))?;
                let index = (*index).min(column.elements.len());
                column.elements.insert(index, element);
                Ok(())
            }

            Mutation::RemoveNode { node_id } => {
                let mut remover = NodeRemover { node_id, removed: false };
                remover.visit_template_mut(template);
                Ok(())
            }

            Mutation::RenameTemplate { name } => {
                template.name = name.trim().to_string();
                Ok(())
            }

            Mutation::SetGlobalStyles { styles } => {
                template.global_styles = styles.clone();
                Ok(())
            }
        }
    }

    /// Validate without applying
    pub fn validate(&self, template: &Template) -> MutationResult<()> {
        match self {
            Mutation::UpdateContent { element_id, .. } => {
                let element = find_element(template, element_id)?;
                if element.content().is_none() {
                    return Err(MutationError::NoContent(element_id.clone()));
                }
                Ok(())
            }

            Mutation::SetProperty { element_id, name, .. } => {
                find_element(template, element_id)?;
                if name.split('.').any(|segment| segment.trim().is_empty()) {
                    return Err(invalid_value("name", "property path has an empty segment"));
                }
                Ok(())
            }

            Mutation::SetLayout { element_id, .. } => {
                find_element(template, element_id)?;
                Ok(())
            }

            Mutation::SetStyle { node_id, property, value } => {
                if !has_styled_node(template, node_id) {
                    return if template.element(node_id).is_some() {
                        Err(invalid_value(
                            "nodeId",
                            "elements are styled through layout and properties",
                        ))
                    } else {
                        Err(MutationError::NodeNotFound(node_id.clone()))
                    };
                }
                if property.trim().is_empty() {
                    return Err(invalid_value("property", "must not be empty"));
                }
                if let Some(value) = value {
                    if value.trim().is_empty() {
                        return Err(invalid_value(property, "use no value to clear a style"));
                    }
                    if property.to_ascii_lowercase().ends_with("color") && !is_color(value) {
                        return Err(invalid_value(property, &format!("'{}' is not a color", value)));
                    }
                }
                Ok(())
            }

            Mutation::InsertElement { column_id, element, .. } => {
                if template.column(column_id).is_none() {
                    return Err(MutationError::ParentNotFound(column_id.clone()));
                }
                if collect_ids(template).iter().any(|(_, id)| id == element.id()) {
                    return Err(MutationError::DuplicateId(element.id().to_string()));
                }
                check_element(element)
            }

            Mutation::MoveElement { element_id, column_id, .. } => {
                find_element(template, element_id)?;
                if template.column(column_id).is_none() {
                    return Err(MutationError::ParentNotFound(column_id.clone()));
                }
                Ok(())
            }

            Mutation::RemoveNode { node_id } => {
                if has_styled_node(template, node_id) || template.element(node_id).is_some() {
                    Ok(())
                } else {
                    Err(MutationError::NodeNotFound(node_id.clone()))
                }
            }

            Mutation::RenameTemplate { name } => {
                if name.trim().is_empty() {
                    return Err(invalid_value("name", "must not be empty"));
                }
                Ok(())
            }

            Mutation::SetGlobalStyles { styles } => {
                if !is_color(&styles.background_color) {
                    return Err(invalid_value(
                        "backgroundColor",
                        &format!("'{}' is not a color", styles.background_color),
                    ));
                }
                if styles.font_family.trim().is_empty() {
                    return Err(invalid_value("fontFamily", "must not be empty"));
                }
                if !(MIN_CONTENT_WIDTH..=MAX_CONTENT_WIDTH).contains(&styles.content_width) {
                    return Err(invalid_value(
                        "contentWidth",
                        &format!("must be between {} and {}", MIN_CONTENT_WIDTH, MAX_CONTENT_WIDTH),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Edit a copy of the element and write it back only if it still validates
    fn edit_element<F>(template: &mut Template, element_id: &str, edit: F) -> MutationResult<()>
    where
        F: FnOnce(&mut Element) -> MutationResult<()>,
    {
        let slot = template
            .element_mut(element_id)
            .ok_or_else(|| MutationError::NodeNotFound(element_id.to_string()))?;

        let mut edited = slot.clone();
        edit(&mut edited)?;
        check_element(&edited)?;
        *slot = edited;
        Ok(())
    }

    fn apply_set_property(
        template: &mut Template,
        element_id: &str,
        name: &str,
        value: &Value,
    ) -> MutationResult<()> {
        Self::edit_element(template, element_id, |element| {
            let mut json = serde_json::to_value(&*element)
                .map_err(|e| invalid_value(name, &e.to_string()))?;

            let properties = json
                .get_mut("properties")
                .and_then(Value::as_object_mut)
                .ok_or_else(|| invalid_value(name, "element has no properties"))?;
            let path: Vec<&str> = name.split('.').map(str::trim).collect();
            set_path(properties, &path, value.clone());

            // Ill-typed values are reported with their path before serde sees them
            let issues = validate_element(&json, "element");
            if !issues.is_empty() {
                return Err(MutationError::InvalidContent(issues.into()));
            }
            *element =
                serde_json::from_value(json).map_err(|e| invalid_value(name, &e.to_string()))?;
            Ok(())
        })
    }
}

fn find_element<'a>(template: &'a Template, element_id: &str) -> MutationResult<&'a Element> {
    template
        .element(element_id)
        .ok_or_else(|| MutationError::NodeNotFound(element_id.to_string()))
}

fn check_element(element: &Element) -> MutationResult<()> {
    let value =
        serde_json::to_value(element).map_err(|e| invalid_value("element", &e.to_string()))?;
    let issues = validate_element(&value, "element");
    if issues.is_empty() {
        Ok(())
    } else {
        Err(MutationError::InvalidContent(issues.into()))
    }
}

fn invalid_value(field: &str, message: &str) -> MutationError {
    MutationError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Whether `id` names a section, row or column
fn has_styled_node(template: &Template, id: &str) -> bool {
    template.sections.iter().any(|section| {
        section.id == id
            || section
                .rows
                .iter()
                .any(|row| row.id == id || row.columns.iter().any(|column| column.id == id))
    })
}

fn set_path(object: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = object;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }

    if value.is_null() {
        current.remove(*last);
    } else {
        current.insert(last.to_string(), value);
    }
}

struct StyleSetter<'a> {
    node_id: &'a str,
    property: String,
    value: Option<&'a str>,
    found: bool,
}

impl StyleSetter<'_> {
    fn set(&mut self, style: &mut mailcraft_document::StyleMap) {
        match self.value {
            Some(value) => {
                style.insert(self.property.clone(), value.to_string());
            }
            None => {
                style.remove(&self.property);
            }
        }
        self.found = true;
    }
}

impl VisitorMut for StyleSetter<'_> {
    fn visit_section_mut(&mut self, section: &mut Section) {
        if self.found {
            return;
        }
        if section.id == self.node_id {
            self.set(&mut section.style);
            return;
        }
        walk_section_mut(self, section);
    }

    fn visit_row_mut(&mut self, row: &mut Row) {
        if self.found {
            return;
        }
        if row.id == self.node_id {
            self.set(&mut row.style);
            return;
        }
        walk_row_mut(self, row);
    }

    fn visit_column_mut(&mut self, column: &mut Column) {
        if !self.found && column.id == self.node_id {
            self.set(&mut column.style);
        }
    }
}

/// Detaches the first node with a matching id, whatever its depth
struct NodeRemover<'a> {
    node_id: &'a str,
    removed: bool,
}

impl VisitorMut for NodeRemover<'_> {
    fn visit_template_mut(&mut self, template: &mut Template) {
        if let Some(index) = template.sections.iter().position(|s| s.id == self.node_id) {
            template.sections.remove(index);
            self.removed = true;
            return;
        }
        for section in &mut template.sections {
            if self.removed {
                break;
            }
            self.visit_section_mut(section);
        }
    }

    fn visit_section_mut(&mut self, section: &mut Section) {
        if let Some(index) = section.rows.iter().position(|r| r.id == self.node_id) {
            section.rows.remove(index);
            self.removed = true;
            return;
        }
        walk_section_mut(self, section);
    }

    fn visit_row_mut(&mut self, row: &mut Row) {
        if self.removed {
            return;
        }
        if let Some(index) = row.columns.iter().position(|c| c.id == self.node_id) {
            row.columns.remove(index);
            self.removed = true;
            return;
        }
        walk_row_mut(self, row);
    }

    fn visit_column_mut(&mut self, column: &mut Column) {
        if self.removed {
            return;
        }
        if let Some(index) = column.elements.iter().position(|e| e.id() == self.node_id) {
            column.elements.remove(index);
            self.removed = true;
            return;
        }
        walk_column_mut(self, column);
    }
}
