use crate::error::{SchemaError, SchemaResult, ValidationIssue, ValidationIssues};
use crate::rules::{is_color, FieldShape};
use mailcraft_document::{ElementKind, Template, SCHEMA_VERSION};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

type Object = Map<String, Value>;

const ALIGNMENTS: &[&str] = &["left", "center", "right"];
const LINE_STYLES: &[&str] = &["solid", "dashed", "dotted"];
const APP_STORES: &[&str] = &["apple", "google"];
const SPACING_SIDES: &[&str] = &["top", "right", "bottom", "left"];

/// Validate a payload and, when it conforms, return the typed template
#[instrument(skip_all)]
pub fn validate_template(payload: &Value) -> SchemaResult<Template> {
    let mut validator = Validator::new();
    validator.template(payload);

    if !validator.issues.is_empty() {
        debug!(issues = validator.issues.len(), "Template payload rejected");
        return Err(SchemaError::Invalid(validator.into_issues()));
    }

    serde_json::from_value(payload.clone()).map_err(|e| {
        SchemaError::Invalid(ValidationIssues::from(vec![ValidationIssue::new(
            "",
            format!("payload does not match the document model: {e}"),
        )]))
    })
}

/// Parse JSON text and validate it
pub fn validate_json(text: &str) -> SchemaResult<Template> {
    let payload: Value = serde_json::from_str(text)?;
    validate_template(&payload)
}

/// Validate a single element payload rooted at `path`
pub fn validate_element(element: &Value, path: &str) -> Vec<ValidationIssue> {
    let mut validator = Validator::new();
    validator.element(element, path);
    validator.into_issues().into_inner()
}

/// Validate a single section payload, with everything it contains, rooted at `path`
pub fn validate_section(section: &Value, path: &str) -> Vec<ValidationIssue> {
    let mut validator = Validator::new();
    validator.section(section, path);
    validator.into_issues().into_inner()
}

/// Re-check an already typed template, e.g. after an edit
pub fn check_template(template: &Template) -> Vec<ValidationIssue> {
    match serde_json::to_value(template) {
        Ok(value) => {
            let mut validator = Validator::new();
            validator.template(&value);
            validator.into_issues().into_inner()
        }
        Err(e) => vec![ValidationIssue::new("", format!("template is not serializable: {e}"))],
    }
}

fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn index(path: &str, i: usize) -> String {
    format!("{path}[{i}]")
}

/// Walks an untyped payload and records every deviation from the model
#[derive(Debug, Default)]
pub struct Validator {
    issues: Vec<ValidationIssue>,
    /// id -> path where it was first declared
    seen_ids: HashMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> ValidationIssues {
        ValidationIssues::from(self.issues)
    }

    fn issue(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(path, message));
    }

    // -----------------------------------------------------------------------
    // Tree
    // -----------------------------------------------------------------------

    pub fn template(&mut self, value: &Value) {
        let Some(obj) = value.as_object() else {
            self.issue("", "template must be an object");
            return;
        };

        self.id(obj, "");
        self.string(obj, "name", "", true, false);

        match obj.get("version") {
            None => self.issue("version", "is required"),
            Some(v) if v.as_u64() == Some(SCHEMA_VERSION as u64) => {}
            Some(v) => self.issue(
                "version",
                format!("unsupported document version {v}, expected {SCHEMA_VERSION}"),
            ),
        }

        if let Some(styles) = self.object(obj, "globalStyles", "", false) {
            let path = "globalStyles";
            self.color(styles, "backgroundColor", path, false);
            self.string(styles, "fontFamily", path, false, true);
            self.integer(styles, "contentWidth", path, false, 320, 1200);
        }

        if let Some(sections) = self.array(obj, "sections", "", true) {
            for (i, section) in sections.iter().enumerate() {
                self.section(section, &index("sections", i));
            }
        }
    }

    pub fn section(&mut self, value: &Value, path: &str) {
        let Some(obj) = value.as_object() else {
            self.issue(path, "section must be an object");
            return;
        };

        self.id(obj, path);
        self.style_map(obj, path);
        self.boolean(obj, "pendingDeletion", path);

        if let Some(rows) = self.array(obj, "rows", path, true) {
            let rows_path = child(path, "rows");
            for (i, row) in rows.iter().enumerate() {
                self.row(row, &index(&rows_path, i));
            }
        }
    }

    fn row(&mut self, value: &Value, path: &str) {
        let Some(obj) = value.as_object() else {
            self.issue(path, "row must be an object");
            return;
        };

        self.id(obj, path);
        self.style_map(obj, path);

        if let Some(columns) = self.array(obj, "columns", path, true) {
            let columns_path = child(path, "columns");
            let mut span_total = 0;
            for (i, column) in columns.iter().enumerate() {
                self.column(column, &index(&columns_path, i));
                span_total += column.get("span").and_then(Value::as_u64).unwrap_or(0);
            }
            if span_total > 12 {
                warn!(path = %path, span_total, "Column spans exceed the 12-column grid");
            }
        }
    }

    fn column(&mut self, value: &Value, path: &str) {
        let Some(obj) = value.as_object() else {
            self.issue(path, "column must be an object");
            return;
        };

        self.id(obj, path);
        self.integer(obj, "span", path, true, 1, 12);
        self.style_map(obj, path);

        if let Some(elements) = self.array(obj, "elements", path, false) {
            let elements_path = child(path, "elements");
            for (i, element) in elements.iter().enumerate() {
                self.element(element, &index(&elements_path, i));
            }
        }
    }

    pub fn element(&mut self, value: &Value, path: &str) {
        let Some(obj) = value.as_object() else {
            self.issue(path, "element must be an object");
            return;
        };

        self.id(obj, path);

        if let Some(layout) = self.object(obj, "layout", path, false) {
            self.layout(layout, &child(path, "layout"));
        }

        let kind = match obj.get("type") {
            None => {
                self.issue(child(path, "type"), "is required");
                return;
            }
            Some(Value::String(tag)) => match ElementKind::from_tag(tag) {
                Some(kind) => kind,
                None => {
                    self.issue(child(path, "type"), format!("unknown element type '{tag}'"));
                    return;
                }
            },
            Some(_) => {
                self.issue(child(path, "type"), "must be a string");
                return;
            }
        };

        // Dividers fall back to default properties.
        let required = kind != ElementKind::Divider;
        if let Some(props) = self.object(obj, "properties", path, required) {
            self.properties(kind, props, &child(path, "properties"));
        }
    }

    /// Kind-directed property rules. Every kind must be listed here.
    fn properties(&mut self, kind: ElementKind, props: &Object, path: &str) {
        match kind {
            ElementKind::Header => {
                self.fillable(props, "content", path, FieldShape::Text, true);
                self.integer(props, "level", path, true, 1, 6);
                self.typography(props, path);
            }
            ElementKind::Text | ElementKind::Subtext => {
                self.fillable(props, "content", path, FieldShape::Text, true);
                self.typography(props, path);
            }
            ElementKind::Button => {
                self.fillable(props, "content", path, FieldShape::Text, true);
                self.fillable(props, "href", path, FieldShape::Link, true);
                if let Some(style) = self.object(props, "style", path, true) {
                    let style_path = child(path, "style");
                    self.color(style, "backgroundColor", &style_path, true);
                    self.color(style, "textColor", &style_path, true);
                    self.integer(style, "borderRadius", &style_path, false, 0, 100);
                    self.boolean(style, "fullWidth", &style_path);
                }
                self.typography(props, path);
            }
            ElementKind::Image => {
                self.fillable(props, "src", path, FieldShape::ImageSource, true);
                self.string(props, "alt", path, false, false);
                self.fillable(props, "href", path, FieldShape::Link, false);
                self.integer(props, "width", path, false, 1, 2000);
            }
            ElementKind::Divider => {
                self.color(props, "color", path, false);
                self.integer(props, "thickness", path, false, 1, 20);
                self.one_of(props, "lineStyle", path, false, LINE_STYLES);
            }
            ElementKind::Spacer => {
                self.integer(props, "height", path, true, 1, 500);
            }
            ElementKind::Quote => {
                self.fillable(props, "content", path, FieldShape::Text, true);
                self.string(props, "citation", path, false, true);
                self.typography(props, path);
            }
            ElementKind::Code => {
                self.fillable(props, "content", path, FieldShape::Text, true);
                self.string(props, "language", path, false, true);
            }
            ElementKind::List => {
                if let Some(items) = self.array(props, "items", path, true) {
                    let items_path = child(path, "items");
                    if items.is_empty() {
                        self.issue(items_path.clone(), "must contain at least one item");
                    }
                    for (i, item) in items.iter().enumerate() {
                        match item.as_str() {
                            Some(s) if !s.trim().is_empty() => {}
                            _ => self.issue(index(&items_path, i), "must be a non-empty string"),
                        }
                    }
                }
                self.boolean(props, "ordered", path);
                self.typography(props, path);
            }
            ElementKind::Icon => {
                self.fillable(props, "src", path, FieldShape::ImageSource, true);
                self.string(props, "alt", path, false, false);
                self.integer(props, "size", path, false, 1, 512);
                self.fillable(props, "href", path, FieldShape::Link, false);
            }
            ElementKind::Nav => {
                self.links(props, path, "label");
                self.string(props, "separator", path, false, false);
                self.typography(props, path);
            }
            ElementKind::Social => {
                self.links(props, path, "platform");
                self.integer(props, "iconSize", path, false, 8, 128);
            }
            ElementKind::AppStoreBadge => {
                self.one_of(props, "store", path, true, APP_STORES);
                self.fillable(props, "href", path, FieldShape::Link, true);
            }
            ElementKind::Unsubscribe | ElementKind::Preferences => {
                self.fillable(props, "content", path, FieldShape::Text, true);
                self.fillable(props, "href", path, FieldShape::Link, true);
                self.typography(props, path);
            }
            ElementKind::PreviewText => {
                self.fillable(props, "content", path, FieldShape::Text, true);
            }
            ElementKind::Container => {
                self.fillable(props, "content", path, FieldShape::Text, true);
                self.color(props, "backgroundColor", path, false);
                self.color(props, "borderColor", path, false);
                self.integer(props, "borderWidth", path, false, 0, 20);
                self.integer(props, "borderRadius", path, false, 0, 100);
                self.typography(props, path);
            }
            ElementKind::Footer => {
                self.fillable(props, "content", path, FieldShape::Text, true);
                self.string(props, "address", path, false, true);
                self.typography(props, path);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Shared sub-records
    // -----------------------------------------------------------------------

    fn layout(&mut self, layout: &Object, path: &str) {
        self.string(layout, "width", path, false, true);
        self.string(layout, "height", path, false, true);
        for edge in ["margin", "padding"] {
            if let Some(spacing) = self.object(layout, edge, path, false) {
                let spacing_path = child(path, edge);
                for side in SPACING_SIDES {
                    self.integer(spacing, side, &spacing_path, false, 0, 1000);
                }
            }
        }
        self.one_of(layout, "align", path, false, ALIGNMENTS);
    }

    fn typography(&mut self, props: &Object, path: &str) {
        let Some(typography) = self.object(props, "typography", path, false) else {
            return;
        };
        let path = child(path, "typography");
        self.integer(typography, "fontSize", &path, false, 1, 200);
        self.string(typography, "fontWeight", &path, false, true);
        self.string(typography, "fontFamily", &path, false, true);
        self.color(typography, "color", &path, false);
        self.string(typography, "lineHeight", &path, false, true);
    }

    fn style_map(&mut self, obj: &Object, path: &str) {
        let Some(style) = self.object(obj, "style", path, false) else {
            return;
        };
        for (key, value) in style {
            if !value.is_string() {
                self.issue(child(&child(path, "style"), key), "style values must be strings");
            }
        }
    }

    /// Non-empty array of `{ <label_key>, href }` objects
    fn links(&mut self, props: &Object, path: &str, label_key: &str) {
        let Some(links) = self.array(props, "links", path, true) else {
            return;
        };
        let links_path = child(path, "links");
        if links.is_empty() {
            self.issue(links_path.clone(), "must contain at least one link");
        }
        for (i, link) in links.iter().enumerate() {
            let link_path = index(&links_path, i);
            let Some(obj) = link.as_object() else {
                self.issue(link_path, "link must be an object");
                continue;
            };
            self.string(obj, label_key, &link_path, true, true);
            self.fillable(obj, "href", &link_path, FieldShape::Link, true);
        }
    }

    // -----------------------------------------------------------------------
    // Field checks
    // -----------------------------------------------------------------------

    fn id(&mut self, obj: &Object, path: &str) {
        let id_path = child(path, "id");
        match obj.get("id") {
            None => self.issue(id_path, "is required"),
            Some(Value::String(id)) if id.trim().is_empty() => {
                self.issue(id_path, "must be a non-empty string")
            }
            Some(Value::String(id)) => {
                if let Some(first) = self.seen_ids.get(id) {
                    let message = format!("duplicate identifier '{id}' (first used at {first})");
                    self.issue(id_path, message);
                } else {
                    self.seen_ids.insert(id.clone(), id_path);
                }
            }
            Some(_) => self.issue(id_path, "must be a string"),
        }
    }

    fn fillable(&mut self, obj: &Object, key: &str, path: &str, shape: FieldShape, required: bool) {
        match obj.get(key) {
            None if required => self.issue(child(path, key), "is required"),
            None => {}
            Some(Value::String(s)) => {
                if let Err(message) = shape.check(s) {
                    self.issue(child(path, key), message);
                }
            }
            Some(_) => self.issue(child(path, key), "must be a string"),
        }
    }

    fn string(&mut self, obj: &Object, key: &str, path: &str, required: bool, non_empty: bool) {
        match obj.get(key) {
            None if required => self.issue(child(path, key), "is required"),
            None => {}
            Some(Value::String(s)) if non_empty && s.trim().is_empty() => {
                self.issue(child(path, key), "must not be empty")
            }
            Some(Value::String(_)) => {}
            Some(_) => self.issue(child(path, key), "must be a string"),
        }
    }

    fn color(&mut self, obj: &Object, key: &str, path: &str, required: bool) {
        match obj.get(key) {
            None if required => self.issue(child(path, key), "is required"),
            None => {}
            Some(Value::String(s)) if is_color(s) => {}
            Some(other) => {
                self.issue(child(path, key), format!("expected a CSS color, found {other}"))
            }
        }
    }

    fn integer(&mut self, obj: &Object, key: &str, path: &str, required: bool, min: u64, max: u64) {
        match obj.get(key) {
            None if required => self.issue(child(path, key), "is required"),
            None => {}
            Some(v) => match v.as_u64() {
                Some(n) if (min..=max).contains(&n) => {}
                _ => self.issue(
                    child(path, key),
                    format!("must be an integer between {min} and {max}, found {v}"),
                ),
            },
        }
    }

    fn boolean(&mut self, obj: &Object, key: &str, path: &str) {
        if let Some(v) = obj.get(key) {
            if !v.is_boolean() {
                self.issue(child(path, key), "must be a boolean");
            }
        }
    }

    fn one_of(&mut self, obj: &Object, key: &str, path: &str, required: bool, options: &[&str]) {
        match obj.get(key) {
            None if required => self.issue(child(path, key), "is required"),
            None => {}
            Some(Value::String(s)) if options.contains(&s.as_str()) => {}
            Some(other) => self.issue(
                child(path, key),
                format!("must be one of {}, found {other}", options.join(", ")),
            ),
        }
    }

    fn object<'v>(
        &mut self,
        obj: &'v Object,
        key: &str,
        path: &str,
        required: bool,
    ) -> Option<&'v Object> {
        match obj.get(key) {
            None => {
                if required {
                    self.issue(child(path, key), "is required");
                }
                None
            }
            Some(Value::Object(inner)) => Some(inner),
            Some(_) => {
                self.issue(child(path, key), "must be an object");
                None
            }
        }
    }

    fn array<'v>(
        &mut self,
        obj: &'v Object,
        key: &str,
        path: &str,
        required: bool,
    ) -> Option<&'v Vec<Value>> {
        match obj.get(key) {
            None => {
                if required {
                    self.issue(child(path, key), "is required");
                }
                None
            }
            Some(Value::Array(items)) => Some(items),
            Some(_) => {
                self.issue(child(path, key), "must be an array");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(elements: Value) -> Value {
        json!({
            "id": "t1",
            "name": "Launch",
            "version": 2,
            "globalStyles": { "backgroundColor": "#ffffff", "fontFamily": "Arial", "contentWidth": 600 },
            "sections": [{
                "id": "s1",
                "style": { "backgroundColor": "#fff" },
                "rows": [{
                    "id": "r1",
                    "columns": [{ "id": "c1", "span": 12, "elements": elements }]
                }]
            }]
        })
    }

    fn button(href: &str) -> Value {
        json!({
            "id": "b1",
            "type": "button",
            "properties": {
                "content": "Buy now",
                "href": href,
                "style": { "backgroundColor": "#000", "textColor": "#fff" }
            }
        })
    }

    #[test]
    fn test_valid_payload_yields_template() {
        let template = validate_template(&payload(json!([button("https://shop.example.com")]))).unwrap();
        assert_eq!(template.id, "t1");
        assert_eq!(template.element_count(), 1);
    }

    #[test]
    fn test_button_link_placeholder_accepted() {
        let result = validate_template(&payload(json!([button("@@PLACEHOLDER_LINK@@")])));
        let template = result.unwrap();
        let element = template.element("b1").unwrap();
        assert_eq!(element.kind(), ElementKind::Button);
    }

    #[test]
    fn test_button_empty_href_rejected_with_path() {
        let err = validate_template(&payload(json!([button("")]))).unwrap_err();
        let issues = err.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].path,
            "sections[0].rows[0].columns[0].elements[0].properties.href"
        );
    }

    #[test]
    fn test_link_like_values_accepted_for_href() {
        for href in ["#", "mailto:team@example.com", "/pricing"] {
            assert!(validate_template(&payload(json!([button(href)]))).is_ok(), "{href}");
        }
    }

    #[test]
    fn test_reports_every_issue() {
        let elements = json!([
            { "id": "e1", "type": "spacer", "properties": { "height": 0 } },
            { "id": "e2", "type": "image", "properties": { "src": "" } },
            { "id": "e3", "type": "carousel", "properties": {} },
            { "id": "e4", "type": "header", "properties": { "content": "Hi", "level": 9 } }
        ]);

        let err = validate_template(&payload(elements)).unwrap_err();
        let SchemaError::Invalid(issues) = err else {
            panic!("expected validation failure");
        };

        let base = "sections[0].rows[0].columns[0].elements";
        assert_eq!(issues.len(), 4);
        assert!(issues.has_path(&format!("{base}[0].properties.height")));
        assert!(issues.has_path(&format!("{base}[1].properties.src")));
        assert!(issues.has_path(&format!("{base}[2].type")));
        assert!(issues.has_path(&format!("{base}[3].properties.level")));
    }

    #[test]
    fn test_version_must_match() {
        let mut value = payload(json!([]));
        value["version"] = json!(1);
        let err = validate_template(&value).unwrap_err();
        assert!(err.issues()[0].message.contains("unsupported document version"));
    }

    #[test]
    fn test_duplicate_ids_reported() {
        let elements = json!([
            { "id": "s1", "type": "text", "properties": { "content": "Same id as the section" } }
        ]);
        let err = validate_template(&payload(elements)).unwrap_err();
        assert!(err.issues()[0].message.contains("duplicate identifier 's1'"));
    }

    #[test]
    fn test_wrong_placeholder_kind_rejected() {
        let elements = json!([
            { "id": "i1", "type": "image", "properties": { "src": "@@PLACEHOLDER_LINK@@" } }
        ]);
        assert!(validate_template(&payload(elements)).is_err());
    }

    #[test]
    fn test_divider_without_properties() {
        let elements = json!([{ "id": "d1", "type": "divider" }]);
        let template = validate_template(&payload(elements)).unwrap();
        assert_eq!(template.element("d1").unwrap().kind(), ElementKind::Divider);
    }

    #[test]
    fn test_validate_element_standalone() {
        let issues = validate_element(&json!({ "id": "x", "type": "spacer", "properties": {} }), "el");
        assert_eq!(issues, vec![ValidationIssue::new("el.properties.height", "is required")]);
    }

    #[test]
    fn test_validate_section_standalone() {
        let section = payload(json!([button("")]))["sections"][0].clone();
        let issues = validate_section(&section, "section");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "section.rows[0].columns[0].elements[0].properties.href");
    }

    #[test]
    fn test_invalid_json_text() {
        assert!(matches!(validate_json("{ not json"), Err(SchemaError::Json(_))));
    }
}
