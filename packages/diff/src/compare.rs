//! Field-level comparison of two JSON snapshots

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Changed fields keyed by field name
pub type ChangeMap = BTreeMap<String, FieldChange>;

/// One changed field: either a leaf with both values or a nested group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldChange {
    #[serde(rename_all = "camelCase")]
    Value { old_value: Value, new_value: Value },
    Nested(ChangeMap),
}

impl FieldChange {
    pub fn leaf(old_value: Value, new_value: Value) -> Self {
        FieldChange::Value { old_value, new_value }
    }

    pub fn old_value(&self) -> Option<&Value> {
        match self {
            FieldChange::Value { old_value, .. } => Some(old_value),
            FieldChange::Nested(_) => None,
        }
    }

    pub fn new_value(&self) -> Option<&Value> {
        match self {
            FieldChange::Value { new_value, .. } => Some(new_value),
            FieldChange::Nested(_) => None,
        }
    }

    pub fn nested(&self) -> Option<&ChangeMap> {
        match self {
            FieldChange::Nested(map) => Some(map),
            FieldChange::Value { .. } => None,
        }
    }
}

/// Follow `path` through nested groups, e.g. `["layout", "padding", "top"]`
pub fn change_at<'a>(changes: &'a ChangeMap, path: &[&str]) -> Option<&'a FieldChange> {
    let (first, rest) = path.split_first()?;
    let change = changes.get(*first)?;
    if rest.is_empty() {
        Some(change)
    } else {
        change_at(change.nested()?, rest)
    }
}

/// Compare two snapshots. Objects on both sides recurse into nested groups;
/// anything else (arrays included) is compared as a leaf. A field missing on
/// one side is reported against `null`.
pub fn diff_values(old: &Value, new: &Value) -> ChangeMap {
    match (old, new) {
        (Value::Object(old), Value::Object(new)) => diff_objects(old, new),
        _ if old == new => ChangeMap::new(),
        _ => {
            let mut changes = ChangeMap::new();
            changes.insert("value".to_string(), FieldChange::leaf(old.clone(), new.clone()));
            changes
        }
    }
}

fn diff_objects(old: &Map<String, Value>, new: &Map<String, Value>) -> ChangeMap {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    let mut changes = ChangeMap::new();

    for key in keys {
        match (old.get(key), new.get(key)) {
            (Some(Value::Object(a)), Some(Value::Object(b))) => {
                let nested = diff_objects(a, b);
                if !nested.is_empty() {
                    changes.insert(key.clone(), FieldChange::Nested(nested));
                }
            }
            (a, b) if a != b => {
                changes.insert(
                    key.clone(),
                    FieldChange::leaf(
                        a.cloned().unwrap_or(Value::Null),
                        b.cloned().unwrap_or(Value::Null),
                    ),
                );
            }
            _ => {}
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equal_values_have_no_changes() {
        let value = json!({ "content": "Hi", "typography": { "fontSize": 16 } });
        assert!(diff_values(&value, &value).is_empty());
    }

    #[test]
    fn test_nested_groups_stay_nested() {
        let old = json!({ "layout": { "padding": { "top": 8, "left": 0 } }, "content": "Hi" });
        let new = json!({ "layout": { "padding": { "top": 16, "left": 0 } }, "content": "Hi" });

        let changes = diff_values(&old, &new);

        assert_eq!(changes.len(), 1);
        let top = change_at(&changes, &["layout", "padding", "top"]).unwrap();
        assert_eq!(top, &FieldChange::leaf(json!(8), json!(16)));
        assert!(change_at(&changes, &["layout", "padding", "left"]).is_none());
    }

    #[test]
    fn test_missing_fields_compare_against_null() {
        let old = json!({ "typography": { "fontSize": 24 } });
        let new = json!({ "typography": {} });

        let changes = diff_values(&old, &new);
        let size = change_at(&changes, &["typography", "fontSize"]).unwrap();
        assert_eq!(size.old_value(), Some(&json!(24)));
        assert_eq!(size.new_value(), Some(&Value::Null));
    }

    #[test]
    fn test_arrays_are_leaves() {
        let old = json!({ "items": ["a", "b"] });
        let new = json!({ "items": ["a", "c"] });

        let changes = diff_values(&old, &new);
        assert_eq!(changes["items"], FieldChange::leaf(json!(["a", "b"]), json!(["a", "c"])));
    }

    #[test]
    fn test_serialized_shape() {
        let changes = diff_values(
            &json!({ "content": "Hello", "typography": { "color": "#000" } }),
            &json!({ "content": "Hello there", "typography": { "color": "#111" } }),
        );

        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            json!({
                "content": { "oldValue": "Hello", "newValue": "Hello there" },
                "typography": { "color": { "oldValue": "#000", "newValue": "#111" } }
            })
        );
    }
}
