use mailcraft_diff::{
    change_at, diff_templates, diff_templates_with_options, CollisionKind, DiffOptions, DiffStatus, FieldChange,
};
use mailcraft_document::{starter_template, IDGenerator, Template};
use serde_json::{json, Value};

fn template(sections: Value) -> Template {
    serde_json::from_value(json!({
        "id": "tpl",
        "name": "News",
        "version": 2,
        "sections": sections
    }))
    .expect("fixture is a valid template")
}

fn section(id: &str, elements: Value) -> Value {
    json!({
        "id": id,
        "rows": [{
            "id": format!("{id}-r"),
            "columns": [{ "id": format!("{id}-c"), "span": 12, "elements": elements }]
        }]
    })
}

fn text(id: &str, content: &str) -> Value {
    json!({ "type": "text", "id": id, "properties": { "content": content } })
}

fn button(id: &str, label: &str) -> Value {
    json!({ "type": "button", "id": id, "properties": { "content": label, "href": "https://example.com" } })
}

#[test]
fn test_edit_and_append_in_one_section() {
    let old = template(json!([section("s1", json!([text("e1", "Hello")]))]));
    let new = template(json!([section(
        "s1",
        json!([text("e1", "Hello there"), button("e2", "Buy")])
    )]));

    let diff = diff_templates(&old, &new);

    assert!(diff.has_changes);
    assert!(diff.template_changes.is_empty());
    assert_eq!(diff.sections.len(), 1);

    let s1 = &diff.sections[0];
    assert_eq!(s1.id, "s1");
    assert_eq!(s1.status, DiffStatus::Modified);
    assert!(s1.changes.is_empty());
    assert_eq!(s1.elements.len(), 2);

    let e1 = s1.element("e1").unwrap();
    assert_eq!(e1.status, DiffStatus::Modified);
    assert_eq!(e1.changes.len(), 1);
    assert_eq!(e1.changes["content"], FieldChange::leaf(json!("Hello"), json!("Hello there")));
    assert!(e1.moved.is_none());

    let e2 = s1.element("e2").unwrap();
    assert_eq!(e2.status, DiffStatus::Added);
    assert_eq!(e2.element_type, "button");
}

#[test]
fn test_identical_templates_are_unchanged() {
    let mut ids = IDGenerator::new();
    let template = starter_template("Welcome", &mut ids);

    let diff = diff_templates(&template, &template);

    assert!(!diff.has_changes);
    assert!(diff.template_changes.is_empty());
    assert!(diff.collisions.is_empty());
    assert_eq!(diff.sections.len(), template.sections.len());
    for section in &diff.sections {
        assert_eq!(section.status, DiffStatus::Unchanged);
        assert!(section.moved.is_none());
        assert!(section.rows.iter().all(|r| r.status == DiffStatus::Unchanged));
        assert!(section.columns().all(|c| c.status == DiffStatus::Unchanged));
        assert!(section.elements.iter().all(|e| e.status == DiffStatus::Unchanged && e.moved.is_none()));
    }
    assert_eq!(diff.elements().count(), template.element_count());
}

#[test]
fn test_nested_groups_are_reported_nested() {
    let old = template(json!([section(
        "s1",
        json!([{
            "type": "header", "id": "h1",
            "layout": { "padding": { "top": 8, "right": 0, "bottom": 8, "left": 0 } },
            "properties": { "content": "Title", "typography": { "fontSize": 24 } }
        }])
    )]));
    let new = template(json!([section(
        "s1",
        json!([{
            "type": "header", "id": "h1",
            "layout": { "padding": { "top": 16, "right": 0, "bottom": 8, "left": 0 } },
            "properties": { "content": "Title", "typography": { "fontSize": 28 } }
        }])
    )]));

    let diff = diff_templates(&old, &new);
    let h1 = diff.element("h1").unwrap();

    assert_eq!(h1.status, DiffStatus::Modified);
    assert_eq!(
        change_at(&h1.changes, &["typography", "fontSize"]),
        Some(&FieldChange::leaf(json!(24), json!(28)))
    );
    assert_eq!(
        change_at(&h1.changes, &["layout", "padding", "top"]),
        Some(&FieldChange::leaf(json!(8), json!(16)))
    );
    assert!(h1.changes["layout"].nested().is_some());
    assert!(!h1.changes.contains_key("content"));
}

#[test]
fn test_reorder_within_column_is_a_move() {
    let old = template(json!([section("s1", json!([text("a", "A"), text("b", "B")]))]));
    let new = template(json!([section("s1", json!([text("b", "B"), text("a", "A edited")]))]));

    let diff = diff_templates(&old, &new);
    assert!(diff.has_changes);

    let a = diff.element("a").unwrap();
    assert_eq!(a.status, DiffStatus::Modified);
    let moved = a.moved.as_ref().unwrap();
    assert_eq!((moved.from_index, moved.to_index), (0, 1));
    assert!(!moved.changed_parent());

    let b = diff.element("b").unwrap();
    assert_eq!(b.status, DiffStatus::Unchanged);
    assert_eq!(b.moved.as_ref().map(|m| (m.from_index, m.to_index)), Some((1, 0)));
}

#[test]
fn test_move_across_sections_is_reported_once() {
    let old = template(json!([
        section("s1", json!([text("a", "A"), text("b", "B")])),
        section("s2", json!([text("c", "C")]))
    ]));
    let new = template(json!([
        section("s1", json!([text("a", "A")])),
        section("s2", json!([text("c", "C"), text("b", "B")]))
    ]));

    let diff = diff_templates(&old, &new);

    assert_eq!(diff.elements().filter(|e| e.id == "b").count(), 1);
    let s1 = diff.section("s1").unwrap();
    assert!(s1.element("b").is_none());
    assert_eq!(s1.status, DiffStatus::Modified);

    let b = diff.section("s2").unwrap().element("b").unwrap();
    assert_eq!(b.status, DiffStatus::Unchanged);
    let moved = b.moved.as_ref().unwrap();
    assert_eq!(moved.from_parent.as_deref(), Some("s1-c"));
    assert_eq!(moved.to_parent.as_deref(), Some("s2-c"));
    assert_eq!((moved.from_index, moved.to_index), (1, 1));
}

#[test]
fn test_section_order_follows_new_then_removed() {
    let old = template(json!([
        section("s1", json!([text("a", "A")])),
        section("s2", json!([text("b", "B")])),
        section("s3", json!([text("c", "C")]))
    ]));
    let new = template(json!([
        section("s3", json!([text("c", "C")])),
        section("s1", json!([text("a", "A")])),
        section("s4", json!([text("d", "D")]))
    ]));

    let diff = diff_templates(&old, &new);

    let order: Vec<_> = diff.sections.iter().map(|s| (s.id.as_str(), s.status)).collect();
    assert_eq!(
        order,
        vec![
            ("s3", DiffStatus::Unchanged),
            ("s1", DiffStatus::Unchanged),
            ("s4", DiffStatus::Added),
            ("s2", DiffStatus::Removed),
        ]
    );

    let s3 = diff.section("s3").unwrap().moved.as_ref().unwrap();
    assert_eq!((s3.from_index, s3.to_index), (2, 0));
    assert!(s3.from_parent.is_none());

    let s2 = diff.section("s2").unwrap();
    assert_eq!(s2.rows[0].status, DiffStatus::Removed);
    assert_eq!(s2.rows[0].columns[0].status, DiffStatus::Removed);
    assert_eq!(s2.element("b").map(|e| e.status), Some(DiffStatus::Removed));

    let s4 = diff.section("s4").unwrap();
    assert_eq!(s4.rows[0].status, DiffStatus::Added);
    assert_eq!(s4.element("d").map(|e| e.status), Some(DiffStatus::Added));
}

#[test]
fn test_skeleton_changes() {
    let old = template(json!([section("s1", json!([text("a", "A")]))]));
    let new = template(json!([{
        "id": "s1",
        "style": { "backgroundColor": "#000000" },
        "rows": [{
            "id": "s1-r",
            "columns": [
                { "id": "s1-c", "span": 6, "elements": [{ "type": "text", "id": "a", "properties": { "content": "A" } }] },
                { "id": "s1-c2", "span": 6, "elements": [] }
            ]
        }]
    }]));

    let diff = diff_templates(&old, &new);
    let s1 = diff.section("s1").unwrap();

    assert_eq!(s1.status, DiffStatus::Modified);
    assert_eq!(
        change_at(&s1.changes, &["style", "backgroundColor"]),
        Some(&FieldChange::leaf(Value::Null, json!("#000000")))
    );

    let row = s1.row("s1-r").unwrap();
    assert_eq!(row.status, DiffStatus::Modified);
    assert_eq!(row.columns[0].changes["span"], FieldChange::leaf(json!(12), json!(6)));
    assert_eq!(row.columns[1].status, DiffStatus::Added);
    assert_eq!(s1.element("a").map(|e| e.status), Some(DiffStatus::Unchanged));
}

#[test]
fn test_template_level_changes() {
    let old = template(json!([section("s1", json!([text("a", "A")]))]));
    let mut new = old.clone();
    new.name = "News (April)".to_string();
    new.global_styles.content_width = 640;

    let diff = diff_templates(&old, &new);

    assert!(diff.has_changes);
    assert_eq!(diff.template_changes["name"], FieldChange::leaf(json!("News"), json!("News (April)")));
    assert_eq!(
        change_at(&diff.template_changes, &["globalStyles", "contentWidth"]),
        Some(&FieldChange::leaf(json!(600), json!(640)))
    );
    assert!(diff.sections.iter().all(|s| !s.is_changed()));
}

#[test]
fn test_collisions_are_flagged() {
    let old = template(json!([
        section("s1", json!([
            { "type": "header", "id": "x", "properties": { "content": "Title" } },
            text("shared", "Text")
        ]))
    ]));
    let new = template(json!([
        section("s1", json!([text("x", "Title"), text("dup", "One"), text("dup", "Two")])),
        section("shared", json!([]))
    ]));

    let diff = diff_templates(&old, &new);
    let kinds: Vec<_> = diff.collisions.iter().map(|c| (c.id.as_str(), c.kind)).collect();

    assert!(kinds.contains(&("dup", CollisionKind::DuplicateInNew)));
    assert!(kinds.contains(&("shared", CollisionKind::KindMismatch)));
    assert!(kinds.contains(&("x", CollisionKind::TypeChanged)));

    let x = diff.element("x").unwrap();
    assert_eq!(x.status, DiffStatus::Modified);
    assert_eq!(x.changes["type"], FieldChange::leaf(json!("header"), json!("text")));
}

#[test]
fn test_unchanged_entities_can_be_omitted() {
    let old = template(json!([
        section("s1", json!([text("a", "A"), text("b", "B")])),
        section("s2", json!([text("c", "C")]))
    ]));
    let new = template(json!([
        section("s1", json!([text("a", "A"), text("b", "B!")])),
        section("s2", json!([text("c", "C")]))
    ]));
    let options = DiffOptions {
        report_unchanged: false,
    };

    let diff = diff_templates_with_options(&old, &new, &options);

    assert!(diff.has_changes);
    assert_eq!(diff.sections.len(), 1);
    let ids: Vec<_> = diff.sections[0].elements.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["b"]);
    assert!(diff.sections[0].rows.is_empty());
}

#[test]
fn test_summary_and_json_shape() {
    let old = template(json!([section("s1", json!([text("e1", "Hello"), text("gone", "Bye")]))]));
    let new = template(json!([section("s1", json!([text("e1", "Hello there"), button("e2", "Buy")]))]));

    let diff = diff_templates(&old, &new);
    let summary = diff.summary();
    assert_eq!((summary.added, summary.removed, summary.modified, summary.moved), (1, 1, 1, 0));

    let value = serde_json::to_value(&diff).unwrap();
    assert_eq!(value["hasChanges"], true);
    assert_eq!(value["sections"][0]["status"], "modified");
    assert_eq!(value["sections"][0]["elements"][0]["type"], "text");
    assert_eq!(
        value["sections"][0]["elements"][0]["changes"]["content"],
        json!({ "oldValue": "Hello", "newValue": "Hello there" })
    );
    assert_eq!(value["sections"][0]["elements"][2]["id"], "gone");
    assert_eq!(value["sections"][0]["elements"][2]["status"], "removed");
}
