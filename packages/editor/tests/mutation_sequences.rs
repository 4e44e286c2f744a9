//! Tests for sequences of direct mutations
//!
//! This tests:
//! - Insert + move + remove chains
//! - Failed mutations in the middle of a sequence
//! - Template integrity after operations

use mailcraft_common::duplicate_ids;
use mailcraft_document::{starter_template, Element, Fillable, IDGenerator, Layout, Template, TextProps, Typography};
use mailcraft_editor::{Mutation, MutationError};
use mailcraft_schema::check_template;

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

fn starter() -> Template {
    let mut ids = IDGenerator::sequential("starter");
    starter_template("Welcome", &mut ids)
}

fn column(template: &Template, section: usize) -> String {
    template.sections[section].rows[0].columns[0].id.clone()
}

fn ids_in(template: &Template, column_id: &str) -> Vec<String> {
    template
        .column(column_id)
        .unwrap()
        .elements
        .iter()
        .map(|e| e.id().to_string())
        .collect()
}

#[test]
fn test_insert_move_then_remove_section() {
    let mut template = starter();
    let hero = column(&template, 0);
    let footer = column(&template, 2);
    let footer_section = template.sections[2].id.clone();

    Mutation::InsertElement { column_id: hero.clone(), index: 0, element: text("note", "Note") }
        .apply(&mut template)
        .unwrap();
    Mutation::MoveElement { element_id: "note".to_string(), column_id: footer.clone(), index: 0 }
        .apply(&mut template)
        .unwrap();
    assert_eq!(ids_in(&template, &footer)[0], "note");

    Mutation::RemoveNode { node_id: footer_section }.apply(&mut template).unwrap();
    assert!(template.element("note").is_none());
    assert_eq!(template.sections.len(), 2);

    assert!(check_template(&template).is_empty());
}

#[test]
fn test_failed_step_does_not_corrupt() {
    let mut template = starter();
    let body = column(&template, 1);

    let steps = vec![
        Mutation::InsertElement { column_id: body.clone(), index: 1, element: text("extra", "Extra") },
        // Reuses an id, rejected
        Mutation::InsertElement { column_id: body.clone(), index: 0, element: text("extra", "Again") },
        Mutation::UpdateContent { element_id: "extra".to_string(), content: Fillable::value("Edited") },
        // Not a column
        Mutation::MoveElement { element_id: "extra".to_string(), column_id: "nowhere".to_string(), index: 0 },
    ];

    let results: Vec<Result<(), MutationError>> = steps.iter().map(|m| m.apply(&mut template)).collect();
    assert!(results[0].is_ok());
    assert_eq!(results[1], Err(MutationError::DuplicateId("extra".to_string())));
    assert!(results[2].is_ok());
    assert_eq!(results[3], Err(MutationError::ParentNotFound("nowhere".to_string())));

    // The failed move left the element where it was
    assert_eq!(template.parent_column_id("extra"), Some(body.as_str()));
    assert_eq!(template.element("extra").unwrap().content(), Some(&Fillable::value("Edited")));
    assert!(duplicate_ids(&template).is_empty());
    assert!(check_template(&template).is_empty());
}

#[test]
fn test_reordering_within_a_column() {
    let mut template = starter();
    let body = column(&template, 1);
    let before = ids_in(&template, &body);

    // Move the first element to the end, one step at a time
    let first = before[0].clone();
    for index in 1..before.len() {
        Mutation::MoveElement { element_id: first.clone(), column_id: body.clone(), index }
            .apply(&mut template)
            .unwrap();
    }

    let after = ids_in(&template, &body);
    let mut expected = before[1..].to_vec();
    expected.push(first);
    assert_eq!(after, expected);
}

#[test]
fn test_placeholder_content_is_editable() {
    let mut template = starter();
    let image = template
        .elements()
        .find(|e| matches!(e, Element::Image { .. }))
        .map(|e| e.id().to_string())
        .unwrap();

    // Images carry no text body
    let err = Mutation::UpdateContent { element_id: image.clone(), content: Fillable::value("x") }
        .apply(&mut template)
        .unwrap_err();
    assert_eq!(err, MutationError::NoContent(image.clone()));

    Mutation::SetProperty {
        element_id: image.clone(),
        name: "src".to_string(),
        value: serde_json::json!("https://cdn.example.com/hero.png"),
    }
    .apply(&mut template)
    .unwrap();

    let Element::Image { properties, .. } = template.element(&image).unwrap() else {
        panic!("expected image");
    };
    assert_eq!(properties.src, Fillable::value("https://cdn.example.com/hero.png"));
}
