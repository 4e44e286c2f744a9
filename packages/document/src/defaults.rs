//! Starter content for new projects

use crate::ast::*;
use crate::id_generator::IDGenerator;
use crate::placeholder::{Fillable, Placeholder};

/// Build the fixed starter email: hero, body copy, call to action, footer
pub fn starter_template(name: &str, ids: &mut IDGenerator) -> Template {
    let mut template = Template::new(ids.new_id(), name);

    let hero = vec![
        Element::Image {
            id: ids.new_id(),
            layout: Layout { align: Alignment::Center, ..Layout::default() },
            properties: ImageProps {
                src: Fillable::Placeholder(Placeholder::Image),
                alt: "Hero image".to_string(),
                href: None,
                width: Some(600),
            },
        },
        Element::Header {
            id: ids.new_id(),
            layout: padded(Alignment::Center),
            properties: HeaderProps {
                content: Fillable::value("Welcome to our newsletter"),
                level: 1,
                typography: Typography {
                    font_size: Some(28),
                    font_weight: Some("bold".to_string()),
                    color: Some("#111827".to_string()),
                    ..Typography::default()
                },
            },
        },
    ];

    let body = vec![
        Element::Text {
            id: ids.new_id(),
            layout: padded(Alignment::Left),
            properties: TextProps {
                content: Fillable::Placeholder(Placeholder::Text),
                typography: Typography {
                    font_size: Some(16),
                    color: Some("#374151".to_string()),
                    line_height: Some("1.5".to_string()),
                    ..Typography::default()
                },
            },
        },
        Element::Button {
            id: ids.new_id(),
            layout: padded(Alignment::Center),
            properties: ButtonProps {
                content: Fillable::value("Get started"),
                href: Fillable::Placeholder(Placeholder::Link),
                style: ButtonStyle::default(),
                typography: Typography::default(),
            },
        },
        Element::Divider {
            id: ids.new_id(),
            layout: padded(Alignment::Center),
            properties: DividerProps::default(),
        },
    ];

    let footer = vec![
        Element::Footer {
            id: ids.new_id(),
            layout: padded(Alignment::Center),
            properties: FooterProps {
                content: Fillable::value("You are receiving this email because you signed up."),
                address: None,
                typography: Typography {
                    font_size: Some(12),
                    color: Some("#6b7280".to_string()),
                    ..Typography::default()
                },
            },
        },
        Element::Unsubscribe {
            id: ids.new_id(),
            layout: padded(Alignment::Center),
            properties: LinkTextProps {
                content: Fillable::value("Unsubscribe"),
                href: Fillable::Placeholder(Placeholder::Link),
                typography: Typography {
                    font_size: Some(12),
                    ..Typography::default()
                },
            },
        },
    ];

    template.sections = vec![
        single_column_section(ids, "#ffffff", hero),
        single_column_section(ids, "#ffffff", body),
        single_column_section(ids, "#f9fafb", footer),
    ];
    template
}

/// Section with one row holding one full-width column
pub fn single_column_section(
    ids: &mut IDGenerator,
    background: &str,
    elements: Vec<Element>,
) -> Section {
    let mut style = StyleMap::new();
    style.insert("backgroundColor".to_string(), background.to_string());
    style.insert("padding".to_string(), "16px 24px 16px 24px".to_string());

    Section {
        id: ids.new_id(),
        style,
        pending_deletion: false,
        rows: vec![Row {
            id: ids.new_id(),
            style: StyleMap::new(),
            columns: vec![Column {
                id: ids.new_id(),
                span: 12,
                style: StyleMap::new(),
                elements,
            }],
        }],
    }
}

fn padded(align: Alignment) -> Layout {
    Layout {
        padding: Spacing::symmetric(8, 0),
        align,
        ..Layout::default()
    }
}
