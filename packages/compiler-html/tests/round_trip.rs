use mailcraft_compiler_html::{compile_to_html, render, CompileOptions};
use mailcraft_document::{starter_template, ElementKind, IDGenerator, Template};
use mailcraft_parser::{parse, parse_with_options, ParseOptions};
use serde_json::json;

/// One element of every kind, spread over two rows
fn every_kind() -> Template {
    let payload = json!({
        "id": "tpl-1",
        "name": "Launch & Learn",
        "version": 2,
        "globalStyles": {
            "backgroundColor": "#fafafa",
            "fontFamily": "Helvetica, Arial, sans-serif",
            "contentWidth": 640
        },
        "sections": [
            {
                "id": "s1",
                "style": { "backgroundColor": "#ffffff", "padding": "24px" },
                "rows": [
                    {
                        "id": "r1",
                        "columns": [
                            {
                                "id": "c1",
                                "span": 6,
                                "elements": [
                                    {
                                        "type": "header", "id": "e-header",
                                        "layout": {
                                            "width": "80%",
                                            "padding": { "top": 16, "right": 24, "bottom": 16, "left": 24 },
                                            "align": "center"
                                        },
                                        "properties": {
                                            "content": "Hello & welcome", "level": 2,
                                            "typography": { "fontSize": 24, "fontWeight": "bold", "color": "#111111" }
                                        }
                                    },
                                    {
                                        "type": "text", "id": "e-text",
                                        "properties": { "content": "Line one\nLine two", "typography": { "lineHeight": "1.5" } }
                                    },
                                    {
                                        "type": "button", "id": "e-button",
                                        "properties": {
                                            "content": "Buy", "href": "https://example.com/buy",
                                            "style": { "backgroundColor": "#000000", "textColor": "#ffffff", "borderRadius": 6, "fullWidth": true },
                                            "typography": { "fontSize": 16 }
                                        }
                                    },
                                    {
                                        "type": "image", "id": "e-image",
                                        "properties": { "src": "@@PLACEHOLDER_IMAGE@@", "alt": "Hero", "href": "https://example.com", "width": 300 }
                                    },
                                    {
                                        "type": "divider", "id": "e-divider",
                                        "properties": { "color": "#cccccc", "thickness": 2, "lineStyle": "dashed" }
                                    },
                                    { "type": "spacer", "id": "e-spacer", "properties": { "height": 32 } },
                                    { "type": "subtext", "id": "e-subtext", "properties": { "content": "Small print" } }
                                ]
                            },
                            {
                                "id": "c2",
                                "span": 6,
                                "style": { "backgroundColor": "#f3f4f6" },
                                "elements": [
                                    {
                                        "type": "quote", "id": "e-quote",
                                        "properties": { "content": "Great product", "citation": "A customer" }
                                    },
                                    {
                                        "type": "code", "id": "e-code",
                                        "properties": { "content": "let x = 1;\nlet y = x < 2;", "language": "rust" }
                                    },
                                    {
                                        "type": "list", "id": "e-list",
                                        "properties": { "items": ["One", "Two"], "ordered": true }
                                    },
                                    {
                                        "type": "icon", "id": "e-icon",
                                        "properties": { "src": "https://cdn.example.com/icon.png", "alt": "Star", "size": 24 }
                                    }
                                ]
                            }
                        ]
                    },
                    {
                        "id": "r2",
                        "style": { "paddingTop": "8px" },
                        "columns": [
                            {
                                "id": "c3",
                                "span": 12,
                                "elements": [
                                    {
                                        "type": "nav", "id": "e-nav",
                                        "properties": {
                                            "links": [ { "label": "Shop", "href": "/shop" }, { "label": "Blog", "href": "/blog" } ],
                                            "separator": "|"
                                        }
                                    },
                                    {
                                        "type": "social", "id": "e-social",
                                        "properties": { "links": [ { "platform": "twitter", "href": "https://twitter.com/acme" } ], "iconSize": 32 }
                                    },
                                    {
                                        "type": "app-store-badge", "id": "e-badge",
                                        "properties": { "store": "google", "href": "https://play.google.com/store/apps/details?id=acme" }
                                    }
                                ]
                            }
                        ]
                    }
                ]
            },
            {
                "id": "s2",
                "style": { "backgroundColor": "#111827" },
                "rows": [
                    {
                        "id": "r3",
                        "columns": [
                            {
                                "id": "c4",
                                "span": 12,
                                "elements": [
                                    {
                                        "type": "unsubscribe", "id": "e-unsubscribe",
                                        "properties": { "content": "Unsubscribe", "href": "@@PLACEHOLDER_LINK@@", "typography": { "fontSize": 12 } }
                                    },
                                    {
                                        "type": "preferences", "id": "e-preferences",
                                        "properties": { "content": "Preferences", "href": "https://example.com/prefs" }
                                    },
                                    {
                                        "type": "preview-text", "id": "e-preview",
                                        "properties": { "content": "Inside: spring deals" }
                                    },
                                    {
                                        "type": "container", "id": "e-container",
                                        "properties": {
                                            "content": "Boxed", "backgroundColor": "#f9fafb", "borderColor": "#e5e7eb",
                                            "borderWidth": 1, "borderRadius": 8
                                        }
                                    },
                                    {
                                        "type": "footer", "id": "e-footer",
                                        "properties": { "content": "Acme Inc", "address": "1 Main St", "typography": { "color": "#6b7280" } }
                                    }
                                ]
                            }
                        ]
                    }
                ]
            }
        ]
    });

    serde_json::from_value(payload).expect("fixture is a valid template")
}

#[test]
fn test_every_kind_survives_render_and_parse() {
    let template = every_kind();
    assert_eq!(template.element_count(), ElementKind::ALL.len());

    let html = render(&template).unwrap();
    let report = parse_with_options(&html, &ParseOptions::default()).unwrap();

    assert!(report.skipped.is_empty(), "skipped: {:?}", report.skipped);
    assert_eq!(report.template, template);
}

#[test]
fn test_compact_output_round_trips() {
    let template = every_kind();
    let options = CompileOptions {
        pretty: false,
        full_document: false,
        ..Default::default()
    };

    let html = compile_to_html(&template, &options).unwrap();
    assert!(html.starts_with("<table class=\"email-container\""));

    let parsed = parse(&html);
    let ids: Vec<_> = parsed.elements().map(|e| (e.id().to_string(), e.kind())).collect();
    let expected: Vec<_> = template.elements().map(|e| (e.id().to_string(), e.kind())).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_starter_template_round_trips() {
    let mut ids = IDGenerator::new();
    let template = starter_template("Welcome", &mut ids);

    let parsed = parse(&render(&template).unwrap());

    assert_eq!(parsed, template);
}
