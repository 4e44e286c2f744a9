use crate::elements::compile_element;
use mailcraft_document::{style, Column, NodeKind, Row, Section, StyleMap, Template, SCHEMA_VERSION};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during HTML compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Unsupported document version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Column {column} has span {span}, expected 1..=12")]
    InvalidSpan { column: String, span: u8 },
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Options for HTML compilation
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Pretty print HTML
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
    /// Image shown where an image source is a placeholder
    pub placeholder_image_url: String,
    /// Wrap the container in `<html>`, `<head>` and `<body>`
    pub full_document: bool,
    /// Class put on the content table
    pub container_class: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: "  ".to_string(),
            placeholder_image_url: "https://placehold.co/600x300?text=Image".to_string(),
            full_document: true,
            container_class: "email-container".to_string(),
        }
    }
}

pub(crate) struct Context<'a> {
    pub(crate) options: &'a CompileOptions,
    depth: usize,
    buffer: String,
}

impl<'a> Context<'a> {
    fn new(options: &'a CompileOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub(crate) fn add_line(&mut self, text: &str) {
        if self.options.pretty {
            self.add_indent();
        }
        self.add(text);
        if self.options.pretty {
            self.add("\n");
        }
    }

    fn add_indent(&mut self) {
        for _ in 0..self.depth {
            self.buffer.push_str(&self.options.indent);
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    /// `open`, then whatever `body` writes one level deeper, then `close`
    fn block<F>(&mut self, open: &str, close: &str, body: F) -> CompileResult<()>
    where
        F: FnOnce(&mut Self) -> CompileResult<()>,
    {
        self.add_line(open);
        self.indent();
        body(self)?;
        self.dedent();
        self.add_line(close);
        Ok(())
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

/// Compile a template to email markup
pub fn compile_to_html(template: &Template, options: &CompileOptions) -> CompileResult<String> {
    if template.version != SCHEMA_VERSION {
        return Err(CompileError::UnsupportedVersion {
            found: template.version,
            expected: SCHEMA_VERSION,
        });
    }

    let mut ctx = Context::new(options);

    if options.full_document {
        ctx.add_line("<!DOCTYPE html>");
        ctx.block("<html>", "</html>", |ctx| {
            compile_head(template, ctx);
            let body_style = format!(
                "background-color: {}; margin: 0; padding: 0",
                escape_attribute(&template.global_styles.background_color)
            );
            ctx.block(&format!("<body style=\"{body_style}\">"), "</body>", |ctx| {
                let wrapper = format!(
                    "<table role=\"presentation\" width=\"100%\" bgcolor=\"{}\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\">",
                    escape_attribute(&template.global_styles.background_color)
                );
                ctx.block(&wrapper, "</table>", |ctx| {
                    ctx.block("<tr>", "</tr>", |ctx| {
                        ctx.block("<td align=\"center\">", "</td>", |ctx| {
                            compile_container(template, ctx)
                        })
                    })
                })
            })
        })?;
    } else {
        compile_container(template, &mut ctx)?;
    }

    debug!(
        template = %template.id,
        sections = template.sections.len(),
        "compiled template"
    );

    Ok(ctx.get_output())
}

/// Compile with [`CompileOptions::default`]
pub fn render(template: &Template) -> CompileResult<String> {
    compile_to_html(template, &CompileOptions::default())
}

fn compile_head(template: &Template, ctx: &mut Context) {
    ctx.add_line("<head>");
    ctx.indent();

    ctx.add_line("<meta charset=\"UTF-8\">");
    ctx.add_line("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">");
    ctx.add_line(&format!("<title>{}</title>", escape_text(&template.name)));

    ctx.dedent();
    ctx.add_line("</head>");
}

fn compile_container(template: &Template, ctx: &mut Context) -> CompileResult<()> {
    let globals = &template.global_styles;
    let open = format!(
        "<table class=\"{}\" data-template-id=\"{}\" data-template-name=\"{}\" role=\"presentation\" width=\"{}\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\" style=\"font-family: {}; max-width: {}px\">",
        escape_attribute(&ctx.options.container_class),
        escape_attribute(&template.id),
        escape_attribute(&template.name),
        globals.content_width,
        escape_attribute(&globals.font_family),
        globals.content_width,
    );

    ctx.block(&open, "</table>", |ctx| {
        for section in &template.sections {
            compile_section(section, ctx)?;
        }
        Ok(())
    })
}

fn compile_section(section: &Section, ctx: &mut Context) -> CompileResult<()> {
    let cell = format!(
        "<td id=\"{}\"{}>",
        escape_attribute(&NodeKind::Section.dom_id(&section.id)),
        style_attribute(&section.style)
    );

    ctx.block("<tr>", "</tr>", |ctx| {
        ctx.block(&cell, "</td>", |ctx| {
            ctx.block(&presentation_table(), "</table>", |ctx| {
                for row in &section.rows {
                    compile_row(row, ctx)?;
                }
                Ok(())
            })
        })
    })
}

fn compile_row(row: &Row, ctx: &mut Context) -> CompileResult<()> {
    let open = format!("<tr id=\"{}\">", escape_attribute(&NodeKind::Row.dom_id(&row.id)));
    let cell = format!("<td{}>", style_attribute(&row.style));

    ctx.block(&open, "</tr>", |ctx| {
        ctx.block(&cell, "</td>", |ctx| {
            ctx.block(&presentation_table(), "</table>", |ctx| {
                ctx.block("<tr>", "</tr>", |ctx| {
                    for column in &row.columns {
                        compile_column(column, ctx)?;
                    }
                    Ok(())
                })
            })
        })
    })
}

fn compile_column(column: &Column, ctx: &mut Context) -> CompileResult<()> {
    if !(1..=12).contains(&column.span) {
        return Err(CompileError::InvalidSpan {
            column: column.id.clone(),
            span: column.span,
        });
    }

    let width = (f64::from(column.span) * 100.0 / 12.0).round() as u32;
    let cell = format!(
        "<td id=\"{}\" data-span=\"{}\" width=\"{}%\" valign=\"top\"{}>",
        escape_attribute(&NodeKind::Column.dom_id(&column.id)),
        column.span,
        width,
        style_attribute(&column.style)
    );

    ctx.block(&cell, "</td>", |ctx| {
        ctx.block(&presentation_table(), "</table>", |ctx| {
            for element in &column.elements {
                ctx.block("<tr>", "</tr>", |ctx| {
                    let cell = format!(
                        "<td id=\"{}\" data-type=\"{}\"{}>",
                        escape_attribute(&NodeKind::Element.dom_id(element.id())),
                        element.kind().tag(),
                        style_attribute(&element.layout().to_style())
                    );
                    ctx.block(&cell, "</td>", |ctx| {
                        let content = compile_element(element, ctx.options);
                        ctx.add_line(&content);
                        Ok(())
                    })
                })?;
            }
            Ok(())
        })
    })
}

pub(crate) fn presentation_table() -> String {
    "<table role=\"presentation\" width=\"100%\" cellpadding=\"0\" cellspacing=\"0\" border=\"0\">"
        .to_string()
}

/// ` style="..."`, or nothing for an empty map
pub(crate) fn style_attribute(map: &StyleMap) -> String {
    let encoded = style::encode(map);
    if encoded.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", escape_attribute(&encoded))
    }
}

/// Escape text content; line breaks become `<br>`
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace("\r\n", "\n")
        .replace('\n', "<br>")
}

/// Escape text inside `<pre>`, keeping line breaks
pub fn escape_preformatted(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_attribute(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
