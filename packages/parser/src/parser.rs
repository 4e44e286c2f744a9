use crate::dom::{parse_document, ElementNode};
use crate::error::{ParseError, ParseResult};
use mailcraft_document::style::parse_px;
use mailcraft_document::{
    Alignment, Column, Element, ElementKind, GlobalStyles, IDGenerator, Layout, NodeKind,
    Placeholder, Row, Section, Template, Typography,
};
use mailcraft_schema::validate_element;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

pub const DEFAULT_CONTAINER_CLASS: &str = "email-container";

const GRID_COLUMNS: u8 = 12;

/// Content widths a template may declare
const CONTENT_WIDTHS: std::ops::RangeInclusive<u32> = 320..=1200;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Class marking the canonical content table
    pub container_class: String,
    /// Run the schema rules on every extracted element and drop failures
    pub validate_elements: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            container_class: DEFAULT_CONTAINER_CLASS.to_string(),
            validate_elements: true,
        }
    }
}

/// A fragment left out of the parsed template
#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    pub kind: NodeKind,
    /// Identifier recovered from markup, if any
    pub id: Option<String>,
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ParseReport {
    pub template: Template,
    pub skipped: Vec<Skipped>,
}

/// Parse markup into a template. A document without a recognizable
/// container yields a template with no sections.
#[instrument(skip_all, fields(len = markup.len()))]
pub fn parse(markup: &str) -> Template {
    match parse_with_options(markup, &ParseOptions::default()) {
        Ok(report) => report.template,
        Err(err) => {
            warn!(error = %err, "returning empty template");
            let mut ids = IDGenerator::new();
            Template::new(ids.new_id(), "Untitled")
        }
    }
}

/// Like [`parse`], but a missing container is an error
pub fn parse_strict(markup: &str) -> ParseResult<Template> {
    parse_with_options(markup, &ParseOptions::default()).map(|report| report.template)
}

pub fn parse_with_options(markup: &str, options: &ParseOptions) -> ParseResult<ParseReport> {
    Parser::new(options.clone()).parse(markup)
}

/// Maps a generic node tree onto the document model
pub struct Parser {
    options: ParseOptions,
    ids: IDGenerator,
    seen: HashSet<String>,
    skipped: Vec<Skipped>,
}

impl Parser {
    pub fn new(options: ParseOptions) -> Self {
        Self::with_id_generator(options, IDGenerator::new())
    }

    pub fn with_id_generator(options: ParseOptions, ids: IDGenerator) -> Self {
        Self {
            options,
            ids,
            seen: HashSet::new(),
            skipped: Vec::new(),
        }
    }

    pub fn parse(mut self, markup: &str) -> ParseResult<ParseReport> {
        let document = parse_document(markup);
        let container = self
            .find_container(&document)
            .ok_or_else(|| ParseError::container_not_found(&self.options.container_class))?;

        let template_id = match container
            .attr("data-template-id")
            .filter(|id| !id.trim().is_empty())
        {
            Some(id) => id.to_string(),
            None => self.ids.new_id(),
        };
        let name = container
            .attr("data-template-name")
            .map(str::to_string)
            .or_else(|| document.find_tag("title").map(|t| t.text_content()))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Untitled".to_string());

        let mut template = Template::new(template_id, name);
        template.global_styles = global_styles(&document, container);

        for (index, row) in container.children_by_tag("tr").into_iter().enumerate() {
            if let Some(section) = self.section(row, index) {
                template.sections.push(section);
            }
        }

        debug!(
            sections = template.sections.len(),
            elements = template.element_count(),
            skipped = self.skipped.len(),
            "parsed template"
        );

        Ok(ParseReport {
            template,
            skipped: self.skipped,
        })
    }

    /// Tagged container first, then a table holding section cells, then the
    /// first table inside the first body row
    fn find_container<'a>(&self, document: &'a ElementNode) -> Option<&'a ElementNode> {
        let class = self.options.container_class.as_str();
        if let Some(tagged) = document.find(|node| node.has_class(class)) {
            return Some(tagged);
        }

        let holds_sections = |node: &ElementNode| {
            node.tag == "table"
                && node.children_by_tag("tr").iter().any(|tr| {
                    tr.children_by_tag("td").iter().any(|td| {
                        td.attr("id")
                            .and_then(|id| NodeKind::Section.parse_dom_id(id))
                            .is_some()
                    })
                })
        };
        if let Some(table) = document.find(holds_sections) {
            return Some(table);
        }

        let body = document.find_tag("body").unwrap_or(document);
        body.find_tag("tr")?.find_tag("table")
    }

    fn section(&mut self, tr: &ElementNode, index: usize) -> Option<Section> {
        let path = format!("sections[{index}]");
        let Some(cell) = first_cell(tr) else {
            self.skip(NodeKind::Section, tr.attr("id"), &path, "row has no content cell");
            return None;
        };

        let id = self.claim_id(NodeKind::Section, cell.attr("id").or(tr.attr("id")));
        let rows = match cell.find_tag("table") {
            Some(inner) => self.rows(inner, &path),
            None => Vec::new(),
        };

        Some(Section {
            id,
            style: cell.style(),
            rows,
            pending_deletion: false,
        })
    }

    /// Structured rows carry `row-<id>`; bare element rows are gathered into
    /// an implicit full-width row
    fn rows(&mut self, inner: &ElementNode, section_path: &str) -> Vec<Row> {
        let mut rows = Vec::new();
        let mut loose: Option<Row> = None;

        for tr in inner.children_by_tag("tr") {
            let is_row = tr
                .attr("id")
                .and_then(|id| NodeKind::Row.parse_dom_id(id))
                .is_some();

            if is_row {
                rows.extend(loose.take());
                let path = format!("{section_path}.rows[{}]", rows.len());
                if let Some(row) = self.row(tr, &path) {
                    rows.push(row);
                }
                continue;
            }

            if loose.is_none() {
                loose = Some(self.implicit_row());
            }
            let Some(row) = loose.as_mut() else {
                continue;
            };
            let column = &mut row.columns[0];
            let path = format!(
                "{section_path}.rows[{}].columns[0].elements[{}]",
                rows.len(),
                column.elements.len()
            );
            if let Some(element) = self.element(tr, &path) {
                column.elements.push(element);
            }
        }

        rows.extend(loose);
        rows
    }

    fn implicit_row(&mut self) -> Row {
        Row {
            id: self.ids.new_id(),
            style: Default::default(),
            columns: vec![Column {
                id: self.ids.new_id(),
                span: GRID_COLUMNS,
                style: Default::default(),
                elements: Vec::new(),
            }],
        }
    }

    fn row(&mut self, tr: &ElementNode, path: &str) -> Option<Row> {
        let Some(cell) = first_cell(tr) else {
            self.skip(NodeKind::Row, tr.attr("id"), path, "row has no content cell");
            return None;
        };

        let id = self.claim_id(NodeKind::Row, tr.attr("id"));
        let cells: Vec<&ElementNode> = cell
            .find_tag("table")
            .and_then(|grid| grid.children_by_tag("tr").into_iter().next())
            .map(|tr| tr.children_by_tag("td"))
            .unwrap_or_default();

        let count = cells.len();
        let columns = cells
            .into_iter()
            .enumerate()
            .map(|(i, td)| self.column(td, count, &format!("{path}.columns[{i}]")))
            .collect();

        Some(Row {
            id,
            style: cell.style(),
            columns,
        })
    }

    fn column(&mut self, td: &ElementNode, siblings: usize, path: &str) -> Column {
        let id = self.claim_id(NodeKind::Column, td.attr("id"));
        let span = column_span(td, siblings);

        let mut elements = Vec::new();
        if let Some(table) = td.find_tag("table") {
            for tr in table.children_by_tag("tr") {
                let element_path = format!("{path}.elements[{}]", elements.len());
                if let Some(element) = self.element(tr, &element_path) {
                    elements.push(element);
                }
            }
        }

        Column {
            id,
            span,
            style: td.style(),
            elements,
        }
    }

    fn element(&mut self, tr: &ElementNode, path: &str) -> Option<Element> {
        let Some(cell) = first_cell(tr) else {
            self.skip(NodeKind::Element, tr.attr("id"), path, "row has no content cell");
            return None;
        };

        let kind = match cell.attr("data-type") {
            Some(tag) => match ElementKind::from_tag(tag.trim()) {
                Some(kind) => kind,
                None => {
                    let reason = format!("unknown element type '{tag}'");
                    self.skip(NodeKind::Element, cell.attr("id"), path, reason);
                    return None;
                }
            },
            None => infer_kind(cell),
        };

        let id = self.claim_id(NodeKind::Element, cell.attr("id"));
        let layout = match serde_json::to_value(layout_of(cell)) {
            Ok(layout) => layout,
            Err(err) => {
                self.skip(NodeKind::Element, Some(id.as_str()), path, err.to_string());
                return None;
            }
        };

        let value = json!({
            "type": kind.tag(),
            "id": id,
            "layout": layout,
            "properties": properties(kind, cell),
        });

        if self.options.validate_elements {
            let issues = validate_element(&value, path);
            if !issues.is_empty() {
                let reason = issues
                    .iter()
                    .map(|issue| format!("{}: {}", issue.path, issue.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                self.skip(NodeKind::Element, Some(id.as_str()), path, reason);
                return None;
            }
        }

        match serde_json::from_value(value) {
            Ok(element) => Some(element),
            Err(err) => {
                self.skip(NodeKind::Element, Some(id.as_str()), path, err.to_string());
                None
            }
        }
    }

    /// Identifier from a `<kind>-<id>` attribute, or a fresh one when the
    /// attribute is missing or its id was already taken
    fn claim_id(&mut self, kind: NodeKind, dom_id: Option<&str>) -> String {
        if let Some(id) = dom_id.and_then(|attr| kind.parse_dom_id(attr)) {
            if self.seen.insert(id.to_string()) {
                return id.to_string();
            }
            let fresh = self.ids.new_id();
            warn!(kind = ?kind, id, replacement = %fresh, "duplicate identifier in markup");
            self.seen.insert(fresh.clone());
            return fresh;
        }

        let fresh = self.ids.new_id();
        self.seen.insert(fresh.clone());
        fresh
    }

    fn skip(&mut self, kind: NodeKind, id: Option<&str>, path: &str, reason: impl Into<String>) {
        let reason = reason.into();
        let id = id.map(|raw| kind.parse_dom_id(raw).unwrap_or(raw).to_string());
        warn!(kind = ?kind, id = ?id, path, reason = %reason, "skipping fragment");
        self.skipped.push(Skipped {
            kind,
            id,
            path: path.to_string(),
            reason,
        });
    }
}

fn first_cell(tr: &ElementNode) -> Option<&ElementNode> {
    tr.children_by_tag("td").into_iter().next()
}

fn global_styles(document: &ElementNode, container: &ElementNode) -> GlobalStyles {
    let mut globals = GlobalStyles::default();

    let container_style = container.style();
    if let Some(width) = container
        .attr("width")
        .and_then(parse_px)
        .or_else(|| container_style.get("maxWidth").and_then(|w| parse_px(w)))
        .filter(|w| *w > 0)
    {
        if CONTENT_WIDTHS.contains(&width) {
            globals.content_width = width;
        } else {
            warn!(
                width,
                default = globals.content_width,
                "container width out of range, keeping default"
            );
        }
    }
    if let Some(font) = container_style.get("fontFamily") {
        globals.font_family = font.clone();
    }

    let body = document.find_tag("body");
    let background = body
        .and_then(|b| b.style().get("backgroundColor").cloned())
        .or_else(|| body.and_then(|b| b.attr("bgcolor")).map(str::to_string));
    if let Some(background) = background {
        globals.background_color = background;
    }

    globals
}

/// `data-span`, then a percentage width, then an even split
fn column_span(td: &ElementNode, siblings: usize) -> u8 {
    let from_attr = td.attr("data-span").and_then(|s| s.trim().parse::<u8>().ok());
    let from_width = || {
        let width = td.attr("width")?;
        let percent: f64 = width.trim().strip_suffix('%')?.trim().parse().ok()?;
        Some((percent * f64::from(GRID_COLUMNS) / 100.0).round() as u8)
    };
    let even = (usize::from(GRID_COLUMNS) / siblings.max(1)) as u8;

    from_attr
        .or_else(from_width)
        .unwrap_or(even)
        .clamp(1, GRID_COLUMNS)
}

fn layout_of(cell: &ElementNode) -> Layout {
    let style = cell.style();
    let mut layout = Layout::from_style(&style);
    if !style.contains_key("textAlign") {
        if let Some(align) = cell.attr("align").and_then(Alignment::parse) {
            layout.align = align;
        }
    }
    layout
}

// ---------------------------------------------------------------------------
// Type inference
// ---------------------------------------------------------------------------

/// The single content tag of an element cell, absent when the cell holds
/// bare text
fn content_node(cell: &ElementNode) -> Option<&ElementNode> {
    if cell.has_text_children() {
        return None;
    }
    cell.first_child()
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn wraps_only_image(anchor: &ElementNode) -> bool {
    let mut children = anchor.element_children();
    matches!(
        (children.next(), children.next()),
        (Some(only), None) if only.tag == "img"
    ) && !anchor.has_text_children()
}

fn is_full_width(node: &ElementNode) -> bool {
    node.attr("width").map(str::trim) == Some("100%")
        || node.style().get("width").map(String::as_str) == Some("100%")
}

/// Tag-shape inference for cells without a `data-type` hint. Linked images
/// are checked before links so they do not read as buttons.
pub fn infer_kind(cell: &ElementNode) -> ElementKind {
    let Some(node) = content_node(cell) else {
        return ElementKind::Text;
    };

    match node.tag.as_str() {
        tag if heading_level(tag).is_some() => ElementKind::Header,
        "p" => ElementKind::Text,
        "a" if wraps_only_image(node) => ElementKind::Image,
        "a" => ElementKind::Button,
        "img" => ElementKind::Image,
        "hr" => ElementKind::Divider,
        "table" if is_full_width(node) => ElementKind::Spacer,
        _ => ElementKind::Text,
    }
}

// ---------------------------------------------------------------------------
// Property extraction
// ---------------------------------------------------------------------------

fn marked(node: &ElementNode, placeholder: Placeholder) -> bool {
    node.attr("data-placeholder")
        .map(|markers| {
            markers
                .split_whitespace()
                .any(|m| Placeholder::from_marker(m) == Some(placeholder))
        })
        .unwrap_or(false)
}

fn text_of(node: &ElementNode) -> String {
    if marked(node, Placeholder::Text) {
        return Placeholder::Text.token().to_string();
    }
    node.text_content()
}

fn href_of(anchor: &ElementNode) -> String {
    if marked(anchor, Placeholder::Link) {
        return Placeholder::Link.token().to_string();
    }
    anchor.attr("href").unwrap_or_default().trim().to_string()
}

fn src_of(img: &ElementNode) -> String {
    if marked(img, Placeholder::Image) {
        return Placeholder::Image.token().to_string();
    }
    img.attr("src").unwrap_or_default().trim().to_string()
}

fn typography_of(node: &ElementNode) -> Value {
    serde_json::to_value(Typography::from_style(&node.style())).unwrap_or_else(|_| json!({}))
}

fn pixels(node: &ElementNode, attr: &str, style_key: &str) -> Option<u32> {
    node.attr(attr)
        .and_then(parse_px)
        .or_else(|| node.style().get(style_key).and_then(|v| parse_px(v)))
}

fn insert_some(props: &mut Map<String, Value>, key: &str, value: Option<impl Into<Value>>) {
    if let Some(value) = value {
        props.insert(key.to_string(), value.into());
    }
}

/// Anchor directly wrapping `target`, if any
fn link_around<'a>(cell: &'a ElementNode, target: &str) -> Option<&'a ElementNode> {
    cell.find(|node| node.tag == "a" && node.find_tag(target).is_some())
}

/// Raw properties for `kind`, read from the element cell. Missing required
/// values are left out so validation reports them.
fn properties(kind: ElementKind, cell: &ElementNode) -> Value {
    let content = content_node(cell);
    let body = content.unwrap_or(cell);
    let mut props = Map::new();

    match kind {
        ElementKind::Header => {
            let heading = cell.find(|n| heading_level(&n.tag).is_some()).unwrap_or(body);
            props.insert("content".into(), text_of(heading).into());
            props.insert("level".into(), heading_level(&heading.tag).unwrap_or(1).into());
            props.insert("typography".into(), typography_of(heading));
        }
        ElementKind::Text | ElementKind::Subtext | ElementKind::PreviewText => {
            props.insert("content".into(), text_of(body).into());
            if kind != ElementKind::PreviewText {
                props.insert("typography".into(), typography_of(body));
            }
        }
        ElementKind::Button => {
            let anchor = cell.find_tag("a");
            let source = anchor.unwrap_or(body);
            let style = source.style();
            let defaults = mailcraft_document::ButtonStyle::default();

            props.insert("content".into(), text_of(source).into());
            insert_some(&mut props, "href", anchor.map(href_of));
            props.insert(
                "style".into(),
                json!({
                    "backgroundColor": style.get("backgroundColor").cloned().unwrap_or(defaults.background_color),
                    "textColor": style.get("color").cloned().unwrap_or(defaults.text_color),
                    "borderRadius": style.get("borderRadius").and_then(|v| parse_px(v)).unwrap_or(0),
                    "fullWidth": style.get("display").map(String::as_str) == Some("block")
                        || style.get("width").map(String::as_str) == Some("100%"),
                }),
            );
            // Text color lives in the button style.
            let mut typography = Typography::from_style(&style);
            typography.color = None;
            props.insert(
                "typography".into(),
                serde_json::to_value(typography).unwrap_or_else(|_| json!({})),
            );
        }
        ElementKind::Image | ElementKind::Icon => {
            let img = cell.find_tag("img");
            insert_some(&mut props, "src", img.map(src_of));
            props.insert(
                "alt".into(),
                img.and_then(|i| i.attr("alt")).unwrap_or_default().into(),
            );
            insert_some(&mut props, "href", link_around(cell, "img").map(href_of));
            let width = img.and_then(|i| pixels(i, "width", "width"));
            let size_key = if kind == ElementKind::Icon { "size" } else { "width" };
            insert_some(&mut props, size_key, width);
        }
        ElementKind::Divider => {
            if let Some(rule) = cell.find_tag("hr") {
                let style = rule.style();
                let border = style.get("borderTop").cloned().unwrap_or_default();
                for part in border.split_whitespace() {
                    if let Some(px) = parse_px(part) {
                        props.insert("thickness".into(), px.into());
                    } else if let Some(line) = mailcraft_document::LineStyle::parse(part) {
                        props.insert("lineStyle".into(), line.as_str().into());
                    } else {
                        props.insert("color".into(), part.into());
                    }
                }
                if !props.contains_key("color") {
                    insert_some(&mut props, "color", rule.attr("color").map(str::to_string));
                }
            }
        }
        ElementKind::Spacer => {
            let height = cell
                .find_tag("td")
                .and_then(|td| pixels(td, "height", "height"))
                .or_else(|| pixels(cell, "height", "height"));
            insert_some(&mut props, "height", height);
        }
        ElementKind::Quote => {
            let quote = cell.find_tag("blockquote").unwrap_or(body);
            let text = quote.find_tag("p").unwrap_or(quote);
            props.insert("content".into(), text_of(text).into());
            insert_some(
                &mut props,
                "citation",
                quote.find_tag("cite").map(|c| c.text_content()).filter(|c| !c.is_empty()),
            );
            props.insert("typography".into(), typography_of(text));
        }
        ElementKind::Code => {
            let pre = cell.find_tag("pre").unwrap_or(body);
            let code = pre.find_tag("code");
            let text = if marked(pre, Placeholder::Text) {
                Placeholder::Text.token().to_string()
            } else {
                code.unwrap_or(pre).raw_text()
            };
            props.insert("content".into(), text.into());
            let language = code.and_then(|c| {
                c.attr("data-language").map(str::to_string).or_else(|| {
                    c.attr("class")?
                        .split_whitespace()
                        .find_map(|class| class.strip_prefix("language-"))
                        .map(str::to_string)
                })
            });
            insert_some(&mut props, "language", language);
        }
        ElementKind::List => {
            let list = cell.find(|n| n.tag == "ul" || n.tag == "ol");
            let items: Vec<String> = list
                .map(|l| l.find_all("li").iter().map(|li| li.text_content()).collect())
                .unwrap_or_default();
            props.insert("items".into(), items.into());
            props.insert("ordered".into(), list.map(|l| l.tag == "ol").unwrap_or(false).into());
            props.insert("typography".into(), typography_of(list.unwrap_or(body)));
        }
        ElementKind::Nav => {
            let links: Vec<Value> = body
                .find_all("a")
                .into_iter()
                .map(|a| json!({ "label": a.text_content(), "href": href_of(a) }))
                .collect();
            props.insert("links".into(), links.into());
            insert_some(&mut props, "separator", body.attr("data-separator").map(str::to_string));
            props.insert("typography".into(), typography_of(body));
        }
        ElementKind::Social => {
            let links: Vec<Value> = body
                .find_all("a")
                .into_iter()
                .map(|a| {
                    let platform = a
                        .attr("data-platform")
                        .map(str::to_string)
                        .unwrap_or_else(|| a.text_content().to_lowercase());
                    json!({ "platform": platform, "href": href_of(a) })
                })
                .collect();
            props.insert("links".into(), links.into());
            insert_some(
                &mut props,
                "iconSize",
                body.attr("data-icon-size").and_then(parse_px),
            );
        }
        ElementKind::AppStoreBadge => {
            let anchor = cell.find_tag("a");
            let store = anchor.and_then(|a| {
                a.attr("data-store").map(str::to_string).or_else(|| {
                    let href = a.attr("href")?;
                    if href.contains("apple.com") {
                        Some("apple".to_string())
                    } else if href.contains("google.com") {
                        Some("google".to_string())
                    } else {
                        None
                    }
                })
            });
            insert_some(&mut props, "store", store);
            insert_some(&mut props, "href", anchor.map(href_of));
        }
        ElementKind::Unsubscribe | ElementKind::Preferences => {
            let anchor = cell.find_tag("a");
            props.insert("content".into(), text_of(anchor.unwrap_or(body)).into());
            insert_some(&mut props, "href", anchor.map(href_of));
            props.insert("typography".into(), typography_of(body));
        }
        ElementKind::Container => {
            let style = body.style();
            props.insert("content".into(), text_of(body).into());
            insert_some(&mut props, "backgroundColor", style.get("backgroundColor").cloned());
            insert_some(&mut props, "borderColor", style.get("borderColor").cloned());
            insert_some(
                &mut props,
                "borderWidth",
                style.get("borderWidth").and_then(|v| parse_px(v)),
            );
            insert_some(
                &mut props,
                "borderRadius",
                style.get("borderRadius").and_then(|v| parse_px(v)),
            );
            props.insert("typography".into(), typography_of(body));
        }
        ElementKind::Footer => {
            let address = body.find(|n| n.has_class("address"));
            let text = body
                .find(|n| n.tag == "p" && !n.has_class("address"))
                .unwrap_or(body);
            props.insert("content".into(), text_of(text).into());
            insert_some(
                &mut props,
                "address",
                address.map(|a| a.text_content()).filter(|a| !a.is_empty()),
            );
            props.insert("typography".into(), typography_of(body));
        }
    }

    Value::Object(props)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;

    /// Cells only parse inside a table, so fixtures are wrapped in one
    fn cell(markup: &str) -> ElementNode {
        parse_document(&format!("<table><tr>{markup}</tr></table>"))
            .find_tag("td")
            .cloned()
            .expect("fixture has a cell")
    }

    #[test]
    fn test_inference_precedence() {
        let cases = [
            ("<td><h2>Title</h2></td>", ElementKind::Header),
            ("<td><p>Body</p></td>", ElementKind::Text),
            (r#"<td><a href="/x"><img src="/a.png"></a></td>"#, ElementKind::Image),
            (r#"<td><a href="/x">Go</a></td>"#, ElementKind::Button),
            (r#"<td><img src="/a.png"></td>"#, ElementKind::Image),
            ("<td><hr></td>", ElementKind::Divider),
            (r#"<td><table width="100%"><tr><td height="20"></td></tr></table></td>"#, ElementKind::Spacer),
            ("<td><table><tr><td>x</td></tr></table></td>", ElementKind::Text),
            ("<td><span>Loose</span></td>", ElementKind::Text),
            ("<td>Bare text</td>", ElementKind::Text),
        ];

        for (markup, expected) in cases {
            assert_eq!(infer_kind(&cell(markup)), expected, "{markup}");
        }
    }

    #[test]
    fn test_linked_image_with_caption_is_a_button() {
        let markup = r#"<td><a href="/x"><img src="/a.png"> Shop</a></td>"#;
        assert_eq!(infer_kind(&cell(markup)), ElementKind::Button);
    }

    #[test]
    fn test_column_span_sources() {
        let doc = parse_document(
            r#"<table><tr><td data-span="4"></td><td width="50%"></td><td></td><td data-span="40"></td></tr></table>"#,
        );
        let tds = doc.find_all("td");
        assert_eq!(column_span(tds[0], 3), 4);
        assert_eq!(column_span(tds[1], 3), 6);
        assert_eq!(column_span(tds[2], 3), 4);
        assert_eq!(column_span(tds[3], 3), 12);
    }

    #[test]
    fn test_container_width_outside_range_keeps_default() {
        let widths = [("600", 600), ("1400", 600), ("200", 600), ("1200", 1200), ("0", 600)];

        for (width, expected) in widths {
            let doc = parse_document(&format!(
                r#"<table class="email-container" width="{width}"><tr><td></td></tr></table>"#
            ));
            let container = doc.find_tag("table").expect("fixture has a container");
            assert_eq!(global_styles(&doc, container).content_width, expected, "{width}");
        }

        let doc = parse_document(
            r#"<table class="email-container" style="max-width: 1400px"><tr><td></td></tr></table>"#,
        );
        let container = doc.find_tag("table").expect("fixture has a container");
        assert_eq!(global_styles(&doc, container).content_width, 600);
    }

    #[test]
    fn test_button_properties() {
        let props = properties(
            ElementKind::Button,
            &cell(r#"<td><a href="https://example.com" style="background-color: #000; color: #fff; border-radius: 6px; font-size: 16px">Buy</a></td>"#),
        );

        assert_eq!(props["content"], "Buy");
        assert_eq!(props["href"], "https://example.com");
        assert_eq!(props["style"]["backgroundColor"], "#000");
        assert_eq!(props["style"]["textColor"], "#fff");
        assert_eq!(props["style"]["borderRadius"], 6);
        assert_eq!(props["typography"]["fontSize"], 16);
        assert!(props["typography"].get("color").is_none());
    }

    #[test]
    fn test_placeholder_markers_restore_tokens() {
        let props = properties(
            ElementKind::Image,
            &cell(r##"<td><a href="#" data-placeholder="link"><img src="https://placehold.co/600x300" data-placeholder="image" alt="Hero"></a></td>"##),
        );

        assert_eq!(props["src"], Placeholder::Image.token());
        assert_eq!(props["href"], Placeholder::Link.token());
        assert_eq!(props["alt"], "Hero");
    }

    #[test]
    fn test_spacer_without_height_has_no_height() {
        let props = properties(
            ElementKind::Spacer,
            &cell(r#"<td><table width="100%"><tr><td></td></tr></table></td>"#),
        );
        assert!(props.get("height").is_none());
    }

    #[test]
    fn test_divider_border_parts() {
        let props = properties(
            ElementKind::Divider,
            &cell(r#"<td><hr style="border: 0; border-top: 2px dashed #cccccc"></td>"#),
        );
        assert_eq!(props, json!({ "thickness": 2, "lineStyle": "dashed", "color": "#cccccc" }));
    }
}
