//! Generic node tree built from markup.
//!
//! This pass knows nothing about emails. `html5ever` does the tree
//! construction (implicit closes, character references, table fixups) and
//! the resulting `RcDom` is copied into plain owned nodes for the mapping
//! pass.

use html5ever::parse_document as parse_html;
use html5ever::tendril::TendrilSink;
use mailcraft_document::{style, StyleMap};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Wrappers looked through when collecting table rows and cells
const TABLE_GROUPS: &[&str] = &["tbody", "thead", "tfoot"];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(ElementNode),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementNode {
    /// Lowercased tag name
    pub tag: String,
    /// Lowercased names, decoded values, in source order
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn style(&self) -> StyleMap {
        self.attr("style").map(style::decode).unwrap_or_default()
    }

    pub fn element_children(&self) -> impl Iterator<Item = &ElementNode> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn first_child(&self) -> Option<&ElementNode> {
        self.element_children().next()
    }

    /// Whether any child is text other than whitespace
    pub fn has_text_children(&self) -> bool {
        self.children.iter().any(|child| match child {
            Node::Text(text) => !text.trim().is_empty(),
            Node::Element(_) => false,
        })
    }

    /// First descendant (depth-first, excluding `self`) matching `predicate`
    pub fn find<P>(&self, predicate: P) -> Option<&ElementNode>
    where
        P: Fn(&ElementNode) -> bool + Copy,
    {
        for child in self.element_children() {
            if predicate(child) {
                return Some(child);
            }
            if let Some(found) = child.find(predicate) {
                return Some(found);
            }
        }
        None
    }

    pub fn find_tag(&self, tag: &str) -> Option<&ElementNode> {
        self.find(|node| node.tag == tag)
    }

    /// All descendants with the given tag, in document order
    pub fn find_all(&self, tag: &str) -> Vec<&ElementNode> {
        let mut found = Vec::new();
        self.collect_tag(tag, &mut found);
        found
    }

    fn collect_tag<'a>(&'a self, tag: &str, found: &mut Vec<&'a ElementNode>) {
        for child in self.element_children() {
            if child.tag == tag {
                found.push(child);
            }
            child.collect_tag(tag, found);
        }
    }

    /// Direct children with the given tag, looking through `tbody`/`thead`/`tfoot`
    pub fn children_by_tag(&self, tag: &str) -> Vec<&ElementNode> {
        let mut found = Vec::new();
        for child in self.element_children() {
            if child.tag == tag {
                found.push(child);
            } else if TABLE_GROUPS.contains(&child.tag.as_str()) {
                found.extend(child.element_children().filter(|c| c.tag == tag));
            }
        }
        found
    }

    /// Visible text with whitespace collapsed; `<br>` becomes a line break
    pub fn text_content(&self) -> String {
        let mut raw = String::new();
        self.push_text(&mut raw, false);

        raw.split('\n')
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    /// Text exactly as written, for preformatted content
    pub fn raw_text(&self) -> String {
        let mut raw = String::new();
        self.push_text(&mut raw, true);
        raw
    }

    fn push_text(&self, out: &mut String, preserve: bool) {
        for child in &self.children {
            match child {
                Node::Text(text) if preserve => out.push_str(text),
                // Source newlines are layout, not content.
                Node::Text(text) => out.push_str(&text.replace(['\n', '\r'], " ")),
                Node::Element(element) if element.tag == "br" => out.push('\n'),
                Node::Element(element) => element.push_text(out, preserve),
            }
        }
    }
}

/// Build the node tree for a whole document. Fragments are placed in the
/// implied `html`/`body` elements the way a browser would.
pub fn build_tree(source: &str) -> Vec<Node> {
    let dom = parse_html(RcDom::default(), Default::default()).one(source);

    let mut roots = Vec::new();
    for child in dom.document.children.borrow().iter() {
        copy_node(child, &mut roots);
    }
    roots
}

/// Parse markup and wrap it in a synthetic root element
pub fn parse_document(source: &str) -> ElementNode {
    ElementNode {
        tag: "#document".to_string(),
        attributes: Vec::new(),
        children: build_tree(source),
    }
}

fn copy_node(handle: &Handle, siblings: &mut Vec<Node>) {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let mut element = ElementNode::new(name.local.to_string());
            element.attributes = attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect();
            for child in handle.children.borrow().iter() {
                copy_node(child, &mut element.children);
            }
            siblings.push(Node::Element(element));
        }
        NodeData::Text { contents } => {
            let text = contents.borrow();
            // Keep adjacent runs together so `a < b` stays one text node.
            if let Some(Node::Text(previous)) = siblings.last_mut() {
                previous.push_str(&text);
            } else {
                siblings.push(Node::Text(text.to_string()));
            }
        }
        NodeData::Document => {
            for child in handle.children.borrow().iter() {
                copy_node(child, siblings);
            }
        }
        NodeData::Doctype { .. }
        | NodeData::Comment { .. }
        | NodeData::ProcessingInstruction { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(source: &str) -> ElementNode {
        parse_document(source)
    }

    #[test]
    fn test_nesting_and_attributes() {
        let doc = root(r#"<table class="a b" width=600><tr><td id="x">Hi</td></tr></table>"#);
        let table = doc.find_tag("table").unwrap();

        assert_eq!(table.tag, "table");
        assert!(table.has_class("b"));
        assert_eq!(table.attr("width"), Some("600"));

        let rows = table.children_by_tag("tr");
        assert_eq!(rows.len(), 1);
        let cell = rows[0].first_child().unwrap();
        assert_eq!(cell.attr("id"), Some("x"));
        assert_eq!(cell.text_content(), "Hi");
    }

    #[test]
    fn test_fragment_gets_document_shell() {
        let doc = root("<p>Loose</p>");
        let html = doc.first_child().unwrap();

        assert_eq!(html.tag, "html");
        let body = doc.find_tag("body").unwrap();
        assert_eq!(body.first_child().map(|p| p.tag.as_str()), Some("p"));
    }

    #[test]
    fn test_tbody_is_looked_through() {
        let doc = root("<table><tbody><tr><td>1</td></tr><tr><td>2</td></tr></tbody></table>");
        let table = doc.find_tag("table").unwrap();
        assert_eq!(table.children_by_tag("tr").len(), 2);
    }

    #[test]
    fn test_void_and_self_closing_tags() {
        let doc = root(r#"<div><img src="a.png"><br/><hr>text</div>"#);
        let div = doc.find_tag("div").unwrap();
        let tags: Vec<_> = div.element_children().map(|e| e.tag.as_str()).collect();

        assert_eq!(tags, vec!["img", "br", "hr"]);
        assert!(div.has_text_children());
    }

    #[test]
    fn test_unclosed_and_stray_tags() {
        let doc = root("<div><p>one</span><p>two</div>");
        let div = doc.find_tag("div").unwrap();

        let paragraphs: Vec<_> = div.element_children().map(|p| p.text_content()).collect();
        assert_eq!(paragraphs, vec!["one", "two"]);
    }

    #[test]
    fn test_unclosed_cell_ends_at_next_cell() {
        let doc = root(
            r#"<table><tr><td id="element-e1"><p>A</p><td id="element-e2"><p>B</p></tr></table>"#,
        );
        let row = doc.find_tag("tr").unwrap();

        let cells: Vec<_> = row
            .children_by_tag("td")
            .into_iter()
            .map(|td| (td.attr("id").unwrap_or_default(), td.text_content()))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("element-e1", "A".to_string()),
                ("element-e2", "B".to_string())
            ]
        );
    }

    #[test]
    fn test_unclosed_rows_and_items() {
        let doc = root("<table><tr><td>1<tr><td>2</table><ul><li>a<li>b</ul>");
        let table = doc.find_tag("table").unwrap();

        assert_eq!(table.children_by_tag("tr").len(), 2);
        assert_eq!(doc.find_all("li").len(), 2);
    }

    #[test]
    fn test_text_content_collapses_whitespace() {
        let doc = root("<p>\n  Hello\n   <b>big</b>   world<br>Second   line </p>");
        assert_eq!(doc.find_tag("p").unwrap().text_content(), "Hello big world\nSecond line");
    }

    #[test]
    fn test_raw_text_preserves_layout() {
        let doc = root("<pre><code>fn main() {\n    run();\n}</code></pre>");
        assert_eq!(doc.find_tag("code").unwrap().raw_text(), "fn main() {\n    run();\n}");
    }

    #[test]
    fn test_character_references() {
        let doc = root("<p>Tom &amp; Jerry &lt;3 It&rsquo;s &euro;5 &#39;q&#x27; &unknown;</p>");
        assert_eq!(
            doc.find_tag("p").unwrap().text_content(),
            "Tom & Jerry <3 It\u{2019}s \u{20ac}5 'q' &unknown;"
        );

        let doc = root(r#"<a href="/x?a=1&amp;b=2">go</a>"#);
        assert_eq!(doc.find_tag("a").unwrap().attr("href"), Some("/x?a=1&b=2"));
    }

    #[test]
    fn test_comments_and_doctype_are_dropped() {
        let doc = root("<!DOCTYPE html><!-- a > b --><p>kept</p>");
        assert_eq!(doc.find_tag("body").unwrap().text_content(), "kept");
    }

    #[test]
    fn test_find_all_in_document_order() {
        let doc = root(r#"<p><a href="1">a</a> | <span><a href="2">b</a></span></p>"#);
        let hrefs: Vec<_> = doc.find_all("a").iter().filter_map(|a| a.attr("href")).collect();
        assert_eq!(hrefs, vec!["1", "2"]);
    }
}
