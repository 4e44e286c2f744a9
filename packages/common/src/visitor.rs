use mailcraft_document::*;
use std::collections::HashMap;

/// Visitor pattern for traversing a template immutably
///
/// Default implementations walk the whole tree in render order. Each hook
/// receives the parent node and the child's index within it.
pub trait Visitor: Sized {
    fn visit_template(&mut self, template: &Template) {
        walk_template(self, template);
    }

    fn visit_section(&mut self, index: usize, section: &Section) {
        walk_section(self, index, section);
    }

    fn visit_row(&mut self, section: &Section, index: usize, row: &Row) {
        walk_row(self, section, index, row);
    }

    fn visit_column(&mut self, row: &Row, index: usize, column: &Column) {
        walk_column(self, row, index, column);
    }

    fn visit_element(&mut self, _column: &Column, _index: usize, _element: &Element) {
        // Leaf node, no children to walk
    }
}

/// Mutable visitor for transforming a template in place
pub trait VisitorMut: Sized {
    fn visit_template_mut(&mut self, template: &mut Template) {
        walk_template_mut(self, template);
    }

    fn visit_section_mut(&mut self, section: &mut Section) {
        walk_section_mut(self, section);
    }

    fn visit_row_mut(&mut self, row: &mut Row) {
        walk_row_mut(self, row);
    }

    fn visit_column_mut(&mut self, column: &mut Column) {
        walk_column_mut(self, column);
    }

    fn visit_element_mut(&mut self, _element: &mut Element) {
        // Leaf node, no children to walk
    }
}

// Default walk implementations for immutable visitor

pub fn walk_template<V: Visitor>(visitor: &mut V, template: &Template) {
    for (index, section) in template.sections.iter().enumerate() {
        visitor.visit_section(index, section);
    }
}

pub fn walk_section<V: Visitor>(visitor: &mut V, _index: usize, section: &Section) {
    for (index, row) in section.rows.iter().enumerate() {
        visitor.visit_row(section, index, row);
    }
}

pub fn walk_row<V: Visitor>(visitor: &mut V, _section: &Section, _index: usize, row: &Row) {
    for (index, column) in row.columns.iter().enumerate() {
        visitor.visit_column(row, index, column);
    }
}

pub fn walk_column<V: Visitor>(visitor: &mut V, _row: &Row, _index: usize, column: &Column) {
    for (index, element) in column.elements.iter().enumerate() {
        visitor.visit_element(column, index, element);
    }
}

// Default walk implementations for mutable visitor

pub fn walk_template_mut<V: VisitorMut>(visitor: &mut V, template: &mut Template) {
    for section in &mut template.sections {
        visitor.visit_section_mut(section);
    }
}

pub fn walk_section_mut<V: VisitorMut>(visitor: &mut V, section: &mut Section) {
    for row in &mut section.rows {
        visitor.visit_row_mut(row);
    }
}

pub fn walk_row_mut<V: VisitorMut>(visitor: &mut V, row: &mut Row) {
    for column in &mut row.columns {
        visitor.visit_column_mut(column);
    }
}

pub fn walk_column_mut<V: VisitorMut>(visitor: &mut V, column: &mut Column) {
    for element in &mut column.elements {
        visitor.visit_element_mut(element);
    }
}

/// Every identifier in a template, tagged with the kind of node carrying it
#[derive(Debug, Default)]
pub struct IdCollector {
    pub ids: Vec<(NodeKind, String)>,
}

impl Visitor for IdCollector {
    fn visit_template(&mut self, template: &Template) {
        walk_template(self, template);
    }

    fn visit_section(&mut self, index: usize, section: &Section) {
        self.ids.push((NodeKind::Section, section.id.clone()));
        walk_section(self, index, section);
    }

    fn visit_row(&mut self, section: &Section, index: usize, row: &Row) {
        self.ids.push((NodeKind::Row, row.id.clone()));
        walk_row(self, section, index, row);
    }

    fn visit_column(&mut self, row: &Row, index: usize, column: &Column) {
        self.ids.push((NodeKind::Column, column.id.clone()));
        walk_column(self, row, index, column);
    }

    fn visit_element(&mut self, _column: &Column, _index: usize, element: &Element) {
        self.ids.push((NodeKind::Element, element.id().to_string()));
    }
}

pub fn collect_ids(template: &Template) -> Vec<(NodeKind, String)> {
    let mut collector = IdCollector::default();
    collector.visit_template(template);
    collector.ids
}

/// Identifiers used by more than one node, in first-seen order
pub fn duplicate_ids(template: &Template) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order = Vec::new();

    for (_, id) in collect_ids(template) {
        let count = counts.entry(id.clone()).or_insert(0);
        *count += 1;
        if *count == 2 {
            order.push(id);
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Template {
        let mut ids = IDGenerator::sequential("t");
        starter_template("Sample", &mut ids)
    }

    #[test]
    fn test_collect_ids_in_render_order() {
        let template = sample();
        let ids = collect_ids(&template);

        assert_eq!(ids[0].0, NodeKind::Section);
        assert_eq!(ids[1].0, NodeKind::Row);
        assert_eq!(ids[2].0, NodeKind::Column);
        assert_eq!(ids[3].0, NodeKind::Element);
        assert_eq!(
            ids.iter().filter(|(kind, _)| *kind == NodeKind::Element).count(),
            template.element_count()
        );
    }

    #[test]
    fn test_duplicate_ids() {
        let mut template = sample();
        assert!(duplicate_ids(&template).is_empty());

        let first = template.sections[0].id.clone();
        template.sections[1].id = first.clone();
        assert_eq!(duplicate_ids(&template), vec![first]);
    }

    struct Uppercase;

    impl VisitorMut for Uppercase {
        fn visit_element_mut(&mut self, element: &mut Element) {
            if let Some(Fillable::Value(text)) = element.content_mut() {
                *text = text.to_uppercase();
            }
        }
    }

    #[test]
    fn test_mutable_visitor_reaches_elements() {
        let mut template = sample();
        Uppercase.visit_template_mut(&mut template);

        let header = template
            .elements()
            .find(|e| e.kind() == ElementKind::Header)
            .unwrap();
        assert_eq!(
            header.content().and_then(|c| c.as_value()),
            Some("WELCOME TO OUR NEWSLETTER")
        );
    }
}
