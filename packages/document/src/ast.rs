use crate::placeholder::Fillable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Document schema version this crate reads and writes
pub const SCHEMA_VERSION: u32 = 2;

/// Flat presentation properties, camelCase keys (e.g. `backgroundColor`)
pub type StyleMap = BTreeMap<String, String>;

/// Root document node (one email)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub version: u32,
    #[serde(default)]
    pub global_styles: GlobalStyles,
    pub sections: Vec<Section>,
}

/// Styles applied to the whole email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalStyles {
    pub background_color: String,
    pub font_family: String,
    /// Content width in pixels
    pub content_width: u32,
}

impl Default for GlobalStyles {
    fn default() -> Self {
        Self {
            background_color: "#f4f4f5".to_string(),
            font_family: "Arial, Helvetica, sans-serif".to_string(),
            content_width: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    #[serde(default)]
    pub style: StyleMap,
    pub rows: Vec<Row>,
    /// Set while a `section_delete` change awaits review
    #[serde(default, skip_serializing_if = "is_false")]
    pub pending_deletion: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub id: String,
    #[serde(default)]
    pub style: StyleMap,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    /// Grid span out of 12
    pub span: u8,
    #[serde(default)]
    pub style: StyleMap,
    #[serde(default)]
    pub elements: Vec<Element>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

// ---------------------------------------------------------------------------
// Layout & typography
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            _ => None,
        }
    }
}

/// Box edges in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Spacing {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Spacing {
    pub fn uniform(value: u32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn symmetric(vertical: u32, horizontal: u32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Spacing::default()
    }
}

/// Box-model-like placement of an element inside its column
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    pub margin: Spacing,
    pub padding: Spacing,
    pub align: Alignment,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Typography {
    /// Pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<String>,
}

// ---------------------------------------------------------------------------
// Element properties
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderProps {
    pub content: Fillable,
    /// 1..=6
    pub level: u8,
    #[serde(default)]
    pub typography: Typography,
}

/// Shared by text, subtext and preview text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    pub content: Fillable,
    #[serde(default)]
    pub typography: Typography,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonStyle {
    pub background_color: String,
    pub text_color: String,
    #[serde(default)]
    pub border_radius: u32,
    #[serde(default)]
    pub full_width: bool,
}

impl Default for ButtonStyle {
    fn default() -> Self {
        Self {
            background_color: "#2563eb".to_string(),
            text_color: "#ffffff".to_string(),
            border_radius: 4,
            full_width: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonProps {
    /// Label
    pub content: Fillable,
    pub href: Fillable,
    pub style: ButtonStyle,
    #[serde(default)]
    pub typography: Typography,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProps {
    pub src: Fillable,
    #[serde(default)]
    pub alt: String,
    /// Wraps the image in a link when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<Fillable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            LineStyle::Solid => "solid",
            LineStyle::Dashed => "dashed",
            LineStyle::Dotted => "dotted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "solid" => Some(LineStyle::Solid),
            "dashed" => Some(LineStyle::Dashed),
            "dotted" => Some(LineStyle::Dotted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DividerProps {
    pub color: String,
    pub thickness: u32,
    pub line_style: LineStyle,
}

impl Default for DividerProps {
    fn default() -> Self {
        Self {
            color: "#e5e7eb".to_string(),
            thickness: 1,
            line_style: LineStyle::Solid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacerProps {
    /// Pixels, must be positive
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteProps {
    pub content: Fillable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(default)]
    pub typography: Typography,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeProps {
    pub content: Fillable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProps {
    pub items: Vec<String>,
    #[serde(default)]
    pub ordered: bool,
    #[serde(default)]
    pub typography: Typography,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconProps {
    pub src: Fillable,
    #[serde(default)]
    pub alt: String,
    #[serde(default = "default_icon_size")]
    pub size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<Fillable>,
}

fn default_icon_size() -> u32 {
    24
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavLink {
    pub label: String,
    pub href: Fillable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavProps {
    pub links: Vec<NavLink>,
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default)]
    pub typography: Typography,
}

fn default_separator() -> String {
    "|".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLink {
    /// e.g. `twitter`, `linkedin`
    pub platform: String,
    pub href: Fillable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialProps {
    pub links: Vec<SocialLink>,
    #[serde(default = "default_social_icon_size")]
    pub icon_size: u32,
}

fn default_social_icon_size() -> u32 {
    32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStore {
    Apple,
    Google,
}

impl AppStore {
    pub fn as_str(self) -> &'static str {
        match self {
            AppStore::Apple => "apple",
            AppStore::Google => "google",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "apple" => Some(AppStore::Apple),
            "google" => Some(AppStore::Google),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStoreBadgeProps {
    pub store: AppStore,
    pub href: Fillable,
}

/// Shared by the unsubscribe and preferences links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkTextProps {
    pub content: Fillable,
    pub href: Fillable,
    #[serde(default)]
    pub typography: Typography,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewTextProps {
    pub content: Fillable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerProps {
    pub content: Fillable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default)]
    pub border_width: u32,
    #[serde(default)]
    pub border_radius: u32,
    #[serde(default)]
    pub typography: Typography,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterProps {
    pub content: Fillable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub typography: Typography,
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// Leaf content unit. The `type` tag selects the shape of `properties`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Element {
    Header {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: HeaderProps,
    },
    Text {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: TextProps,
    },
    Button {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: ButtonProps,
    },
    Image {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: ImageProps,
    },
    Divider {
        id: String,
        #[serde(default)]
        layout: Layout,
        #[serde(default)]
        properties: DividerProps,
    },
    Spacer {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: SpacerProps,
    },
    Subtext {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: TextProps,
    },
    Quote {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: QuoteProps,
    },
    Code {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: CodeProps,
    },
    List {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: ListProps,
    },
    Icon {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: IconProps,
    },
    Nav {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: NavProps,
    },
    Social {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: SocialProps,
    },
    AppStoreBadge {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: AppStoreBadgeProps,
    },
    Unsubscribe {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: LinkTextProps,
    },
    Preferences {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: LinkTextProps,
    },
    PreviewText {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: PreviewTextProps,
    },
    #[serde(alias = "box")]
    Container {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: ContainerProps,
    },
    Footer {
        id: String,
        #[serde(default)]
        layout: Layout,
        properties: FooterProps,
    },
}

macro_rules! each_variant {
    ($value:expr, $field:ident) => {
        match $value {
            Element::Header { $field, .. }
            | Element::Text { $field, .. }
            | Element::Button { $field, .. }
            | Element::Image { $field, .. }
            | Element::Divider { $field, .. }
            | Element::Spacer { $field, .. }
            | Element::Subtext { $field, .. }
            | Element::Quote { $field, .. }
            | Element::Code { $field, .. }
            | Element::List { $field, .. }
            | Element::Icon { $field, .. }
            | Element::Nav { $field, .. }
            | Element::Social { $field, .. }
            | Element::AppStoreBadge { $field, .. }
            | Element::Unsubscribe { $field, .. }
            | Element::Preferences { $field, .. }
            | Element::PreviewText { $field, .. }
            | Element::Container { $field, .. }
            | Element::Footer { $field, .. } => $field,
        }
    };
}

impl Element {
    pub fn id(&self) -> &str {
        each_variant!(self, id)
    }

    pub fn set_id(&mut self, new_id: impl Into<String>) {
        *each_variant!(self, id) = new_id.into();
    }

    pub fn layout(&self) -> &Layout {
        each_variant!(self, layout)
    }

    pub fn layout_mut(&mut self) -> &mut Layout {
        each_variant!(self, layout)
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Header { .. } => ElementKind::Header,
            Element::Text { .. } => ElementKind::Text,
            Element::Button { .. } => ElementKind::Button,
            Element::Image { .. } => ElementKind::Image,
            Element::Divider { .. } => ElementKind::Divider,
            Element::Spacer { .. } => ElementKind::Spacer,
            Element::Subtext { .. } => ElementKind::Subtext,
            Element::Quote { .. } => ElementKind::Quote,
            Element::Code { .. } => ElementKind::Code,
            Element::List { .. } => ElementKind::List,
            Element::Icon { .. } => ElementKind::Icon,
            Element::Nav { .. } => ElementKind::Nav,
            Element::Social { .. } => ElementKind::Social,
            Element::AppStoreBadge { .. } => ElementKind::AppStoreBadge,
            Element::Unsubscribe { .. } => ElementKind::Unsubscribe,
            Element::Preferences { .. } => ElementKind::Preferences,
            Element::PreviewText { .. } => ElementKind::PreviewText,
            Element::Container { .. } => ElementKind::Container,
            Element::Footer { .. } => ElementKind::Footer,
        }
    }

    /// Main text body, for kinds that have one
    pub fn content(&self) -> Option<&Fillable> {
        match self {
            Element::Header { properties, .. } => Some(&properties.content),
            Element::Text { properties, .. } | Element::Subtext { properties, .. } => {
                Some(&properties.content)
            }
            Element::Button { properties, .. } => Some(&properties.content),
            Element::Quote { properties, .. } => Some(&properties.content),
            Element::Code { properties, .. } => Some(&properties.content),
            Element::Unsubscribe { properties, .. } | Element::Preferences { properties, .. } => {
                Some(&properties.content)
            }
            Element::PreviewText { properties, .. } => Some(&properties.content),
            Element::Container { properties, .. } => Some(&properties.content),
            Element::Footer { properties, .. } => Some(&properties.content),
            Element::Image { .. }
            | Element::Divider { .. }
            | Element::Spacer { .. }
            | Element::List { .. }
            | Element::Icon { .. }
            | Element::Nav { .. }
            | Element::Social { .. }
            | Element::AppStoreBadge { .. } => None,
        }
    }

    pub fn content_mut(&mut self) -> Option<&mut Fillable> {
        match self {
            Element::Header { properties, .. } => Some(&mut properties.content),
            Element::Text { properties, .. } | Element::Subtext { properties, .. } => {
                Some(&mut properties.content)
            }
            Element::Button { properties, .. } => Some(&mut properties.content),
            Element::Quote { properties, .. } => Some(&mut properties.content),
            Element::Code { properties, .. } => Some(&mut properties.content),
            Element::Unsubscribe { properties, .. } | Element::Preferences { properties, .. } => {
                Some(&mut properties.content)
            }
            Element::PreviewText { properties, .. } => Some(&mut properties.content),
            Element::Container { properties, .. } => Some(&mut properties.content),
            Element::Footer { properties, .. } => Some(&mut properties.content),
            Element::Image { .. }
            | Element::Divider { .. }
            | Element::Spacer { .. }
            | Element::List { .. }
            | Element::Icon { .. }
            | Element::Nav { .. }
            | Element::Social { .. }
            | Element::AppStoreBadge { .. } => None,
        }
    }
}

/// The closed set of element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Header,
    Text,
    Button,
    Image,
    Divider,
    Spacer,
    Subtext,
    Quote,
    Code,
    List,
    Icon,
    Nav,
    Social,
    AppStoreBadge,
    Unsubscribe,
    Preferences,
    PreviewText,
    Container,
    Footer,
}

impl ElementKind {
    pub const ALL: [ElementKind; 19] = [
        ElementKind::Header,
        ElementKind::Text,
        ElementKind::Button,
        ElementKind::Image,
        ElementKind::Divider,
        ElementKind::Spacer,
        ElementKind::Subtext,
        ElementKind::Quote,
        ElementKind::Code,
        ElementKind::List,
        ElementKind::Icon,
        ElementKind::Nav,
        ElementKind::Social,
        ElementKind::AppStoreBadge,
        ElementKind::Unsubscribe,
        ElementKind::Preferences,
        ElementKind::PreviewText,
        ElementKind::Container,
        ElementKind::Footer,
    ];

    /// Value of the `type` tag
    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::Header => "header",
            ElementKind::Text => "text",
            ElementKind::Button => "button",
            ElementKind::Image => "image",
            ElementKind::Divider => "divider",
            ElementKind::Spacer => "spacer",
            ElementKind::Subtext => "subtext",
            ElementKind::Quote => "quote",
            ElementKind::Code => "code",
            ElementKind::List => "list",
            ElementKind::Icon => "icon",
            ElementKind::Nav => "nav",
            ElementKind::Social => "social",
            ElementKind::AppStoreBadge => "app-store-badge",
            ElementKind::Unsubscribe => "unsubscribe",
            ElementKind::Preferences => "preferences",
            ElementKind::PreviewText => "preview-text",
            ElementKind::Container => "container",
            ElementKind::Footer => "footer",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag == "box" {
            return Some(ElementKind::Container);
        }
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Position of an element inside a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementLocation {
    pub section: usize,
    pub row: usize,
    pub column: usize,
    pub element: usize,
}

impl Template {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: SCHEMA_VERSION,
            global_styles: GlobalStyles::default(),
            sections: Vec::new(),
        }
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_mut(&mut self, id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    pub fn section_index(&self, id: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.id == id)
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.sections
            .iter()
            .flat_map(|s| s.rows.iter())
            .flat_map(|r| r.columns.iter())
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns().find(|c| c.id == id)
    }

    pub fn column_mut(&mut self, id: &str) -> Option<&mut Column> {
        self.sections
            .iter_mut()
            .flat_map(|s| s.rows.iter_mut())
            .flat_map(|r| r.columns.iter_mut())
            .find(|c| c.id == id)
    }

    /// All elements in render order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.columns().flat_map(|c| c.elements.iter())
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements().find(|e| e.id() == id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        let loc = self.locate_element(id)?;
        Some(self.element_at_mut(loc))
    }

    pub fn locate_element(&self, id: &str) -> Option<ElementLocation> {
        for (si, section) in self.sections.iter().enumerate() {
            for (ri, row) in section.rows.iter().enumerate() {
                for (ci, column) in row.columns.iter().enumerate() {
                    if let Some(ei) = column.elements.iter().position(|e| e.id() == id) {
                        return Some(ElementLocation {
                            section: si,
                            row: ri,
                            column: ci,
                            element: ei,
                        });
                    }
                }
            }
        }
        None
    }

    fn element_at_mut(&mut self, loc: ElementLocation) -> &mut Element {
        &mut self.sections[loc.section].rows[loc.row].columns[loc.column].elements[loc.element]
    }

    /// Detach an element from its column
    pub fn remove_element(&mut self, id: &str) -> Option<Element> {
        let loc = self.locate_element(id)?;
        Some(
            self.sections[loc.section].rows[loc.row].columns[loc.column]
                .elements
                .remove(loc.element),
        )
    }

    /// Id of the column holding `element_id`
    pub fn parent_column_id(&self, element_id: &str) -> Option<&str> {
        let loc = self.locate_element(element_id)?;
        Some(&self.sections[loc.section].rows[loc.row].columns[loc.column].id)
    }

    pub fn element_count(&self) -> usize {
        self.elements().count()
    }
}

impl Section {
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.rows
            .iter()
            .flat_map(|r| r.columns.iter())
            .flat_map(|c| c.elements.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

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

    #[test]
    fn test_element_tag_round_trip() {
        let json = json!({
            "type": "app-store-badge",
            "id": "e1",
            "properties": { "store": "apple", "href": "https://apps.apple.com" }
        });

        let element: Element = serde_json::from_value(json).unwrap();
        assert_eq!(element.kind(), ElementKind::AppStoreBadge);
        assert_eq!(element.id(), "e1");
        assert_eq!(element.layout(), &Layout::default());

        let back = serde_json::to_value(&element).unwrap();
        assert_eq!(back["type"], "app-store-badge");
    }

    #[test]
    fn test_box_alias() {
        let json = json!({
            "type": "box",
            "id": "b1",
            "properties": { "content": "Inside" }
        });
        let element: Element = serde_json::from_value(json).unwrap();
        assert_eq!(element.kind(), ElementKind::Container);
        assert_eq!(ElementKind::from_tag("box"), Some(ElementKind::Container));
    }

    #[test]
    fn test_every_kind_tag_resolves() {
        for kind in ElementKind::ALL {
            assert_eq!(ElementKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ElementKind::from_tag("carousel"), None);
    }

    #[test]
    fn test_lookup_and_remove() {
        let mut template = Template::new("t1", "Test");
        template.sections.push(Section {
            id: "s1".to_string(),
            style: StyleMap::new(),
            pending_deletion: false,
            rows: vec![Row {
                id: "r1".to_string(),
                style: StyleMap::new(),
                columns: vec![Column {
                    id: "c1".to_string(),
                    span: 12,
                    style: StyleMap::new(),
                    elements: vec![text("e1", "Hello"), text("e2", "World")],
                }],
            }],
        });

        assert_eq!(template.element_count(), 2);
        assert_eq!(template.parent_column_id("e2"), Some("c1"));
        assert_eq!(
            template.locate_element("e2"),
            Some(ElementLocation {
                section: 0,
                row: 0,
                column: 0,
                element: 1,
            })
        );

        let removed = template.remove_element("e1").unwrap();
        assert_eq!(removed.id(), "e1");
        assert!(template.element("e1").is_none());
        assert_eq!(template.element_count(), 1);
    }

    #[test]
    fn test_pending_deletion_not_serialized_when_false() {
        let section = Section {
            id: "s1".to_string(),
            style: StyleMap::new(),
            rows: vec![],
            pending_deletion: false,
        };
        let value = serde_json::to_value(&section).unwrap();
        assert!(value.get("pendingDeletion").is_none());
    }
}
