//! Content tag for each element kind.
//!
//! Each element renders to a single line of markup placed inside its
//! `element-<id>` cell. Placeholder values get a `data-placeholder` marker
//! naming every placeholder on that tag, plus a visible stand-in.

use crate::compiler::{
    escape_attribute, escape_preformatted, escape_text, presentation_table, CompileOptions,
};
use mailcraft_document::style::format_px;
use mailcraft_document::{style, AppStore, Element, Fillable, Placeholder, StyleMap, Typography};

const TEXT_STAND_IN: &str = "Add your content here";

const APPLE_BADGE_URL: &str =
    "https://tools.applemarketingtools.com/api/badges/download-on-the-app-store/black/en-us";
const GOOGLE_BADGE_URL: &str =
    "https://play.google.com/intl/en_us/badges/static/images/badges/en_badge_web_generic.png";

/// Attributes of one tag, rendered in insertion order
#[derive(Default)]
struct Attrs {
    pairs: Vec<(&'static str, String)>,
    markers: Vec<Placeholder>,
}

impl Attrs {
    fn new() -> Self {
        Self::default()
    }

    fn set(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.pairs.push((name, value.into()));
        self
    }

    fn set_opt(self, name: &'static str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.set(name, value),
            None => self,
        }
    }

    fn style(self, map: &StyleMap) -> Self {
        let encoded = style::encode(map);
        if encoded.is_empty() {
            self
        } else {
            self.set("style", encoded)
        }
    }

    /// Record a placeholder marker when `value` is a placeholder
    fn mark(mut self, value: &Fillable) -> Self {
        if let Some(placeholder) = value.placeholder() {
            if !self.markers.contains(&placeholder) {
                self.markers.push(placeholder);
            }
        }
        self
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.pairs {
            out.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
        }
        if !self.markers.is_empty() {
            let markers: Vec<_> = self.markers.iter().map(|p| p.marker()).collect();
            out.push_str(&format!(" data-placeholder=\"{}\"", markers.join(" ")));
        }
        out
    }
}

fn tag(name: &str, attrs: Attrs, inner: &str) -> String {
    format!("<{}{}>{}</{}>", name, attrs.render(), inner, name)
}

fn void_tag(name: &str, attrs: Attrs) -> String {
    format!("<{}{}>", name, attrs.render())
}

fn text_html(value: &Fillable) -> String {
    match value {
        Fillable::Value(text) => escape_text(text),
        Fillable::Placeholder(_) => escape_text(TEXT_STAND_IN),
    }
}

fn href(value: &Fillable) -> &str {
    match value {
        Fillable::Value(href) => href,
        Fillable::Placeholder(_) => "#",
    }
}

fn src<'a>(value: &'a Fillable, options: &'a CompileOptions) -> &'a str {
    match value {
        Fillable::Value(src) => src,
        Fillable::Placeholder(_) => &options.placeholder_image_url,
    }
}

/// Typography with extra presentation keys that the parser ignores
fn text_style(typography: &Typography, extra: &[(&str, &str)]) -> StyleMap {
    let mut map = typography.to_style();
    for (key, value) in extra {
        map.entry(key.to_string()).or_insert_with(|| value.to_string());
    }
    map
}

fn linked(link: Option<&Fillable>, inner: String) -> String {
    match link {
        Some(link) => tag(
            "a",
            Attrs::new().set("href", href(link)).mark(link),
            &inner,
        ),
        None => inner,
    }
}

/// Render the content tag of one element
pub fn compile_element(element: &Element, options: &CompileOptions) -> String {
    match element {
        Element::Header { properties, .. } => {
            let level = properties.level.clamp(1, 6);
            tag(
                &format!("h{level}"),
                Attrs::new()
                    .style(&text_style(&properties.typography, &[("margin", "0")]))
                    .mark(&properties.content),
                &text_html(&properties.content),
            )
        }
        Element::Text { properties, .. } => tag(
            "p",
            Attrs::new()
                .style(&text_style(&properties.typography, &[("margin", "0")]))
                .mark(&properties.content),
            &text_html(&properties.content),
        ),
        Element::Subtext { properties, .. } => tag(
            "p",
            Attrs::new()
                .set("class", "subtext")
                .style(&text_style(&properties.typography, &[("margin", "0"), ("opacity", "0.8")]))
                .mark(&properties.content),
            &text_html(&properties.content),
        ),
        Element::Button { properties, .. } => {
            let button = &properties.style;
            let mut map = properties.typography.to_style();
            map.insert("color".into(), button.text_color.clone());
            map.insert("backgroundColor".into(), button.background_color.clone());
            map.insert("borderRadius".into(), format_px(button.border_radius));
            map.insert("padding".into(), "12px 24px".into());
            map.insert("textDecoration".into(), "none".into());
            if button.full_width {
                map.insert("display".into(), "block".into());
                map.insert("textAlign".into(), "center".into());
            } else {
                map.insert("display".into(), "inline-block".into());
            }

            tag(
                "a",
                Attrs::new()
                    .set("href", href(&properties.href))
                    .set("class", "button")
                    .style(&map)
                    .mark(&properties.href)
                    .mark(&properties.content),
                &text_html(&properties.content),
            )
        }
        Element::Image { properties, .. } => {
            let mut map = StyleMap::new();
            map.insert("display".into(), "block".into());
            map.insert("maxWidth".into(), "100%".into());
            map.insert("height".into(), "auto".into());
            map.insert("border".into(), "0".into());

            let img = void_tag(
                "img",
                Attrs::new()
                    .set("src", src(&properties.src, options))
                    .set("alt", properties.alt.clone())
                    .set_opt("width", properties.width.map(|w| w.to_string()))
                    .style(&map)
                    .mark(&properties.src),
            );
            linked(properties.href.as_ref(), img)
        }
        Element::Divider { properties, .. } => {
            let mut map = StyleMap::new();
            map.insert("border".into(), "0".into());
            map.insert(
                "borderTop".into(),
                format!(
                    "{} {} {}",
                    format_px(properties.thickness),
                    properties.line_style.as_str(),
                    properties.color
                ),
            );
            map.insert("margin".into(), "0".into());
            void_tag("hr", Attrs::new().style(&map))
        }
        Element::Spacer { properties, .. } => {
            let height = format_px(properties.height);
            let mut map = StyleMap::new();
            map.insert("height".into(), height.clone());
            map.insert("lineHeight".into(), height);
            map.insert("fontSize".into(), "0".into());

            let cell = tag(
                "td",
                Attrs::new().set("height", properties.height.to_string()).style(&map),
                "&nbsp;",
            );
            format!("{}<tr>{}</tr></table>", presentation_table(), cell)
        }
        Element::Quote { properties, .. } => {
            let mut quote_style = StyleMap::new();
            quote_style.insert("margin".into(), "0".into());
            quote_style.insert("paddingLeft".into(), "12px".into());
            quote_style.insert("borderLeft".into(), "3px solid #d1d5db".into());

            let mut inner = tag(
                "p",
                Attrs::new()
                    .style(&text_style(&properties.typography, &[("margin", "0")]))
                    .mark(&properties.content),
                &text_html(&properties.content),
            );
            if let Some(citation) = &properties.citation {
                inner.push_str(&tag("cite", Attrs::new(), &escape_text(citation)));
            }
            tag("blockquote", Attrs::new().style(&quote_style), &inner)
        }
        Element::Code { properties, .. } => {
            let mut map = StyleMap::new();
            map.insert("margin".into(), "0".into());
            map.insert("padding".into(), "12px".into());
            map.insert("backgroundColor".into(), "#f3f4f6".into());
            map.insert("fontFamily".into(), "Menlo, Consolas, monospace".into());
            map.insert("whiteSpace".into(), "pre-wrap".into());

            let body = match &properties.content {
                Fillable::Value(code) => escape_preformatted(code),
                Fillable::Placeholder(_) => escape_preformatted(TEXT_STAND_IN),
            };
            let code = tag(
                "code",
                Attrs::new().set_opt("data-language", properties.language.clone()),
                &body,
            );
            tag("pre", Attrs::new().style(&map).mark(&properties.content), &code)
        }
        Element::List { properties, .. } => {
            let name = if properties.ordered { "ol" } else { "ul" };
            let items: String = properties
                .items
                .iter()
                .map(|item| tag("li", Attrs::new(), &escape_text(item)))
                .collect();
            tag(
                name,
                Attrs::new().style(&text_style(
                    &properties.typography,
                    &[("margin", "0"), ("paddingLeft", "20px")],
                )),
                &items,
            )
        }
        Element::Icon { properties, .. } => {
            let mut map = StyleMap::new();
            map.insert("display".into(), "block".into());
            map.insert("border".into(), "0".into());

            let img = void_tag(
                "img",
                Attrs::new()
                    .set("src", src(&properties.src, options))
                    .set("alt", properties.alt.clone())
                    .set("width", properties.size.to_string())
                    .set("height", properties.size.to_string())
                    .style(&map)
                    .mark(&properties.src),
            );
            linked(properties.href.as_ref(), img)
        }
        Element::Nav { properties, .. } => {
            let separator = format!(" {} ", escape_text(&properties.separator));
            let links: Vec<String> = properties
                .links
                .iter()
                .map(|link| {
                    tag(
                        "a",
                        Attrs::new()
                            .set("href", href(&link.href))
                            .set("style", "color: inherit; text-decoration: none")
                            .mark(&link.href),
                        &escape_text(&link.label),
                    )
                })
                .collect();
            tag(
                "p",
                Attrs::new()
                    .set("class", "nav")
                    .set("data-separator", properties.separator.clone())
                    .style(&text_style(&properties.typography, &[("margin", "0")])),
                &links.join(&separator),
            )
        }
        Element::Social { properties, .. } => {
            let links: Vec<String> = properties
                .links
                .iter()
                .map(|link| {
                    tag(
                        "a",
                        Attrs::new()
                            .set("href", href(&link.href))
                            .set("data-platform", link.platform.clone())
                            .set("style", "display: inline-block; margin: 0 4px")
                            .mark(&link.href),
                        &escape_text(&link.platform),
                    )
                })
                .collect();
            tag(
                "p",
                Attrs::new()
                    .set("class", "social")
                    .set("data-icon-size", properties.icon_size.to_string())
                    .set("style", "margin: 0"),
                &links.join(" "),
            )
        }
        Element::AppStoreBadge { properties, .. } => {
            let (badge, alt) = match properties.store {
                AppStore::Apple => (APPLE_BADGE_URL, "Download on the App Store"),
                AppStore::Google => (GOOGLE_BADGE_URL, "Get it on Google Play"),
            };
            let img = void_tag(
                "img",
                Attrs::new()
                    .set("src", badge)
                    .set("alt", alt)
                    .set("height", "40")
                    .set("style", "display: block; border: 0"),
            );
            tag(
                "a",
                Attrs::new()
                    .set("href", href(&properties.href))
                    .set("data-store", properties.store.as_str())
                    .mark(&properties.href),
                &img,
            )
        }
        Element::Unsubscribe { properties, .. } | Element::Preferences { properties, .. } => {
            let link = tag(
                "a",
                Attrs::new()
                    .set("href", href(&properties.href))
                    .set("style", "color: inherit; text-decoration: underline")
                    .mark(&properties.href)
                    .mark(&properties.content),
                &text_html(&properties.content),
            );
            tag(
                "p",
                Attrs::new().style(&text_style(&properties.typography, &[("margin", "0")])),
                &link,
            )
        }
        Element::PreviewText { properties, .. } => tag(
            "div",
            Attrs::new()
                .set(
                    "style",
                    "display: none; max-height: 0; overflow: hidden; mso-hide: all",
                )
                .mark(&properties.content),
            &text_html(&properties.content),
        ),
        Element::Container { properties, .. } => {
            let mut map = properties.typography.to_style();
            if let Some(background) = &properties.background_color {
                map.insert("backgroundColor".into(), background.clone());
            }
            if let Some(border) = &properties.border_color {
                map.insert("borderColor".into(), border.clone());
                map.insert("borderStyle".into(), "solid".into());
            }
            map.insert("borderWidth".into(), format_px(properties.border_width));
            map.insert("borderRadius".into(), format_px(properties.border_radius));
            map.insert("padding".into(), "16px".into());

            tag(
                "div",
                Attrs::new().style(&map).mark(&properties.content),
                &text_html(&properties.content),
            )
        }
        Element::Footer { properties, .. } => {
            let mut inner = tag(
                "p",
                Attrs::new().set("style", "margin: 0").mark(&properties.content),
                &text_html(&properties.content),
            );
            if let Some(address) = &properties.address {
                inner.push_str(&tag(
                    "p",
                    Attrs::new()
                        .set("class", "address")
                        .set("style", "margin: 8px 0 0 0"),
                    &escape_text(address),
                ));
            }
            tag(
                "div",
                Attrs::new()
                    .set("class", "footer")
                    .style(&properties.typography.to_style()),
                &inner,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailcraft_document::{ButtonProps, ButtonStyle, Layout, LinkTextProps, SpacerProps};

    #[test]
    fn test_button_carries_both_markers() {
        let button = Element::Button {
            id: "b1".into(),
            layout: Layout::default(),
            properties: ButtonProps {
                content: Fillable::Placeholder(Placeholder::Text),
                href: Fillable::Placeholder(Placeholder::Link),
                style: ButtonStyle::default(),
                typography: Typography::default(),
            },
        };

        let html = compile_element(&button, &CompileOptions::default());
        assert!(html.starts_with("<a href=\"#\" class=\"button\""));
        assert!(html.contains("data-placeholder=\"link text\""));
        assert!(html.contains(TEXT_STAND_IN));
    }

    #[test]
    fn test_spacer_table() {
        let spacer = Element::Spacer {
            id: "s".into(),
            layout: Layout::default(),
            properties: SpacerProps { height: 24 },
        };

        let html = compile_element(&spacer, &CompileOptions::default());
        assert!(html.starts_with("<table role=\"presentation\" width=\"100%\""));
        assert!(html.contains("<td height=\"24\" style=\"font-size: 0; height: 24px; line-height: 24px\">&nbsp;</td>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let link = Element::Unsubscribe {
            id: "u".into(),
            layout: Layout::default(),
            properties: LinkTextProps {
                content: Fillable::value("Stop <all> mail & more"),
                href: Fillable::value("https://example.com/u?a=1&b=2"),
                typography: Typography::default(),
            },
        };

        let html = compile_element(&link, &CompileOptions::default());
        assert!(html.contains("Stop &lt;all&gt; mail &amp; more"));
        assert!(html.contains("href=\"https://example.com/u?a=1&amp;b=2\""));
    }
}
