//! # Style Codec
//!
//! Converts between a flat [`StyleMap`] (camelCase keys) and the inline
//! `style="..."` text used by the markup dialect (kebab-case keys).
//!
//! Both directions are total: malformed fragments are dropped, never
//! reported. `decode(encode(m))` keeps every key/value pair of `m`, though
//! whitespace may be normalized.

use crate::ast::{Alignment, Layout, Spacing, StyleMap, Typography};
use logos::Logos;

/// Keys carried structurally rather than as presentation properties
const NON_STYLE_KEYS: &[&str] = &["href"];

/// Pieces of inline style text. Quoted strings and parenthesized groups are
/// single tokens, so separators inside `url(...)` or font names stay put.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum StyleToken {
    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[regex(r#""[^"]*"|'[^']*'"#)]
    Quoted,

    #[regex(r"\([^)]*\)")]
    Group,

    #[regex(r#"[^;:"'()]+"#)]
    Run,
}

/// Parse inline style text into a style map
pub fn decode(style_text: &str) -> StyleMap {
    let mut map = StyleMap::new();
    let mut start = 0;
    let mut colon = None;

    // Unbalanced quotes and parentheses lex as errors and stay part of the
    // surrounding declaration.
    for (token, span) in StyleToken::lexer(style_text).spanned() {
        match token {
            Ok(StyleToken::Colon) if colon.is_none() => colon = Some(span.start),
            Ok(StyleToken::Semicolon) => {
                insert_declaration(&mut map, style_text, start, colon, span.start);
                start = span.end;
                colon = None;
            }
            _ => {}
        }
    }
    insert_declaration(&mut map, style_text, start, colon, style_text.len());

    map
}

fn insert_declaration(
    map: &mut StyleMap,
    text: &str,
    start: usize,
    colon: Option<usize>,
    end: usize,
) {
    let Some(colon) = colon else {
        return;
    };

    let key = text[start..colon].trim();
    let value = text[colon + 1..end].trim();
    if key.is_empty() || value.is_empty() {
        return;
    }

    map.insert(to_camel_case(&key.to_ascii_lowercase()), value.to_string());
}

/// Render a style map as inline style text
pub fn encode(style: &StyleMap) -> String {
    style
        .iter()
        .filter(|(key, value)| !NON_STYLE_KEYS.contains(&key.as_str()) && !value.trim().is_empty())
        .map(|(key, value)| format!("{}: {}", to_kebab_case(key), value.trim()))
        .collect::<Vec<_>>()
        .join("; ")
}

/// `background-color` → `backgroundColor`, `-webkit-text-size-adjust` → `WebkitTextSizeAdjust`
pub fn to_camel_case(property: &str) -> String {
    let mut out = String::with_capacity(property.len());
    let mut upper_next = false;

    for (i, ch) in property.chars().enumerate() {
        if ch == '-' {
            // A leading dash marks a vendor prefix, which keeps its capital.
            upper_next = i == 0 || !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }

    out
}

/// Inverse of [`to_camel_case`]
pub fn to_kebab_case(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);

    for ch in property.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }

    out
}

/// `"16px"`, `"16"` and `"16.4px"` all parse to 16
pub fn parse_px(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    let parsed: f64 = number.parse().ok()?;
    if parsed.is_sign_negative() || !parsed.is_finite() {
        return None;
    }
    Some(parsed.round() as u32)
}

pub fn format_px(value: u32) -> String {
    format!("{}px", value)
}

impl Spacing {
    /// Parse CSS shorthand with one to four pixel values
    pub fn parse_shorthand(value: &str) -> Option<Spacing> {
        let parts: Option<Vec<u32>> = value.split_whitespace().map(parse_px).collect();
        match parts?.as_slice() {
            [all] => Some(Spacing::uniform(*all)),
            [v, h] => Some(Spacing::symmetric(*v, *h)),
            [t, h, b] => Some(Spacing {
                top: *t,
                right: *h,
                bottom: *b,
                left: *h,
            }),
            [t, r, b, l] => Some(Spacing {
                top: *t,
                right: *r,
                bottom: *b,
                left: *l,
            }),
            _ => None,
        }
    }

    pub fn to_shorthand(&self) -> String {
        format!(
            "{} {} {} {}",
            format_px(self.top),
            format_px(self.right),
            format_px(self.bottom),
            format_px(self.left)
        )
    }

    /// Read `<prefix>` shorthand then `<prefix>Top` style longhands
    fn from_style(style: &StyleMap, prefix: &str) -> Spacing {
        let mut spacing = style
            .get(prefix)
            .and_then(|v| Spacing::parse_shorthand(v))
            .unwrap_or_default();

        let sides: [(&str, &mut u32); 4] = [
            ("Top", &mut spacing.top),
            ("Right", &mut spacing.right),
            ("Bottom", &mut spacing.bottom),
            ("Left", &mut spacing.left),
        ];
        for (side, slot) in sides {
            if let Some(px) = style.get(&format!("{prefix}{side}")).and_then(|v| parse_px(v)) {
                *slot = px;
            }
        }

        spacing
    }
}

impl Layout {
    pub fn to_style(&self) -> StyleMap {
        let mut style = StyleMap::new();
        if let Some(width) = &self.width {
            style.insert("width".to_string(), width.clone());
        }
        if let Some(height) = &self.height {
            style.insert("height".to_string(), height.clone());
        }
        if !self.margin.is_zero() {
            style.insert("margin".to_string(), self.margin.to_shorthand());
        }
        if !self.padding.is_zero() {
            style.insert("padding".to_string(), self.padding.to_shorthand());
        }
        style.insert("textAlign".to_string(), self.align.as_str().to_string());
        style
    }

    pub fn from_style(style: &StyleMap) -> Layout {
        Layout {
            width: style.get("width").cloned(),
            height: style.get("height").cloned(),
            margin: Spacing::from_style(style, "margin"),
            padding: Spacing::from_style(style, "padding"),
            align: style
                .get("textAlign")
                .and_then(|v| Alignment::parse(v))
                .unwrap_or_default(),
        }
    }
}

impl Typography {
    pub fn to_style(&self) -> StyleMap {
        let mut style = StyleMap::new();
        if let Some(size) = self.font_size {
            style.insert("fontSize".to_string(), format_px(size));
        }
        let text_props = [
            ("fontWeight", &self.font_weight),
            ("fontFamily", &self.font_family),
            ("color", &self.color),
            ("lineHeight", &self.line_height),
        ];
        for (key, value) in text_props {
            if let Some(value) = value {
                style.insert(key.to_string(), value.clone());
            }
        }
        style
    }

    pub fn from_style(style: &StyleMap) -> Typography {
        Typography {
            font_size: style.get("fontSize").and_then(|v| parse_px(v)),
            font_weight: style.get("fontWeight").cloned(),
            font_family: style.get("fontFamily").cloned(),
            color: style.get("color").cloned(),
            line_height: style.get("lineHeight").cloned(),
        }
    }
}
