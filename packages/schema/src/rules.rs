//! Shape checks for individual string values

use mailcraft_document::Placeholder;
use once_cell::sync::Lazy;
use regex::Regex;

static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(https?://[^\s/?#]+[^\s]*|mailto:[^\s]+|tel:[^\s]+|#[^\s]*|/[^\s]*|\{\{\s*[\w.-]+\s*\}\})$",
    )
    .expect("link pattern compiles")
});

static IMAGE_SOURCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(https?://[^\s/?#]+[^\s]*|//[^\s]+|/[^\s]*|cid:[^\s]+|data:image/[a-z0-9.+-]+;base64,[A-Za-z0-9+/=]+)$",
    )
    .expect("image source pattern compiles")
});

static COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(#[0-9a-fA-F]{3,8}|(rgb|rgba|hsl|hsla)\([^)]*\)|[a-zA-Z]+)$")
        .expect("color pattern compiles")
});

/// What a placeholder-capable string field expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// Non-empty text
    Text,
    /// `http(s)://`, `mailto:`, `tel:`, `#`, root-relative path or `{{merge_tag}}`
    Link,
    /// `http(s)://`, protocol-relative, root-relative, `cid:` or inline data image
    ImageSource,
}

impl FieldShape {
    pub fn placeholder(self) -> Placeholder {
        match self {
            FieldShape::Text => Placeholder::Text,
            FieldShape::Link => Placeholder::Link,
            FieldShape::ImageSource => Placeholder::Image,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            FieldShape::Text => "non-empty text",
            FieldShape::Link => "a link (URL, mailto:, #anchor or /path)",
            FieldShape::ImageSource => "an image URL or path",
        }
    }

    /// `Ok` when `value` is the matching placeholder token or satisfies the shape
    pub fn check(self, value: &str) -> Result<(), String> {
        if let Some(placeholder) = Placeholder::from_token(value) {
            return if placeholder == self.placeholder() {
                Ok(())
            } else {
                Err(format!(
                    "expected {} or {}, found placeholder {}",
                    self.describe(),
                    self.placeholder(),
                    placeholder
                ))
            };
        }

        let ok = match self {
            FieldShape::Text => !value.trim().is_empty(),
            FieldShape::Link => is_link_like(value),
            FieldShape::ImageSource => is_image_source(value),
        };

        if ok {
            Ok(())
        } else if value.is_empty() {
            Err(format!(
                "expected {} or {}, found empty string",
                self.describe(),
                self.placeholder()
            ))
        } else {
            Err(format!(
                "expected {} or {}, found '{}'",
                self.describe(),
                self.placeholder(),
                value
            ))
        }
    }
}

pub fn is_link_like(value: &str) -> bool {
    LINK_RE.is_match(value.trim())
}

pub fn is_image_source(value: &str) -> bool {
    IMAGE_SOURCE_RE.is_match(value.trim())
}

pub fn is_color(value: &str) -> bool {
    COLOR_RE.is_match(value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_like_values() {
        for ok in [
            "https://example.com",
            "http://example.com/path?q=1",
            "#",
            "#section",
            "mailto:hello@example.com",
            "/account/settings",
            "tel:+15555550100",
            "{{unsubscribe_url}}",
        ] {
            assert!(is_link_like(ok), "{ok} should be link-like");
        }

        for bad in ["", "example.com", "javascript:alert(1)", "https://", "not a link"] {
            assert!(!is_link_like(bad), "{bad} should not be link-like");
        }
    }

    #[test]
    fn test_image_sources() {
        assert!(is_image_source("https://cdn.example.com/hero.png"));
        assert!(is_image_source("/images/logo.png"));
        assert!(is_image_source("cid:logo"));
        assert!(is_image_source("data:image/png;base64,iVBORw0KGgo="));
        assert!(!is_image_source("logo.png"));
        assert!(!is_image_source(""));
    }

    #[test]
    fn test_colors() {
        assert!(is_color("#fff"));
        assert!(is_color("#2563eb"));
        assert!(is_color("rgba(0, 0, 0, 0.5)"));
        assert!(is_color("white"));
        assert!(!is_color("#zzz"));
        assert!(!is_color(""));
    }

    #[test]
    fn test_placeholder_must_match_shape() {
        assert!(FieldShape::Link.check("@@PLACEHOLDER_LINK@@").is_ok());
        assert!(FieldShape::ImageSource.check("@@PLACEHOLDER_IMAGE@@").is_ok());
        assert!(FieldShape::Text.check("@@PLACEHOLDER_TEXT@@").is_ok());

        let err = FieldShape::Link.check("@@PLACEHOLDER_IMAGE@@").unwrap_err();
        assert!(err.contains("found placeholder"));
    }

    #[test]
    fn test_empty_string_message() {
        let err = FieldShape::Link.check("").unwrap_err();
        assert!(err.contains("empty string"));
    }
}
