//! Font resolution: fallback cascades, alias map, substitution records.

use std::collections::HashMap;

use tracing::debug;

use mosaic_css::parse_font_weight;
use mosaic_scene::FontName;

use crate::classify::{TagCategory, classify, is_text_bearing};
use crate::tree::{StyleMap, StyleTreeNode};

/// Family used when every candidate fails, and as the cascade's last resort.
pub const DEFAULT_FAMILY: &str = "Inter";

/// Static fallback table: web families mapped to close host-side stand-ins.
const FALLBACK_FAMILIES: &[(&str, &str)] = &[
    ("Roboto", "Inter"),
    ("Open Sans", "Inter"),
    ("Lato", "Inter"),
    ("Montserrat", "Inter"),
    ("Source Sans Pro", "Inter"),
    ("Noto Sans", "Inter"),
    ("Helvetica", "Arial"),
    ("Helvetica Neue", "Arial"),
    ("Merriweather", "Georgia"),
    ("PT Serif", "Georgia"),
    ("Playfair Display", "Georgia"),
    ("Oswald", "Arial Black"),
    ("Roboto Mono", "Courier New"),
    ("Fira Code", "Courier New"),
];

/// One of the four canonical style names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub fn name(self) -> &'static str {
        match self {
            FontStyle::Regular => "Regular",
            FontStyle::Bold => "Bold",
            FontStyle::Italic => "Italic",
            FontStyle::BoldItalic => "Bold Italic",
        }
    }

    /// Derive from computed `font-weight` / `font-style` values: weight of
    /// 700+ (or the `bold` keyword) is Bold, `italic` adds the modifier.
    pub fn from_css(weight: Option<&str>, style: Option<&str>) -> Self {
        let bold = weight
            .and_then(parse_font_weight)
            .map(|w| w >= 700.0)
            .unwrap_or(false);
        let italic = style
            .map(|s| s.to_ascii_lowercase().contains("italic"))
            .unwrap_or(false);
        match (bold, italic) {
            (false, false) => FontStyle::Regular,
            (true, false) => FontStyle::Bold,
            (false, true) => FontStyle::Italic,
            (true, true) => FontStyle::BoldItalic,
        }
    }

    /// Upgrade the weight to bold while keeping the italic modifier.
    pub fn bold_variant(self) -> Self {
        match self {
            FontStyle::Italic | FontStyle::BoldItalic => FontStyle::BoldItalic,
            FontStyle::Regular | FontStyle::Bold => FontStyle::Bold,
        }
    }

    fn regular_variant(self) -> Self {
        match self {
            FontStyle::Bold | FontStyle::Regular => FontStyle::Regular,
            FontStyle::Italic | FontStyle::BoldItalic => FontStyle::Regular,
        }
    }
}

/// A logical font request derived from an element's computed style.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontRequest {
    pub family: String,
    pub style: FontStyle,
}

impl FontRequest {
    pub fn from_style(style: &StyleMap) -> Self {
        let family = style
            .get("font-family")
            .map(first_family)
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_FAMILY.to_string());
        Self {
            family,
            style: FontStyle::from_css(style.get("font-weight"), style.get("font-style")),
        }
    }

    fn font_name(&self) -> FontName {
        FontName::new(self.family.clone(), self.style.name())
    }
}

/// First family in a `font-family` list, unquoted.
fn first_family(value: &str) -> String {
    value
        .split(',')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontSubstitution {
    pub original: String,
    pub fallback: String,
}

/// Host capability: attempt to load a concrete font.
pub trait FontHost {
    fn try_load(&mut self, font: &FontName) -> bool;
}

/// Production host backed by the system font database.
pub struct SystemFontHost {
    db: fontdb::Database,
}

impl SystemFontHost {
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Self { db }
    }
}

impl Default for SystemFontHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FontHost for SystemFontHost {
    fn try_load(&mut self, font: &FontName) -> bool {
        let (weight, style) = match font.style.as_str() {
            "Bold" => (fontdb::Weight::BOLD, fontdb::Style::Normal),
            "Italic" => (fontdb::Weight::NORMAL, fontdb::Style::Italic),
            "Bold Italic" => (fontdb::Weight::BOLD, fontdb::Style::Italic),
            _ => (fontdb::Weight::NORMAL, fontdb::Style::Normal),
        };
        let query = fontdb::Query {
            families: &[fontdb::Family::Name(&font.family)],
            weight,
            stretch: fontdb::Stretch::Normal,
            style,
        };
        self.db.query(&query).is_some()
    }
}

/// Resolves font requests through the fallback cascade, remembering every
/// decision for the lifetime of one import.
pub struct FontResolver {
    host: Box<dyn FontHost>,
    aliases: HashMap<FontRequest, FontName>,
    missing: Vec<FontRequest>,
    substitutions: Vec<FontSubstitution>,
}

impl FontResolver {
    pub fn new(host: Box<dyn FontHost>) -> Self {
        Self {
            host,
            aliases: HashMap::new(),
            missing: Vec::new(),
            substitutions: Vec::new(),
        }
    }

    /// Pre-pass: resolve every distinct font key the tree will need. Scans
    /// text-bearing elements and any element with raw text children.
    pub fn prepare(&mut self, nodes: &[StyleTreeNode]) {
        for node in nodes {
            let StyleTreeNode::Element(element) = node else {
                continue;
            };
            let category = classify(&element.tag);
            if is_text_bearing(category) || element.has_raw_text_child() {
                let mut request = FontRequest::from_style(&element.computed_style);
                // Headings render bold unless the style overrides the weight.
                if matches!(category, TagCategory::Heading(_))
                    && element.computed_style.get("font-weight").is_none()
                {
                    request.style = request.style.bold_variant();
                }
                let _ = self.resolve(&request);
            }
            self.prepare(&element.children);
        }
    }

    /// Resolve one request through the cascade: exact, then the table
    /// fallback at the requested style and at Regular. The first candidate
    /// the host loads wins and is cached for the whole import; a loaded
    /// fallback is recorded as a substitution, an exhausted cascade as a
    /// missing font rendered with the default family.
    pub fn resolve(&mut self, request: &FontRequest) -> FontName {
        if let Some(resolved) = self.aliases.get(request) {
            return resolved.clone();
        }
        let mut candidates = vec![request.font_name()];
        if let Some((_, fallback)) = FALLBACK_FAMILIES
            .iter()
            .find(|(family, _)| family.eq_ignore_ascii_case(&request.family))
        {
            candidates.push(FontName::new(*fallback, request.style.name()));
            candidates.push(FontName::new(
                *fallback,
                request.style.regular_variant().name(),
            ));
        }
        for candidate in &candidates {
            if self.host.try_load(candidate) {
                if candidate.family != request.family || candidate.style != request.style.name() {
                    debug!(from = %request.family, to = %candidate.family, "font substituted");
                    self.substitutions.push(FontSubstitution {
                        original: format!("{} {}", request.family, request.style.name()),
                        fallback: candidate.to_string(),
                    });
                }
                self.aliases.insert(request.clone(), candidate.clone());
                return candidate.clone();
            }
        }

        // Neither the exact font nor a table fallback loaded: the font is
        // missing, and the default family stands in for rendering only.
        debug!(family = %request.family, "no font candidate loaded");
        self.missing.push(request.clone());
        let default = FontName::new(DEFAULT_FAMILY, "Regular");
        self.aliases.insert(request.clone(), default.clone());
        default
    }

    pub fn missing(&self) -> &[FontRequest] {
        &self.missing
    }

    pub fn substitutions(&self) -> &[FontSubstitution] {
        &self.substitutions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    pub(crate) struct FakeHost {
        available: HashSet<(String, String)>,
    }

    impl FakeHost {
        fn with_families(families: &[(&str, &str)]) -> Self {
            Self {
                available: families
                    .iter()
                    .map(|(family, style)| (family.to_string(), style.to_string()))
                    .collect(),
            }
        }
    }

    impl FontHost for FakeHost {
        fn try_load(&mut self, font: &FontName) -> bool {
            self.available
                .contains(&(font.family.clone(), font.style.clone()))
        }
    }

    #[test]
    fn style_derivation() {
        assert_eq!(FontStyle::from_css(Some("700"), None), FontStyle::Bold);
        assert_eq!(FontStyle::from_css(Some("bold"), None), FontStyle::Bold);
        assert_eq!(
            FontStyle::from_css(Some("800"), Some("italic")),
            FontStyle::BoldItalic
        );
        assert_eq!(FontStyle::from_css(None, Some("italic")), FontStyle::Italic);
        assert_eq!(FontStyle::from_css(Some("400"), None), FontStyle::Regular);
    }

    #[test]
    fn table_fallback_records_substitution() {
        let host = FakeHost::with_families(&[("Inter", "Bold"), ("Inter", "Regular")]);
        let mut resolver = FontResolver::new(Box::new(host));
        let resolved = resolver.resolve(&FontRequest {
            family: "Roboto".to_string(),
            style: FontStyle::Bold,
        });
        assert_eq!(resolved, FontName::new("Inter", "Bold"));
        assert_eq!(resolver.substitutions().len(), 1);
        assert!(resolver.missing().is_empty());
    }

    #[test]
    fn unknown_family_is_missing_but_renders_default() {
        let host = FakeHost::with_families(&[]);
        let mut resolver = FontResolver::new(Box::new(host));
        let resolved = resolver.resolve(&FontRequest {
            family: "Fantasia".to_string(),
            style: FontStyle::Regular,
        });
        assert_eq!(resolved, FontName::new(DEFAULT_FAMILY, "Regular"));
        assert_eq!(resolver.missing().len(), 1);
    }

    #[test]
    fn untabled_family_is_missing_even_when_default_loads() {
        let host = FakeHost::with_families(&[("Inter", "Regular")]);
        let mut resolver = FontResolver::new(Box::new(host));
        let resolved = resolver.resolve(&FontRequest {
            family: "Fantasia".to_string(),
            style: FontStyle::Regular,
        });
        assert_eq!(resolved, FontName::new(DEFAULT_FAMILY, "Regular"));
        assert_eq!(resolver.missing().len(), 1);
        assert!(resolver.substitutions().is_empty());
    }

    #[test]
    fn bold_upgrade_keeps_the_italic_modifier() {
        assert_eq!(FontStyle::Regular.bold_variant(), FontStyle::Bold);
        assert_eq!(FontStyle::Italic.bold_variant(), FontStyle::BoldItalic);
        assert_eq!(FontStyle::Bold.bold_variant(), FontStyle::Bold);
        assert_eq!(FontStyle::BoldItalic.bold_variant(), FontStyle::BoldItalic);
    }

    #[test]
    fn alias_is_reused_without_new_records() {
        let host = FakeHost::with_families(&[("Inter", "Regular")]);
        let mut resolver = FontResolver::new(Box::new(host));
        let request = FontRequest {
            family: "Roboto".to_string(),
            style: FontStyle::Regular,
        };
        let first = resolver.resolve(&request);
        let second = resolver.resolve(&request);
        assert_eq!(first, second);
        assert_eq!(resolver.substitutions().len(), 1);
    }
}
