//! Tag classification: one total function resolving each element to a
//! closed category, replacing cascading per-tag checks at use sites.

/// Dispatch category for an element, in the builder's priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagCategory {
    /// `h1`..`h6`, with the level.
    Heading(u8),
    /// Inline text-bearing tags rendered as a single text run.
    InlineText,
    /// List wrappers that become fixed-spacing auto-layout frames.
    ListContainer,
    Button,
    Input,
    TextArea,
    Image,
    /// `svg` roots; sub-elements are consumed by serialization, never
    /// visited independently.
    Vector,
    /// Everything else: a generic auto-layout frame.
    Container,
}

pub fn classify(tag: &str) -> TagCategory {
    match tag.to_ascii_lowercase().as_str() {
        "h1" => TagCategory::Heading(1),
        "h2" => TagCategory::Heading(2),
        "h3" => TagCategory::Heading(3),
        "h4" => TagCategory::Heading(4),
        "h5" => TagCategory::Heading(5),
        "h6" => TagCategory::Heading(6),
        "p" | "span" | "a" | "li" | "em" | "i" | "strong" | "b" | "u" | "s" | "small" | "label"
        | "code" | "pre" | "blockquote" | "figcaption" | "dt" | "dd" => TagCategory::InlineText,
        "ul" | "ol" | "dl" => TagCategory::ListContainer,
        "button" => TagCategory::Button,
        "input" | "select" => TagCategory::Input,
        "textarea" => TagCategory::TextArea,
        "img" | "picture" | "video" => TagCategory::Image,
        "svg" => TagCategory::Vector,
        _ => TagCategory::Container,
    }
}

/// Whether this category produces a text run directly from the element.
pub fn is_text_bearing(category: TagCategory) -> bool {
    matches!(
        category,
        TagCategory::Heading(_)
            | TagCategory::InlineText
            | TagCategory::Button
            | TagCategory::Input
            | TagCategory::TextArea
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_carry_level() {
        assert_eq!(classify("h3"), TagCategory::Heading(3));
        assert_eq!(classify("H1"), TagCategory::Heading(1));
    }

    #[test]
    fn unknown_tags_are_containers() {
        assert_eq!(classify("article"), TagCategory::Container);
        assert_eq!(classify("custom-widget"), TagCategory::Container);
    }

    #[test]
    fn vector_root_only() {
        assert_eq!(classify("svg"), TagCategory::Vector);
        // path/rect are never classified on their own; they only occur
        // inside an svg subtree which the builder serializes wholesale.
    }
}
