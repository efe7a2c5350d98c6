//! Parsers turning raw CSS value strings into typed primitives.
//!
//! Every parser here is total: unparseable input yields `None` (or an empty
//! list), never an error. Callers treat an absent value as "property not
//! set" and fall back to their own defaults.

pub mod color;
pub mod edges;
pub mod gradient;
pub mod grid;
pub mod shadow;

pub use color::{Color, parse_color};
pub use edges::{BoxEdges, parse_border_shorthand, resolve_edges};
pub use gradient::{GradientKind, GradientSpec, GradientStop, gradient_transform, parse_gradient};
pub use grid::{GridTracks, parse_grid_tracks};
pub use shadow::{ShadowSpec, parse_shadow_list};

/// Parse a pixel length such as `16px`. Anything else (`auto`, percentages,
/// em units) is absent.
pub fn parse_length(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let stripped = trimmed.strip_suffix("px")?;
    stripped.trim().parse().ok()
}

/// Parse a bare number (used for width/height attributes).
pub fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse().ok()
}

/// Parse a `font-weight` value, mapping the CSS keywords onto numeric weights.
pub fn parse_font_weight(value: &str) -> Option<f64> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "normal" => Some(400.0),
        "bold" | "bolder" => Some(700.0),
        "lighter" => Some(300.0),
        other => other.parse().ok(),
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn normalize_whitespace(input: &str) -> String {
    let mut result = String::new();
    let mut prev_was_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !prev_was_space && !result.is_empty() {
                result.push(' ');
            }
            prev_was_space = true;
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result.trim_end().to_string()
}

/// Split on commas that sit outside any parentheses, so `rgba(0,0,0,0.5)`
/// stays a single fragment.
pub(crate) fn split_top_level_commas(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, ch) in input.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(input[start..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

/// Split on whitespace outside parentheses, keeping `rgb(2, 6, 23)` and
/// `minmax(100px, 1fr)` intact as single tokens.
pub(crate) fn split_top_level_whitespace(input: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0i32;
    let mut start: Option<usize> = None;
    for (i, ch) in input.char_indices() {
        match ch {
            '(' => {
                depth += 1;
                if start.is_none() {
                    start = Some(i);
                }
            }
            ')' => depth -= 1,
            c if c.is_whitespace() && depth == 0 => {
                if let Some(s) = start.take() {
                    tokens.push(&input[s..i]);
                }
            }
            _ => {
                if start.is_none() {
                    start = Some(i);
                }
            }
        }
    }
    if let Some(s) = start {
        tokens.push(input[s..].trim_end());
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_accepts_px_only() {
        assert_eq!(parse_length("16px"), Some(16.0));
        assert_eq!(parse_length("  12.5px "), Some(12.5));
        assert_eq!(parse_length("auto"), None);
        assert_eq!(parse_length("50%"), None);
        assert_eq!(parse_length("2em"), None);
    }

    #[test]
    fn font_weight_keywords() {
        assert_eq!(parse_font_weight("bold"), Some(700.0));
        assert_eq!(parse_font_weight("normal"), Some(400.0));
        assert_eq!(parse_font_weight("550"), Some(550.0));
        assert_eq!(parse_font_weight("heavy"), None);
    }

    #[test]
    fn comma_split_respects_parens() {
        let parts = split_top_level_commas("0 1px 2px rgba(0,0,0,0.5), inset 0 0 4px #fff");
        assert_eq!(parts.len(), 2);
        assert!(parts[0].contains("rgba(0,0,0,0.5)"));
    }

    #[test]
    fn whitespace_split_keeps_function_tokens() {
        let tokens = split_top_level_whitespace("1px solid rgb(2, 6, 23)");
        assert_eq!(tokens, vec!["1px", "solid", "rgb(2, 6, 23)"]);
    }

    #[test]
    fn normalizes_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
    }
}
