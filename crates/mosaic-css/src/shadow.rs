//! `box-shadow` list parsing.

use serde::{Deserialize, Serialize};

use crate::color::{Color, parse_color};
use crate::{parse_length, split_top_level_commas, split_top_level_whitespace};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSpec {
    pub inset: bool,
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f64,
    pub spread: f64,
    pub color: Color,
}

/// Parse a comma-separated shadow list. Commas inside `rgba(...)` do not
/// split entries; entries with fewer than two numeric tokens are dropped.
pub fn parse_shadow_list(value: &str) -> Vec<ShadowSpec> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Vec::new();
    }
    split_top_level_commas(trimmed)
        .into_iter()
        .filter_map(parse_shadow_entry)
        .collect()
}

fn parse_shadow_entry(entry: &str) -> Option<ShadowSpec> {
    let mut inset = false;
    let mut color = None;
    let mut lengths = Vec::new();

    for token in split_top_level_whitespace(entry) {
        if token.eq_ignore_ascii_case("inset") {
            inset = true;
            continue;
        }
        if let Some(length) = parse_length(token).or_else(|| token.parse().ok()) {
            lengths.push(length);
            continue;
        }
        // The color may appear before or after the geometry tokens.
        if color.is_none() {
            color = parse_color(token);
        }
    }
    if lengths.len() < 2 {
        return None;
    }
    Some(ShadowSpec {
        inset,
        offset_x: lengths[0],
        offset_y: lengths[1],
        blur: lengths.get(2).copied().unwrap_or(0.0),
        spread: lengths.get(3).copied().unwrap_or(0.0),
        color: color.unwrap_or(Color {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            a: 0.25,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_shadow_with_rgba() {
        let shadows = parse_shadow_list("0px 4px 12px rgba(0, 0, 0, 0.5)");
        assert_eq!(shadows.len(), 1);
        let s = shadows[0];
        assert!(!s.inset);
        assert_eq!((s.offset_x, s.offset_y, s.blur, s.spread), (0.0, 4.0, 12.0, 0.0));
        assert_eq!(s.color.a, 0.5);
    }

    #[test]
    fn comma_inside_color_does_not_split() {
        let shadows = parse_shadow_list("0 1px 2px rgba(0,0,0,0.3), inset 0 0 4px #fff");
        assert_eq!(shadows.len(), 2);
        assert!(shadows[1].inset);
    }

    #[test]
    fn trailing_inset_keyword() {
        let shadows = parse_shadow_list("2px 2px 6px 1px #000 inset");
        assert_eq!(shadows.len(), 1);
        assert!(shadows[0].inset);
        assert_eq!(shadows[0].spread, 1.0);
    }

    #[test]
    fn short_entries_are_dropped() {
        assert!(parse_shadow_list("4px red").is_empty());
        assert!(parse_shadow_list("none").is_empty());
    }
}
