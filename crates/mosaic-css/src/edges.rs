//! Box-edge (margin/padding) and border shorthand parsing.

use serde::{Deserialize, Serialize};

use crate::color::{Color, parse_color};
use crate::{parse_length, split_top_level_whitespace};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxEdges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl BoxEdges {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }

    /// CSS shorthand expansion: 1 value applies to all sides, 2 to
    /// (vertical, horizontal), 3 to (top, horizontal, bottom), 4 to
    /// (top, right, bottom, left).
    pub fn from_shorthand(value: &str) -> Option<Self> {
        let parts: Vec<f64> = value
            .split_whitespace()
            .filter_map(parse_length)
            .collect();
        match parts.as_slice() {
            [] => None,
            [all] => Some(Self::uniform(*all)),
            [vertical, horizontal] => Some(Self {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            }),
            [top, horizontal, bottom] => Some(Self {
                top: *top,
                right: *horizontal,
                bottom: *bottom,
                left: *horizontal,
            }),
            [top, right, bottom, left, ..] => Some(Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
        }
    }
}

/// Combine a shorthand value with per-side longhands; longhands win.
pub fn resolve_edges(
    shorthand: Option<&str>,
    top: Option<&str>,
    right: Option<&str>,
    bottom: Option<&str>,
    left: Option<&str>,
) -> BoxEdges {
    let mut edges = shorthand
        .and_then(BoxEdges::from_shorthand)
        .unwrap_or_default();
    if let Some(value) = top.and_then(parse_length) {
        edges.top = value;
    }
    if let Some(value) = right.and_then(parse_length) {
        edges.right = value;
    }
    if let Some(value) = bottom.and_then(parse_length) {
        edges.bottom = value;
    }
    if let Some(value) = left.and_then(parse_length) {
        edges.left = value;
    }
    edges
}

/// Scan a `border` shorthand for the first parseable width and color,
/// independent of token order (`1px solid #000` and `#000 1px solid` agree).
pub fn parse_border_shorthand(value: &str) -> (Option<f64>, Option<Color>) {
    let mut width = None;
    let mut color = None;
    for token in split_top_level_whitespace(value) {
        if width.is_none() {
            if let Some(length) = parse_length(token) {
                width = Some(length);
                continue;
            }
        }
        if color.is_none() {
            // Border style keywords would otherwise hit the named-color
            // fallback; skip the common ones outright.
            if matches!(
                token,
                "solid" | "dashed" | "dotted" | "double" | "none" | "hidden" | "groove" | "ridge"
            ) {
                continue;
            }
            if let Some(parsed) = parse_color(token) {
                color = Some(parsed);
            }
        }
    }
    (width, color)
}
