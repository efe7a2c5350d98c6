//! `linear-gradient` / `radial-gradient` expression parsing.

use serde::{Deserialize, Serialize};

use crate::color::{Color, parse_color};
use crate::{split_top_level_commas, split_top_level_whitespace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientKind {
    Linear,
    Radial,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Stop position in `[0, 1]`.
    pub position: f64,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientSpec {
    pub kind: GradientKind,
    pub angle_deg: f64,
    pub stops: Vec<GradientStop>,
}

/// Parse a gradient expression from a `background-image` value. Returns
/// `None` for anything that is not a recognizable gradient with at least
/// one resolvable color stop.
pub fn parse_gradient(value: &str) -> Option<GradientSpec> {
    let trimmed = value.trim();
    let lower = trimmed.to_ascii_lowercase();
    let kind = if lower.starts_with("radial-gradient(") || lower.starts_with("repeating-radial-gradient(") {
        GradientKind::Radial
    } else if lower.starts_with("linear-gradient(") || lower.starts_with("repeating-linear-gradient(") {
        GradientKind::Linear
    } else {
        return None;
    };
    let inner = &trimmed[trimmed.find('(')? + 1..trimmed.rfind(')')?];
    let mut parts = split_top_level_commas(inner);
    if parts.is_empty() {
        return None;
    }

    let mut angle_deg = 180.0;
    let first = parts[0];
    if let Some(angle) = parse_orientation(first) {
        angle_deg = angle;
        parts.remove(0);
    } else if kind == GradientKind::Radial && is_radial_shape_prelude(first) {
        parts.remove(0);
    }

    let stop_count = parts.len();
    let mut stops = Vec::with_capacity(stop_count);
    for (index, part) in parts.iter().enumerate() {
        let Some(stop) = parse_stop(part, index, stop_count) else {
            continue;
        };
        stops.push(stop);
    }
    if stops.is_empty() {
        return None;
    }
    Some(GradientSpec {
        kind,
        angle_deg,
        stops,
    })
}

/// CSS angle for a linear gradient: explicit `<n>deg` or one of the eight
/// directional keywords (`to top` is 0, angles advance clockwise).
fn parse_orientation(token: &str) -> Option<f64> {
    let lower = token.trim().to_ascii_lowercase();
    if let Some(number) = lower.strip_suffix("deg") {
        return number.trim().parse().ok();
    }
    let rest = lower.strip_prefix("to ")?;
    let mut up = false;
    let mut down = false;
    let mut left = false;
    let mut right = false;
    for word in rest.split_whitespace() {
        match word {
            "top" => up = true,
            "bottom" => down = true,
            "left" => left = true,
            "right" => right = true,
            _ => return None,
        }
    }
    match (up, down, left, right) {
        (true, false, false, false) => Some(0.0),
        (true, false, false, true) => Some(45.0),
        (false, false, false, true) => Some(90.0),
        (false, true, false, true) => Some(135.0),
        (false, true, false, false) => Some(180.0),
        (false, true, true, false) => Some(225.0),
        (false, false, true, false) => Some(270.0),
        (true, false, true, false) => Some(315.0),
        _ => None,
    }
}

fn is_radial_shape_prelude(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    ["circle", "ellipse", "closest-", "farthest-", "at "]
        .iter()
        .any(|marker| lower.contains(marker))
}

fn parse_stop(part: &str, index: usize, total: usize) -> Option<GradientStop> {
    let mut color = None;
    let mut position = None;
    for token in split_top_level_whitespace(part) {
        if let Some(percent) = token.strip_suffix('%') {
            if let Ok(value) = percent.trim().parse::<f64>() {
                position = Some((value / 100.0).clamp(0.0, 1.0));
                continue;
            }
        }
        if color.is_none() {
            color = parse_color(token);
        }
    }
    let color = color?;
    // Without an explicit position, stops spread evenly across the run.
    let position = position.unwrap_or_else(|| {
        if total <= 1 {
            0.0
        } else {
            index as f64 / (total - 1) as f64
        }
    });
    Some(GradientStop { position, color })
}

/// Convert a CSS gradient angle into the 2×3 affine transform whose x axis
/// follows the stop direction. CSS angles measure clockwise from "up", so
/// the rotation is offset by 90 degrees.
pub fn gradient_transform(angle_deg: f64) -> [[f64; 3]; 2] {
    let radians = (angle_deg - 90.0).to_radians();
    let (sin, cos) = radians.sin_cos();
    [[cos, sin, 0.0], [-sin, cos, 0.0]]
}
