//! Color parsing with unit-interval channels.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An RGBA color with every component in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn opaque(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Uppercase `#RRGGBB` form; alpha is not emitted.
    pub fn to_hex(&self) -> String {
        format!(
            "#{:02X}{:02X}{:02X}",
            channel_byte(self.r),
            channel_byte(self.g),
            channel_byte(self.b)
        )
    }
}

fn channel_byte(value: f64) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Parse a CSS color value: `transparent`, `#rgb`/`#rrggbb`, modern
/// `rgb(r g b / a)` and legacy `rgb(r, g, b, a)` forms, with named colors as
/// a fallback. Unrecognized syntax is absent.
pub fn parse_color(value: &str) -> Option<Color> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.eq_ignore_ascii_case("transparent") {
        return Some(Color::TRANSPARENT);
    }
    if let Some(hex) = trimmed.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("rgb(") || lower.starts_with("rgba(") {
        return parse_rgb_function(trimmed);
    }
    // Named colors (and any exotic but valid syntax) go through csscolorparser.
    csscolorparser::Color::from_str(trimmed)
        .ok()
        .map(|c| Color {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        })
}

fn parse_hex(hex: &str) -> Option<Color> {
    let digits: Vec<u32> = hex.chars().map(|c| c.to_digit(16)).collect::<Option<_>>()?;
    match digits.len() {
        3 => Some(Color::opaque(
            (digits[0] * 17) as f64 / 255.0,
            (digits[1] * 17) as f64 / 255.0,
            (digits[2] * 17) as f64 / 255.0,
        )),
        6 => Some(Color::opaque(
            (digits[0] * 16 + digits[1]) as f64 / 255.0,
            (digits[2] * 16 + digits[3]) as f64 / 255.0,
            (digits[4] * 16 + digits[5]) as f64 / 255.0,
        )),
        _ => None,
    }
}

fn parse_rgb_function(input: &str) -> Option<Color> {
    let open = input.find('(')?;
    let close = input.rfind(')')?;
    if close <= open {
        return None;
    }
    let inner = input[open + 1..close].trim();

    // Modern syntax separates channels by whitespace with an optional
    // `/ alpha`; the legacy form uses commas throughout.
    let (channel_part, alpha_part) = match inner.split_once('/') {
        Some((channels, alpha)) => (channels.trim(), Some(alpha.trim())),
        None => (inner, None),
    };
    let channels: Vec<&str> = if channel_part.contains(',') {
        channel_part.split(',').map(str::trim).collect()
    } else {
        channel_part.split_whitespace().collect()
    };
    if channels.len() < 3 {
        return None;
    }
    let r = parse_channel(channels[0])?;
    let g = parse_channel(channels[1])?;
    let b = parse_channel(channels[2])?;
    let a = match alpha_part {
        Some(alpha) => parse_alpha(alpha)?,
        None if channels.len() >= 4 => parse_alpha(channels[3])?,
        None => 1.0,
    };
    Some(Color { r, g, b, a })
}

fn parse_channel(token: &str) -> Option<f64> {
    if let Some(percent) = token.strip_suffix('%') {
        let value: f64 = percent.trim().parse().ok()?;
        return Some((value / 100.0).clamp(0.0, 1.0));
    }
    let value: f64 = token.parse().ok()?;
    Some((value / 255.0).clamp(0.0, 1.0))
}

fn parse_alpha(token: &str) -> Option<f64> {
    if let Some(percent) = token.strip_suffix('%') {
        let value: f64 = percent.trim().parse().ok()?;
        return Some((value / 100.0).clamp(0.0, 1.0));
    }
    let value: f64 = token.parse().ok()?;
    Some(value.clamp(0.0, 1.0))
}
