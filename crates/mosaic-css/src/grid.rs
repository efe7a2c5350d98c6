//! `grid-template-columns` track parsing.

use serde::{Deserialize, Serialize};

use crate::{parse_length, split_top_level_whitespace};

/// Summary of a grid template's track list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridTracks {
    pub count: usize,
    /// Per-column pixel widths, present only when every track is a fixed
    /// length.
    pub widths: Option<Vec<f64>>,
}

/// Count the tracks in a template value, summing `repeat(N, ...)` into N.
/// Recognized track tokens: numeric-leading sizes, `auto`, `min-content`,
/// `max-content`, and `minmax(...)`.
pub fn parse_grid_tracks(value: &str) -> Option<GridTracks> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return None;
    }
    let mut count = 0usize;
    let mut widths = Some(Vec::new());
    for token in split_top_level_whitespace(trimmed) {
        let lower = token.to_ascii_lowercase();
        if let Some(inner) = lower
            .strip_prefix("repeat(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let mut parts = inner.splitn(2, ',');
            let Some(n) = parts.next().and_then(|n| n.trim().parse::<usize>().ok()) else {
                continue;
            };
            count += n;
            let track = parts.next().map(str::trim).unwrap_or("");
            match parse_length(track) {
                Some(width) => {
                    if let Some(list) = widths.as_mut() {
                        list.extend(std::iter::repeat(width).take(n));
                    }
                }
                None => widths = None,
            }
            continue;
        }
        let is_track = lower.starts_with(|c: char| c.is_ascii_digit() || c == '.')
            || lower == "auto"
            || lower == "min-content"
            || lower == "max-content"
            || lower.starts_with("minmax(");
        if !is_track {
            continue;
        }
        count += 1;
        match parse_length(token) {
            Some(width) => {
                if let Some(list) = widths.as_mut() {
                    list.push(width);
                }
            }
            None => widths = None,
        }
    }
    if count == 0 {
        return None;
    }
    Some(GridTracks { count, widths })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_pixel_tracks() {
        let tracks = parse_grid_tracks("100px 100px 100px").unwrap();
        assert_eq!(tracks.count, 3);
        assert_eq!(tracks.widths, Some(vec![100.0, 100.0, 100.0]));
    }

    #[test]
    fn repeat_sums_count() {
        let tracks = parse_grid_tracks("repeat(3, 1fr) 200px").unwrap();
        assert_eq!(tracks.count, 4);
        assert!(tracks.widths.is_none());
    }

    #[test]
    fn repeat_with_fixed_width() {
        let tracks = parse_grid_tracks("repeat(2, 150px)").unwrap();
        assert_eq!(tracks.count, 2);
        assert_eq!(tracks.widths, Some(vec![150.0, 150.0]));
    }

    #[test]
    fn mixed_tokens() {
        let tracks = parse_grid_tracks("auto minmax(100px, 1fr) max-content").unwrap();
        assert_eq!(tracks.count, 3);
        assert!(tracks.widths.is_none());
    }

    #[test]
    fn none_is_absent() {
        assert!(parse_grid_tracks("none").is_none());
        assert!(parse_grid_tracks("").is_none());
    }
}
