//! Paint resolution: solid colors and gradients synchronously, remote
//! images through the fetch pool with a settle barrier.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use mosaic_css::{gradient_transform, parse_gradient};
use mosaic_io::{ByteFetcher, FetchPool};
use mosaic_scene::{Paint, ScaleMode, SceneDocument, SceneNodeId, SceneNodeKind};

use crate::tree::StyleMap;

struct PaintTarget {
    request_id: u64,
    node_id: SceneNodeId,
    url: String,
    scale_mode: ScaleMode,
}

/// Collects deferred image paints during the walk and applies them at the
/// barrier. Fetches are deduplicated by URL: many nodes, one request.
pub struct PaintResolver {
    pool: FetchPool,
    next_request: u64,
    requests_by_url: HashMap<String, u64>,
    targets: Vec<PaintTarget>,
}

impl PaintResolver {
    pub fn new(fetcher: Arc<dyn ByteFetcher>) -> Self {
        Self {
            pool: FetchPool::new(fetcher),
            next_request: 1,
            requests_by_url: HashMap::new(),
            targets: Vec::new(),
        }
    }

    /// Paints derived synchronously from the element's background: the solid
    /// color first (bottom layer), then a gradient when present. An image
    /// background instead schedules a deferred fetch for `node_id`.
    pub fn background_paints(&mut self, style: &StyleMap, node_id: &str) -> Vec<Paint> {
        let mut paints = Vec::new();
        if let Some(color) = style.color("background-color") {
            if color.a > 0.0 {
                paints.push(Paint::Solid { color });
            }
        }
        if let Some(value) = style.get("background-image") {
            if let Some(gradient) = parse_gradient(value) {
                let transform = gradient_transform(gradient.angle_deg);
                paints.push(Paint::Gradient {
                    gradient,
                    transform,
                });
            } else if let Some(url) = extract_url(value) {
                self.schedule(node_id, &url, scale_mode_for(style));
            }
        }
        paints
    }

    /// Queue an image fetch for a node; the paint is attached at `settle`.
    pub fn schedule(&mut self, node_id: &str, url: &str, scale_mode: ScaleMode) {
        let request_id = match self.requests_by_url.get(url) {
            Some(id) => *id,
            None => {
                let id = self.next_request;
                self.next_request += 1;
                self.requests_by_url.insert(url.to_string(), id);
                self.pool.request(id, url);
                id
            }
        };
        self.targets.push(PaintTarget {
            request_id,
            node_id: node_id.to_string(),
            url: url.to_string(),
            scale_mode,
        });
    }

    pub fn has_pending(&self) -> bool {
        self.pool.has_pending() || !self.targets.is_empty()
    }

    /// Barrier: wait for every fetch, decode, and attach the image paints.
    /// Failures leave the target node paintless, with an error marker on
    /// image shapes.
    pub fn settle(&mut self, doc: &mut SceneDocument) {
        let mut outcomes: HashMap<u64, Result<DecodedImage, String>> = HashMap::new();
        for result in self.pool.settle() {
            let outcome = match result.outcome {
                Ok(bytes) => decode(bytes),
                Err(err) => Err(err.to_string()),
            };
            outcomes.insert(result.request_id, outcome);
        }
        for target in self.targets.drain(..) {
            let Some(node) = doc.node_mut(&target.node_id) else {
                continue;
            };
            match outcomes.get(&target.request_id) {
                Some(Ok(decoded)) => {
                    let paint = Paint::Image {
                        url: target.url,
                        scale_mode: target.scale_mode,
                        width: Some(decoded.width),
                        height: Some(decoded.height),
                        data: Some(decoded.bytes.clone()),
                    };
                    match &mut node.kind {
                        SceneNodeKind::Frame(frame) => frame.fills.push(paint),
                        SceneNodeKind::ImageShape(shape) => shape.fills.push(paint),
                        _ => {}
                    }
                }
                Some(Err(message)) => {
                    debug!(url = %target.url, error = %message, "image paint dropped");
                    if let SceneNodeKind::ImageShape(shape) = &mut node.kind {
                        shape.error = Some(message.clone());
                    }
                }
                None => {}
            }
        }
    }
}

struct DecodedImage {
    bytes: Vec<u8>,
    width: f64,
    height: f64,
}

fn decode(bytes: Vec<u8>) -> Result<DecodedImage, String> {
    match image::load_from_memory(&bytes) {
        Ok(decoded) => Ok(DecodedImage {
            width: decoded.width() as f64,
            height: decoded.height() as f64,
            bytes,
        }),
        Err(err) => Err(format!("decode failed: {err}")),
    }
}

/// Scale mode for an image background: `contain` fits, tiling repeats, and
/// everything else fills.
pub fn scale_mode_for(style: &StyleMap) -> ScaleMode {
    if let Some(size) = style.get("background-size") {
        if size.trim().eq_ignore_ascii_case("contain") {
            return ScaleMode::Fit;
        }
    }
    if let Some(repeat) = style.get("background-repeat") {
        let lower = repeat.trim().to_ascii_lowercase();
        if lower.starts_with("repeat") || lower == "round" || lower == "space" {
            return ScaleMode::Tile;
        }
    }
    ScaleMode::Fill
}

/// Scale mode for an `img` element from `object-fit`.
pub fn scale_mode_for_object(style: &StyleMap) -> ScaleMode {
    match style.get("object-fit").map(str::trim) {
        Some("contain") => ScaleMode::Fit,
        _ => ScaleMode::Fill,
    }
}

fn extract_url(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix("url(")
        .and_then(|rest| rest.strip_suffix(')'))?;
    let url = inner.trim().trim_matches(|c| c == '"' || c == '\'');
    if url.is_empty() {
        return None;
    }
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdMap;

    fn style(pairs: &[(&str, &str)]) -> StyleMap {
        StyleMap::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<StdMap<_, _>>(),
        )
    }

    #[test]
    fn url_extraction() {
        assert_eq!(
            extract_url("url(\"https://a/b.png\")"),
            Some("https://a/b.png".to_string())
        );
        assert_eq!(extract_url("url( https://a/b.png )"), Some("https://a/b.png".to_string()));
        assert_eq!(extract_url("none"), None);
    }

    #[test]
    fn scale_modes() {
        assert_eq!(
            scale_mode_for(&style(&[("background-size", "contain")])),
            ScaleMode::Fit
        );
        assert_eq!(
            scale_mode_for(&style(&[("background-repeat", "repeat-x")])),
            ScaleMode::Tile
        );
        assert_eq!(
            scale_mode_for(&style(&[("background-repeat", "no-repeat")])),
            ScaleMode::Fill
        );
        assert_eq!(scale_mode_for(&style(&[])), ScaleMode::Fill);
    }

    #[test]
    fn transparent_background_color_is_no_paint() {
        let mut resolver = PaintResolver::new(Arc::new(NoFetch));
        let paints =
            resolver.background_paints(&style(&[("background-color", "transparent")]), "n1");
        assert!(paints.is_empty());
    }

    #[test]
    fn gradient_background_is_synchronous() {
        let mut resolver = PaintResolver::new(Arc::new(NoFetch));
        let paints = resolver.background_paints(
            &style(&[("background-image", "linear-gradient(90deg, #000, #fff)")]),
            "n1",
        );
        assert_eq!(paints.len(), 1);
        assert!(matches!(paints[0], Paint::Gradient { .. }));
        assert!(!resolver.has_pending());
    }

    struct NoFetch;
    impl ByteFetcher for NoFetch {
        fn fetch(&self, _url: &str) -> Result<Vec<u8>, mosaic_io::FetchError> {
            Err(mosaic_io::FetchError::Status(404))
        }
    }
}
