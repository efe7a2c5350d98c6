//! Scene-graph node model produced by the import engine.
//!
//! Mirrors the host canvas object model: frames with an auto-layout
//! contract, text runs, image shapes, and vector shapes. The document is
//! plain data and serializes to JSON for host hand-off.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mosaic_css::{BoxEdges, Color, GradientSpec, ShadowSpec};

pub type SceneNodeId = String;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("scene document has no root node '{0}'")]
    MissingRoot(SceneNodeId),
    #[error("scene node '{0}' is not a frame")]
    NotAFrame(SceneNodeId),
}

/// The complete scene graph for one import, plus the shared style records
/// collected by the deduplication pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDocument {
    pub root: SceneNodeId,
    #[serde(default)]
    pub nodes: Vec<SceneNode>,
    #[serde(default)]
    pub text_styles: Vec<TextStyleRecord>,
    #[serde(default)]
    pub color_styles: Vec<ColorStyleRecord>,
}

impl SceneDocument {
    pub fn node(&self, node_id: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|node| node.id == node_id)
    }

    pub fn node_mut(&mut self, node_id: &str) -> Option<&mut SceneNode> {
        self.nodes.iter_mut().find(|node| node.id == node_id)
    }

    pub fn root_frame(&self) -> Result<&FrameSpec, DocumentError> {
        let node = self
            .node(&self.root)
            .ok_or_else(|| DocumentError::MissingRoot(self.root.clone()))?;
        match &node.kind {
            SceneNodeKind::Frame(frame) => Ok(frame),
            _ => Err(DocumentError::NotAFrame(self.root.clone())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: SceneNodeId,
    pub name: String,
    /// Original DOM id, when the source element carried one.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction: Option<Interaction>,
    #[serde(flatten)]
    pub kind: SceneNodeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneNodeKind {
    Frame(FrameSpec),
    TextRun(TextRunSpec),
    ImageShape(ImageShapeSpec),
    VectorShape(VectorShapeSpec),
}

/// Flow algorithm for a frame's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    #[default]
    None,
    Horizontal,
    Vertical,
}

/// Per-axis sizing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMode {
    Fixed,
    #[default]
    Hug,
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisAlign {
    #[default]
    Min,
    Center,
    Max,
    SpaceBetween,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSpec {
    #[serde(default)]
    pub layout_mode: LayoutMode,
    #[serde(default)]
    pub primary_sizing: SizingMode,
    #[serde(default)]
    pub counter_sizing: SizingMode,
    #[serde(default)]
    pub padding: BoxEdges,
    #[serde(default)]
    pub item_spacing: f64,
    #[serde(default)]
    pub primary_align: AxisAlign,
    #[serde(default)]
    pub counter_align: AxisAlign,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default)]
    pub fills: Vec<Paint>,
    #[serde(default)]
    pub strokes: Vec<Paint>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_weight: Option<f64>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    /// Always false: shadows and overflowing effects stay visible.
    #[serde(default)]
    pub clips_content: bool,
    #[serde(default)]
    pub children: Vec<SceneNodeId>,
}

impl Default for FrameSpec {
    fn default() -> Self {
        Self {
            layout_mode: LayoutMode::None,
            primary_sizing: SizingMode::Hug,
            counter_sizing: SizingMode::Hug,
            padding: BoxEdges::default(),
            item_spacing: 0.0,
            primary_align: AxisAlign::Min,
            counter_align: AxisAlign::Min,
            width: None,
            height: None,
            fills: Vec::new(),
            strokes: Vec::new(),
            stroke_weight: None,
            corner_radius: None,
            effects: Vec::new(),
            clips_content: false,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRunSpec {
    pub text: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<FontName>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub fills: Vec<Paint>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_style_ref: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_style_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageShapeSpec {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub fills: Vec<Paint>,
    /// Error marker set when the source bytes could not be fetched/decoded.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorShapeSpec {
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Self-contained SVG markup handed to the host's vector importer.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
    /// True when reconstruction failed and this shape stands in.
    #[serde(default)]
    pub placeholder: bool,
}

/// Host font identity: family plus one of the four canonical style names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl FontName {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }
}

impl std::fmt::Display for FontName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.family, self.style)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Paint {
    Solid {
        color: Color,
    },
    Gradient {
        gradient: GradientSpec,
        transform: [[f64; 3]; 2],
    },
    Image {
        url: String,
        scale_mode: ScaleMode,
        #[serde(default)]
        #[serde(skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default)]
        #[serde(skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
        #[serde(skip)]
        data: Option<Vec<u8>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    #[default]
    Fill,
    Fit,
    Tile,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    DropShadow(ShadowSpec),
    InnerShadow(ShadowSpec),
}

impl From<ShadowSpec> for Effect {
    fn from(shadow: ShadowSpec) -> Self {
        if shadow.inset {
            Effect::InnerShadow(shadow)
        } else {
            Effect::DropShadow(shadow)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interaction {
    /// Click-triggered navigation to another node in the document.
    NavigateTo { target: SceneNodeId },
}

/// Shared text style record created by the deduplication pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyleRecord {
    pub name: String,
    pub font_size: f64,
}

/// Shared color style record, named by its hex value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStyleRecord {
    pub name: String,
    pub color: Color,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_round_trips_through_json() {
        let doc = SceneDocument {
            root: "node0001".to_string(),
            nodes: vec![SceneNode {
                id: "node0001".to_string(),
                name: "Page".to_string(),
                source_id: None,
                interaction: None,
                kind: SceneNodeKind::Frame(FrameSpec {
                    layout_mode: LayoutMode::Vertical,
                    ..FrameSpec::default()
                }),
            }],
            text_styles: Vec::new(),
            color_styles: Vec::new(),
        };
        let json = serde_json::to_string(&doc).unwrap();
        let back: SceneDocument = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            back.root_frame().unwrap().layout_mode,
            LayoutMode::Vertical
        ));
    }

    #[test]
    fn inset_shadow_becomes_inner_effect() {
        let shadow = ShadowSpec {
            inset: true,
            offset_x: 0.0,
            offset_y: 1.0,
            blur: 2.0,
            spread: 0.0,
            color: Color::TRANSPARENT,
        };
        assert!(matches!(Effect::from(shadow), Effect::InnerShadow(_)));
    }
}
