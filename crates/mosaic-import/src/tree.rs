//! The captured style tree: elements annotated with computed CSS.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use mosaic_css::{Color, normalize_whitespace, parse_color, parse_length};

/// Synthetic style key propagating the original DOM id.
pub const NODE_ID_KEY: &str = "--node-id";

/// One node of the captured style tree. Immutable input; the capture
/// collaborator produces this as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StyleTreeNode {
    Text { text: String },
    Element(ElementNode),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementNode {
    pub tag: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default, rename = "computedStyle")]
    pub computed_style: StyleMap,
    #[serde(default)]
    pub children: Vec<StyleTreeNode>,
}

impl ElementNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// True when any direct child is a bare text node with content.
    pub fn has_raw_text_child(&self) -> bool {
        self.children.iter().any(|child| match child {
            StyleTreeNode::Text { text } => !text.trim().is_empty(),
            StyleTreeNode::Element(_) => false,
        })
    }

    /// Concatenated descendant text with collapsed whitespace.
    pub fn collect_text(&self) -> String {
        let mut content = String::new();
        collect_into(&self.children, &mut content);
        normalize_whitespace(&content)
    }
}

fn collect_into(children: &[StyleTreeNode], out: &mut String) {
    for child in children {
        match child {
            StyleTreeNode::Text { text } => out.push_str(text),
            StyleTreeNode::Element(element) => collect_into(&element.children, out),
        }
    }
}

/// Computed-style property bag. Keys are raw CSS property names; absent keys
/// mean "no value", never a sentinel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleMap(HashMap<String, String>);

impl StyleMap {
    pub fn new(properties: HashMap<String, String>) -> Self {
        Self(properties)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn length(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(parse_length)
    }

    pub fn color(&self, name: &str) -> Option<Color> {
        self.get(name).and_then(parse_color)
    }

    /// The propagated DOM id, when the capture recorded one.
    pub fn node_id(&self) -> Option<&str> {
        self.get(NODE_ID_KEY)
    }
}

/// Parse the capture payload: the document body's children as JSON.
pub fn parse_tree(json: &str) -> anyhow::Result<Vec<StyleTreeNode>> {
    let nodes = serde_json::from_str(json)?;
    Ok(nodes)
}
