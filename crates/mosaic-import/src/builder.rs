//! The scene graph builder: a recursive, yielding walk over the style tree.

use std::collections::HashMap;

use tracing::debug;

use mosaic_css::{BoxEdges, Color, parse_border_shorthand, parse_shadow_list};
use mosaic_scene::{
    AxisAlign, Effect, FrameSpec, ImageShapeSpec, LayoutMode, Paint, SceneDocument, SceneNode,
    SceneNodeId, SceneNodeKind, SizingMode, TextRunSpec, VectorShapeSpec,
};

use crate::classify::{TagCategory, classify};
use crate::fonts::{FontRequest, FontResolver};
use crate::layout::{self, GridPlan, LayoutContract};
use crate::paint::{PaintResolver, scale_mode_for_object};
use crate::tree::{ElementNode, StyleMap, StyleTreeNode};
use crate::{ImportOptions, Viewport};

/// Default heading sizes for levels 1 through 6.
const HEADING_SIZES: [f64; 6] = [32.0, 24.0, 20.0, 18.0, 16.0, 14.0];
/// Item spacing inside list containers.
const LIST_SPACING: f64 = 8.0;
/// Default image shape dimensions when the source specifies none.
const IMAGE_DEFAULT: (f64, f64) = (200.0, 120.0);
/// Root frame padding: top/right/bottom/left.
const ROOT_PADDING: BoxEdges = BoxEdges {
    top: 32.0,
    right: 40.0,
    bottom: 32.0,
    left: 40.0,
};
const ROOT_SPACING: f64 = 32.0;

/// Computed-style properties promoted onto serialized vector markup when
/// the source attributes do not already carry them.
const PROMOTED_VECTOR_PROPS: [&str; 9] = [
    "fill",
    "stroke",
    "stroke-width",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "fill-opacity",
    "stroke-opacity",
    "opacity",
];

pub struct BuildOutput {
    pub doc: SceneDocument,
    /// Original DOM id to created node, for the link pass.
    pub identity: HashMap<String, SceneNodeId>,
    /// Anchor nodes with their raw `href` values.
    pub anchors: Vec<(SceneNodeId, String)>,
}

pub struct Builder<'a> {
    doc: SceneDocument,
    fonts: &'a mut FontResolver,
    paints: &'a mut PaintResolver,
    identity: HashMap<String, SceneNodeId>,
    anchors: Vec<(SceneNodeId, String)>,
    yield_every: usize,
    on_yield: Option<Box<dyn FnMut()>>,
    auto_layout: bool,
    created: usize,
    next_id: u64,
}

impl<'a> Builder<'a> {
    pub fn new(
        fonts: &'a mut FontResolver,
        paints: &'a mut PaintResolver,
        options: &ImportOptions,
        on_yield: Option<Box<dyn FnMut()>>,
    ) -> Self {
        let mut builder = Self {
            doc: SceneDocument {
                root: String::new(),
                nodes: Vec::new(),
                text_styles: Vec::new(),
                color_styles: Vec::new(),
            },
            fonts,
            paints,
            identity: HashMap::new(),
            anchors: Vec::new(),
            yield_every: options.yield_every.max(1),
            on_yield,
            auto_layout: options.auto_layout,
            created: 0,
            next_id: 1,
        };
        let root = builder.push_node(
            "Page".to_string(),
            None,
            SceneNodeKind::Frame(root_frame(&options.viewport)),
        );
        builder.doc.root = root;
        builder
    }

    /// Walk the captured body children into the root frame.
    pub fn build(mut self, nodes: &[StyleTreeNode]) -> BuildOutput {
        let mut children = Vec::new();
        for node in nodes {
            if let Some(id) = self.convert_with_margins(node, None, true) {
                children.push(id);
            }
        }
        let root_id = self.doc.root.clone();
        if let Some(SceneNodeKind::Frame(frame)) =
            self.doc.node_mut(&root_id).map(|node| &mut node.kind)
        {
            frame.children = children;
        }
        BuildOutput {
            doc: self.doc,
            identity: self.identity,
            anchors: self.anchors,
        }
    }

    /// Convert a node and, when it carries margins inside an auto-layout
    /// parent, wrap it in a transparent padding-only frame.
    fn convert_with_margins(
        &mut self,
        node: &StyleTreeNode,
        parent_style: Option<&StyleMap>,
        parent_is_auto: bool,
    ) -> Option<SceneNodeId> {
        let margin = match node {
            StyleTreeNode::Element(element) => layout::margins(&element.computed_style),
            StyleTreeNode::Text { .. } => BoxEdges::default(),
        };
        let id = self.convert_node(node, parent_style)?;
        if margin.is_zero() || !parent_is_auto {
            return Some(id);
        }
        Some(self.wrap_in_margin_frame(id, margin))
    }

    fn convert_node(
        &mut self,
        node: &StyleTreeNode,
        parent_style: Option<&StyleMap>,
    ) -> Option<SceneNodeId> {
        let element = match node {
            StyleTreeNode::Text { text } => {
                // Bare text picks up the enclosing element's typography.
                let content = mosaic_css::normalize_whitespace(text);
                if content.is_empty() {
                    return None;
                }
                return Some(self.make_text_run(content, parent_style, false, "Text"));
            }
            StyleTreeNode::Element(element) => element,
        };
        let style = &element.computed_style;
        if style.get("display") == Some("none") {
            return None;
        }

        match classify(&element.tag) {
            TagCategory::Heading(level) => self.convert_heading(element, level),
            TagCategory::InlineText => self.convert_inline_text(element),
            TagCategory::ListContainer => self.convert_list(element),
            TagCategory::Button | TagCategory::Input | TagCategory::TextArea => {
                self.convert_control(element)
            }
            TagCategory::Image => self.convert_image(element),
            TagCategory::Vector => Some(self.convert_vector(element)),
            TagCategory::Container => self.convert_container(element),
        }
    }

    fn convert_heading(&mut self, element: &ElementNode, level: u8) -> Option<SceneNodeId> {
        let text = element.collect_text();
        if text.is_empty() {
            return None;
        }
        let style = &element.computed_style;
        let size = style
            .length("font-size")
            .unwrap_or(HEADING_SIZES[(level as usize).saturating_sub(1).min(5)]);
        // Bold unless the capture recorded an explicit weight.
        let forced_bold = style.get("font-weight").is_none();
        let id = self.make_sized_text_run(text, Some(style), size, forced_bold, false, &element.tag);
        self.register_identity(element, &id);
        Some(id)
    }

    fn convert_inline_text(&mut self, element: &ElementNode) -> Option<SceneNodeId> {
        let mut text = element.collect_text();
        if text.is_empty() {
            if element.tag.eq_ignore_ascii_case("li") {
                text = "\u{2022}".to_string();
            } else {
                return None;
            }
        }
        let style = &element.computed_style;
        let is_anchor = element.tag.eq_ignore_ascii_case("a");
        let decorated = style
            .get("text-decoration")
            .or_else(|| style.get("text-decoration-line"));
        let underline = match decorated {
            Some(value) => value.contains("underline"),
            // Anchors default to underlined.
            None => is_anchor,
        };
        let name = self.node_name(element);
        let id = self.make_text_run(text, Some(style), underline, &name);
        if is_anchor {
            if let Some(href) = element.attr("href") {
                self.anchors.push((id.clone(), href.to_string()));
            }
        }
        self.register_identity(element, &id);
        Some(id)
    }

    fn convert_list(&mut self, element: &ElementNode) -> Option<SceneNodeId> {
        let style = &element.computed_style;
        let mut contract = layout::resolve_contract(style, self.auto_layout);
        contract.item_spacing = LIST_SPACING;
        let id = self.make_frame(element, &contract);
        let children = self.convert_children(element, &contract);
        self.set_frame_children(&id, children);
        Some(id)
    }

    /// Buttons, inputs, and textareas: a frame wrapping a single text run
    /// from the element content or its `value`/`placeholder` attribute.
    fn convert_control(&mut self, element: &ElementNode) -> Option<SceneNodeId> {
        let style = &element.computed_style;
        let mut contract = layout::resolve_contract(style, self.auto_layout);
        contract.mode = LayoutMode::Horizontal;
        contract.primary_sizing = SizingMode::Hug;
        contract.counter_sizing = SizingMode::Hug;
        contract.primary_align = AxisAlign::Center;
        contract.counter_align = AxisAlign::Center;
        let id = self.make_frame(element, &contract);
        self.register_identity(element, &id);

        let label = {
            let content = element.collect_text();
            if !content.is_empty() {
                content
            } else {
                element
                    .attr("value")
                    .or_else(|| element.attr("placeholder"))
                    .map(str::to_string)
                    .unwrap_or_default()
            }
        };
        if !label.is_empty() {
            let run = self.make_text_run(label, Some(style), false, "Label");
            self.set_frame_children(&id, vec![run]);
        }
        Some(id)
    }

    fn convert_image(&mut self, element: &ElementNode) -> Option<SceneNodeId> {
        let style = &element.computed_style;
        let width = style
            .length("width")
            .or_else(|| element.attr("width").and_then(mosaic_css::parse_number))
            .unwrap_or(IMAGE_DEFAULT.0);
        let height = style
            .length("height")
            .or_else(|| element.attr("height").and_then(mosaic_css::parse_number))
            .unwrap_or(IMAGE_DEFAULT.1);
        let name = self.node_name(element);
        let id = self.push_node(
            name,
            style.node_id().map(str::to_string),
            SceneNodeKind::ImageShape(ImageShapeSpec {
                width,
                height,
                fills: Vec::new(),
                error: None,
            }),
        );
        self.register_identity(element, &id);
        if let Some(src) = element.attr("src").filter(|s| !s.trim().is_empty()) {
            self.paints.schedule(&id, src.trim(), scale_mode_for_object(style));
        }
        Some(id)
    }

    /// The svg root is serialized back to markup for the host's vector
    /// importer; its subtree is never walked as individual nodes.
    fn convert_vector(&mut self, element: &ElementNode) -> SceneNodeId {
        let style = &element.computed_style;
        let markup = serialize_vector(element);
        if markup.is_none() {
            debug!(tag = %element.tag, "vector reconstruction failed, placeholder used");
        }
        let placeholder = markup.is_none();
        let width = style
            .length("width")
            .or_else(|| element.attr("width").and_then(mosaic_css::parse_number));
        let height = style
            .length("height")
            .or_else(|| element.attr("height").and_then(mosaic_css::parse_number));
        let name = self.node_name(element);
        let id = self.push_node(
            name,
            style.node_id().map(str::to_string),
            SceneNodeKind::VectorShape(VectorShapeSpec {
                width,
                height,
                markup,
                placeholder,
            }),
        );
        self.register_identity(element, &id);
        id
    }

    fn convert_container(&mut self, element: &ElementNode) -> Option<SceneNodeId> {
        let style = &element.computed_style;
        let contract = layout::resolve_contract(style, self.auto_layout);
        let id = self.make_frame(element, &contract);
        self.register_identity(element, &id);

        let children = if let Some(plan) = layout::is_grid(style)
            .then(|| layout::grid_plan(style))
            .flatten()
        {
            self.pack_grid(element, &plan)
        } else {
            self.convert_children(element, &contract)
        };
        self.set_frame_children(&id, children);
        Some(id)
    }

    fn convert_children(
        &mut self,
        element: &ElementNode,
        contract: &LayoutContract,
    ) -> Vec<SceneNodeId> {
        let parent_is_auto = contract.mode != LayoutMode::None;
        let mut children = Vec::new();
        for child in &element.children {
            if let Some(id) =
                self.convert_with_margins(child, Some(&element.computed_style), parent_is_auto)
            {
                children.push(id);
            }
        }
        children
    }

    /// Grid row packing: children are consumed in document order and grouped
    /// into synthetic horizontal row frames, one per `floor(i / columns)`.
    fn pack_grid(&mut self, element: &ElementNode, plan: &GridPlan) -> Vec<SceneNodeId> {
        let mut cells = Vec::new();
        for child in &element.children {
            if let Some(id) = self.convert_node(child, Some(&element.computed_style)) {
                cells.push(id);
            }
        }
        let mut rows = Vec::new();
        for (index, cell) in cells.iter().enumerate() {
            let column = index % plan.columns;
            // Pin the cell to its column width when the template fixes it;
            // otherwise cells share the row through equal grow.
            if let Some(node) = self.doc.node_mut(cell) {
                if let SceneNodeKind::Frame(frame) = &mut node.kind {
                    match plan.column_widths.as_ref().and_then(|w| w.get(column)) {
                        Some(width) => {
                            frame.width = Some(*width);
                            set_horizontal_sizing(frame, SizingMode::Fixed);
                        }
                        None => set_horizontal_sizing(frame, SizingMode::Fill),
                    }
                }
            }
            if index % plan.columns == 0 {
                rows.push(Vec::new());
            }
            if let Some(row) = rows.last_mut() {
                row.push(cell.clone());
            }
        }
        rows.into_iter()
            .map(|row_children| {
                let mut frame = FrameSpec {
                    layout_mode: LayoutMode::Horizontal,
                    primary_sizing: SizingMode::Hug,
                    counter_sizing: SizingMode::Hug,
                    item_spacing: plan.column_gap,
                    children: row_children,
                    ..FrameSpec::default()
                };
                if let Some(width) = plan.row_width() {
                    frame.width = Some(width);
                    frame.primary_sizing = SizingMode::Fixed;
                }
                self.push_node("Row".to_string(), None, SceneNodeKind::Frame(frame))
            })
            .collect()
    }

    fn make_frame(&mut self, element: &ElementNode, contract: &LayoutContract) -> SceneNodeId {
        let style = &element.computed_style;
        let name = self.node_name(element);
        let id = self.alloc_id();
        let mut frame = FrameSpec {
            layout_mode: contract.mode,
            primary_sizing: contract.primary_sizing,
            counter_sizing: contract.counter_sizing,
            padding: contract.padding,
            item_spacing: contract.item_spacing,
            primary_align: contract.primary_align,
            counter_align: contract.counter_align,
            width: contract.width,
            height: contract.height,
            ..FrameSpec::default()
        };
        frame.fills = self.paints.background_paints(style, &id);
        let (stroke_width, stroke_color) = resolve_border(style);
        if let (Some(width), Some(color)) = (stroke_width, stroke_color) {
            if width > 0.0 {
                frame.strokes.push(Paint::Solid { color });
                frame.stroke_weight = Some(width);
            }
        }
        frame.corner_radius = style.length("border-radius");
        if let Some(value) = style.get("box-shadow") {
            frame.effects = parse_shadow_list(value).into_iter().map(Effect::from).collect();
        }
        self.insert_node(id.clone(), name, style.node_id().map(str::to_string), SceneNodeKind::Frame(frame));
        id
    }

    fn wrap_in_margin_frame(&mut self, child: SceneNodeId, margin: BoxEdges) -> SceneNodeId {
        // The wrapper reproduces CSS margins as padding; the child fills it.
        if let Some(node) = self.doc.node_mut(&child) {
            if let SceneNodeKind::Frame(frame) = &mut node.kind {
                if frame.counter_sizing != SizingMode::Fixed {
                    frame.counter_sizing = SizingMode::Fill;
                }
            }
        }
        let frame = FrameSpec {
            layout_mode: LayoutMode::Vertical,
            primary_sizing: SizingMode::Hug,
            counter_sizing: SizingMode::Fill,
            padding: margin,
            children: vec![child],
            ..FrameSpec::default()
        };
        self.push_node("Margin".to_string(), None, SceneNodeKind::Frame(frame))
    }

    fn make_text_run(
        &mut self,
        text: String,
        style: Option<&StyleMap>,
        underline: bool,
        name: &str,
    ) -> SceneNodeId {
        let size = style.and_then(|s| s.length("font-size"));
        self.build_text_run(text, style, size, false, underline, name)
    }

    fn make_sized_text_run(
        &mut self,
        text: String,
        style: Option<&StyleMap>,
        size: f64,
        forced_bold: bool,
        underline: bool,
        name: &str,
    ) -> SceneNodeId {
        self.build_text_run(text, style, Some(size), forced_bold, underline, name)
    }

    fn build_text_run(
        &mut self,
        text: String,
        style: Option<&StyleMap>,
        font_size: Option<f64>,
        force_bold: bool,
        underline: bool,
        name: &str,
    ) -> SceneNodeId {
        // The font must be resolved before the run's font is assigned.
        let mut request = style
            .map(FontRequest::from_style)
            .unwrap_or_else(|| FontRequest::from_style(&StyleMap::default()));
        if force_bold {
            // Only the weight is forced; an italic modifier survives.
            request.style = request.style.bold_variant();
        }
        let font = self.fonts.resolve(&request);

        let color = style
            .and_then(|s| s.color("color"))
            .unwrap_or(Color::opaque(0.0, 0.0, 0.0));
        let run = TextRunSpec {
            text,
            font: Some(font),
            font_size,
            underline,
            fills: vec![Paint::Solid { color }],
            text_style_ref: None,
            color_style_ref: None,
        };
        let source_id = style.and_then(|s| s.node_id()).map(str::to_string);
        self.push_node(name.to_string(), source_id, SceneNodeKind::TextRun(run))
    }

    fn node_name(&self, element: &ElementNode) -> String {
        element
            .attr("id")
            .map(str::to_string)
            .unwrap_or_else(|| element.tag.clone())
    }

    fn register_identity(&mut self, element: &ElementNode, id: &SceneNodeId) {
        if let Some(source) = element.computed_style.node_id() {
            // First registration wins; an id appears at most once.
            self.identity
                .entry(source.to_string())
                .or_insert_with(|| id.clone());
        }
    }

    fn set_frame_children(&mut self, id: &SceneNodeId, children: Vec<SceneNodeId>) {
        if let Some(SceneNodeKind::Frame(frame)) = self.doc.node_mut(id).map(|n| &mut n.kind) {
            frame.children = children;
        }
    }

    fn alloc_id(&mut self) -> SceneNodeId {
        let id = format!("node{:04}", self.next_id);
        self.next_id += 1;
        id
    }

    fn push_node(
        &mut self,
        name: String,
        source_id: Option<String>,
        kind: SceneNodeKind,
    ) -> SceneNodeId {
        let id = self.alloc_id();
        self.insert_node(id.clone(), name, source_id, kind);
        id
    }

    fn insert_node(
        &mut self,
        id: SceneNodeId,
        name: String,
        source_id: Option<String>,
        kind: SceneNodeKind,
    ) {
        self.doc.nodes.push(SceneNode {
            id,
            name,
            source_id,
            interaction: None,
            kind,
        });
        self.created += 1;
        // Cooperative yield so a large tree cannot starve the host loop.
        if self.created % self.yield_every == 0 {
            if let Some(on_yield) = self.on_yield.as_mut() {
                on_yield();
            }
        }
    }
}

fn set_horizontal_sizing(frame: &mut FrameSpec, sizing: SizingMode) {
    // In a horizontal row the horizontal axis is a child frame's counter
    // axis only when the child itself flows horizontally.
    match frame.layout_mode {
        LayoutMode::Horizontal => frame.primary_sizing = sizing,
        _ => frame.counter_sizing = sizing,
    }
}

fn resolve_border(style: &StyleMap) -> (Option<f64>, Option<Color>) {
    let (shorthand_width, shorthand_color) = style
        .get("border")
        .map(|value| parse_border_shorthand(value))
        .unwrap_or((None, None));
    let width = style.length("border-width").or(shorthand_width);
    let color = style.color("border-color").or(shorthand_color);
    (width, color)
}

fn root_frame(viewport: &Viewport) -> FrameSpec {
    FrameSpec {
        layout_mode: LayoutMode::Vertical,
        primary_sizing: SizingMode::Hug,
        counter_sizing: SizingMode::Fixed,
        padding: ROOT_PADDING,
        item_spacing: ROOT_SPACING,
        width: Some(viewport.width),
        // Fixed light page background; a product default, not input-derived.
        fills: vec![Paint::Solid {
            color: Color::opaque(0.98, 0.98, 0.98),
        }],
        ..FrameSpec::default()
    }
}

/// Serialize an svg subtree back to self-contained markup, promoting
/// paint-relevant computed properties into attributes.
fn serialize_vector(element: &ElementNode) -> Option<String> {
    let mut out = String::new();
    write_vector_element(element, &mut out, true).then_some(out)
}

fn write_vector_element(element: &ElementNode, out: &mut String, is_root: bool) -> bool {
    if !element
        .tag
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return false;
    }
    out.push('<');
    out.push_str(&element.tag);

    let mut attributes: Vec<(&String, &String)> = element
        .attributes
        .iter()
        .filter(|(name, _)| name.as_str() != "class" && name.as_str() != "style")
        .collect();
    attributes.sort_by(|a, b| a.0.cmp(b.0));
    for (name, value) in &attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_markup(value));
        out.push('"');
    }
    if is_root && !element.attributes.contains_key("xmlns") {
        out.push_str(" xmlns=\"http://www.w3.org/2000/svg\"");
    }
    for property in PROMOTED_VECTOR_PROPS {
        if element.attributes.contains_key(property) {
            continue;
        }
        if let Some(value) = element.computed_style.get(property) {
            out.push(' ');
            out.push_str(property);
            out.push_str("=\"");
            out.push_str(&escape_markup(value));
            out.push('"');
        }
    }

    if element.children.is_empty() {
        out.push_str("/>");
        return true;
    }
    out.push('>');
    for child in &element.children {
        match child {
            StyleTreeNode::Text { text } => out.push_str(&escape_markup(text)),
            StyleTreeNode::Element(child_element) => {
                if !write_vector_element(child_element, out, false) {
                    return false;
                }
            }
        }
    }
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
    true
}

fn escape_markup(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}
