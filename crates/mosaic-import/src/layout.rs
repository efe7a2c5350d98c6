//! Mapping CSS display/box properties onto the auto-layout contract.

use mosaic_css::{BoxEdges, parse_grid_tracks, resolve_edges};
use mosaic_scene::{AxisAlign, LayoutMode, SizingMode};

use crate::tree::StyleMap;

/// Item spacing used when a flex container specifies no gap.
const DEFAULT_FLEX_GAP: f64 = 6.0;

/// The layout contract a container frame receives.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutContract {
    pub mode: LayoutMode,
    pub primary_sizing: SizingMode,
    pub counter_sizing: SizingMode,
    pub item_spacing: f64,
    pub primary_align: AxisAlign,
    pub counter_align: AxisAlign,
    pub padding: BoxEdges,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Column plan for a grid container.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPlan {
    pub columns: usize,
    /// Explicit per-column pixel widths, when every track is fixed.
    pub column_widths: Option<Vec<f64>>,
    pub column_gap: f64,
    pub row_gap: f64,
}

impl GridPlan {
    /// Total row width when every column width is known.
    pub fn row_width(&self) -> Option<f64> {
        let widths = self.column_widths.as_ref()?;
        let gaps = self.column_gap * (self.columns.saturating_sub(1)) as f64;
        Some(widths.iter().sum::<f64>() + gaps)
    }
}

pub fn is_grid(style: &StyleMap) -> bool {
    matches!(style.get("display"), Some("grid") | Some("inline-grid"))
}

/// Build the column plan for a grid container; `None` when the template is
/// absent or empty (the container then degrades to a plain vertical frame).
pub fn grid_plan(style: &StyleMap) -> Option<GridPlan> {
    let tracks = style
        .get("grid-template-columns")
        .and_then(parse_grid_tracks)?;
    let gap = style.length("gap");
    Some(GridPlan {
        columns: tracks.count.max(1),
        column_widths: tracks.widths,
        column_gap: style.length("column-gap").or(gap).unwrap_or(0.0),
        row_gap: style.length("row-gap").or(gap).unwrap_or(0.0),
    })
}

/// Resolve an element's layout contract from its computed style.
///
/// `auto_layout` mirrors the global toggle: when off, block-like elements
/// keep no layout mode instead of the implicit vertical stack.
pub fn resolve_contract(style: &StyleMap, auto_layout: bool) -> LayoutContract {
    let display = style.get("display").unwrap_or("");
    let padding = paddings(style);
    let width = style.length("width");
    let height = style.length("height");

    let mut contract = match display {
        "flex" | "inline-flex" => flex_contract(style),
        "grid" | "inline-grid" => LayoutContract {
            mode: LayoutMode::Vertical,
            primary_sizing: SizingMode::Hug,
            counter_sizing: SizingMode::Fill,
            item_spacing: grid_plan(style).map(|plan| plan.row_gap).unwrap_or(0.0),
            primary_align: AxisAlign::Min,
            counter_align: AxisAlign::Min,
            padding: BoxEdges::default(),
            width: None,
            height: None,
        },
        "inline" | "inline-block" => LayoutContract {
            mode: LayoutMode::Horizontal,
            primary_sizing: SizingMode::Hug,
            counter_sizing: SizingMode::Hug,
            item_spacing: 0.0,
            primary_align: AxisAlign::Min,
            counter_align: AxisAlign::Min,
            padding: BoxEdges::default(),
            width: None,
            height: None,
        },
        // Plain block flow approximated as a vertical stack.
        _ => LayoutContract {
            mode: if auto_layout {
                LayoutMode::Vertical
            } else {
                LayoutMode::None
            },
            primary_sizing: SizingMode::Hug,
            counter_sizing: SizingMode::Fill,
            item_spacing: 0.0,
            primary_align: AxisAlign::Min,
            counter_align: AxisAlign::Min,
            padding: BoxEdges::default(),
            width: None,
            height: None,
        },
    };
    contract.padding = padding;

    // Explicit dimensions pin the mapped axis to Fixed. Which CSS dimension
    // lands on the primary axis depends on the flow direction.
    let (horizontal_axis, vertical_axis) = match contract.mode {
        LayoutMode::Horizontal => (Axis::Primary, Axis::Counter),
        _ => (Axis::Counter, Axis::Primary),
    };
    if let Some(w) = width {
        contract.width = Some(w);
        contract.set_sizing(horizontal_axis, SizingMode::Fixed);
    }
    if let Some(h) = height {
        contract.height = Some(h);
        contract.set_sizing(vertical_axis, SizingMode::Fixed);
    }
    contract
}

#[derive(Clone, Copy)]
enum Axis {
    Primary,
    Counter,
}

impl LayoutContract {
    fn set_sizing(&mut self, axis: Axis, sizing: SizingMode) {
        match axis {
            Axis::Primary => self.primary_sizing = sizing,
            Axis::Counter => self.counter_sizing = sizing,
        }
    }
}

fn flex_contract(style: &StyleMap) -> LayoutContract {
    let direction = style.get("flex-direction").unwrap_or("row");
    let mode = if direction.starts_with("row") {
        LayoutMode::Horizontal
    } else {
        LayoutMode::Vertical
    };
    let gap = style.length("gap");
    let item_spacing = match mode {
        LayoutMode::Horizontal => style.length("column-gap").or(gap),
        _ => style.length("row-gap").or(gap),
    }
    .unwrap_or(DEFAULT_FLEX_GAP);

    let primary_align = match style.get("justify-content").unwrap_or("") {
        "space-between" | "space-around" | "space-evenly" => AxisAlign::SpaceBetween,
        "center" => AxisAlign::Center,
        "end" | "flex-end" => AxisAlign::Max,
        _ => AxisAlign::Min,
    };
    let counter_align = match style.get("align-items").unwrap_or("") {
        "center" => AxisAlign::Center,
        "end" | "flex-end" => AxisAlign::Max,
        _ => AxisAlign::Min,
    };

    LayoutContract {
        mode,
        // Flex rows hug their content on the main axis and fill across.
        primary_sizing: SizingMode::Hug,
        counter_sizing: match mode {
            LayoutMode::Horizontal => SizingMode::Hug,
            _ => SizingMode::Fill,
        },
        item_spacing,
        primary_align,
        counter_align,
        padding: BoxEdges::default(),
        width: None,
        height: None,
    }
}

pub fn margins(style: &StyleMap) -> BoxEdges {
    resolve_edges(
        style.get("margin"),
        style.get("margin-top"),
        style.get("margin-right"),
        style.get("margin-bottom"),
        style.get("margin-left"),
    )
}

pub fn paddings(style: &StyleMap) -> BoxEdges {
    resolve_edges(
        style.get("padding"),
        style.get("padding-top"),
        style.get("padding-right"),
        style.get("padding-bottom"),
        style.get("padding-left"),
    )
}
