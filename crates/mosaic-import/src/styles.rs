//! Style deduplication: every distinct text size and solid text color
//! becomes one shared style record that runs reference instead of restating.

use mosaic_scene::{
    ColorStyleRecord, Paint, SceneDocument, SceneNodeKind, TextStyleRecord,
};

/// Collect shared text and color styles, one record per distinct value.
/// Safe to run repeatedly: records are matched by exact value, so a second
/// pass adds nothing and changes nothing.
pub fn deduplicate(doc: &mut SceneDocument) {
    let SceneDocument {
        nodes,
        text_styles,
        color_styles,
        ..
    } = doc;
    for node in nodes {
        let SceneNodeKind::TextRun(run) = &mut node.kind else {
            continue;
        };
        if let Some(size) = run.font_size {
            run.text_style_ref = Some(text_style_name(text_styles, size));
        }
        if run.color_style_ref.is_none() {
            if let Some(color) = solid_fill(&run.fills) {
                run.color_style_ref = Some(color_style_name(color_styles, color));
            }
        }
    }
}

fn solid_fill(fills: &[Paint]) -> Option<mosaic_css::Color> {
    fills.iter().find_map(|paint| match paint {
        Paint::Solid { color } => Some(*color),
        _ => None,
    })
}

fn text_style_name(records: &mut Vec<TextStyleRecord>, size: f64) -> String {
    if let Some(existing) = records.iter().find(|record| record.font_size == size) {
        return existing.name.clone();
    }
    let name = format!("Text {}", format_size(size));
    records.push(TextStyleRecord {
        name: name.clone(),
        font_size: size,
    });
    name
}

fn color_style_name(records: &mut Vec<ColorStyleRecord>, color: mosaic_css::Color) -> String {
    let hex = color.to_hex();
    if let Some(existing) = records.iter().find(|record| record.name == hex) {
        return existing.name.clone();
    }
    records.push(ColorStyleRecord {
        name: hex.clone(),
        color,
    });
    hex
}

fn format_size(size: f64) -> String {
    if size.fract() == 0.0 {
        format!("{}", size as i64)
    } else {
        format!("{size}")
    }
}
