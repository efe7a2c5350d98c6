use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use mosaic_import::{FontHost, ImportOptions, ImportResult, Importer, parse_tree};
use mosaic_io::{ByteFetcher, FetchError};
use mosaic_scene::{
    FontName, Interaction, LayoutMode, Paint, ScaleMode, SceneDocument, SceneNodeKind,
    SizingMode,
};

struct FakeFontHost {
    available: HashSet<(String, String)>,
}

impl FakeFontHost {
    fn with_fonts(fonts: &[(&str, &str)]) -> Box<Self> {
        Box::new(Self {
            available: fonts
                .iter()
                .map(|(family, style)| (family.to_string(), style.to_string()))
                .collect(),
        })
    }
}

impl FontHost for FakeFontHost {
    fn try_load(&mut self, font: &FontName) -> bool {
        self.available
            .contains(&(font.family.clone(), font.style.clone()))
    }
}

struct FakeFetcher {
    responses: HashMap<String, Vec<u8>>,
}

impl ByteFetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Request(format!("no response for {url}")))
    }
}

fn import(json: &str) -> Result<ImportResult> {
    import_with(json, &[("Inter", "Regular"), ("Inter", "Bold")], HashMap::new())
}

fn import_with(
    json: &str,
    fonts: &[(&str, &str)],
    responses: HashMap<String, Vec<u8>>,
) -> Result<ImportResult> {
    let nodes = parse_tree(json)?;
    let importer = Importer::with_hosts(
        ImportOptions::default(),
        FakeFontHost::with_fonts(fonts),
        Arc::new(FakeFetcher { responses }),
    );
    Ok(importer.import(&nodes))
}

fn frame_of<'a>(doc: &'a SceneDocument, id: &str) -> &'a mosaic_scene::FrameSpec {
    match &doc.node(id).expect("node exists").kind {
        SceneNodeKind::Frame(frame) => frame,
        other => panic!("expected frame, got {other:?}"),
    }
}

fn text_of<'a>(doc: &'a SceneDocument, id: &str) -> &'a mosaic_scene::TextRunSpec {
    match &doc.node(id).expect("node exists").kind {
        SceneNodeKind::TextRun(run) => run,
        other => panic!("expected text run, got {other:?}"),
    }
}

#[test]
fn flex_row_becomes_horizontal_frame_with_runs_in_order() -> Result<()> {
    let result = import(
        r#"[
        {"type": "element", "tag": "div",
         "computedStyle": {"display": "flex", "gap": "8px"},
         "children": [
            {"type": "element", "tag": "span",
             "computedStyle": {"font-size": "14px"},
             "children": [{"type": "text", "text": "First"}]},
            {"type": "element", "tag": "span",
             "computedStyle": {"font-size": "14px"},
             "children": [{"type": "text", "text": "Second"}]}
         ]}
    ]"#,
    )?;
    let doc = &result.document;

    let root = doc.root_frame()?;
    assert_eq!(root.layout_mode, LayoutMode::Vertical);
    assert_eq!(root.width, Some(1920.0));
    assert_eq!(root.children.len(), 1);

    let row = frame_of(doc, &root.children[0]);
    assert_eq!(row.layout_mode, LayoutMode::Horizontal);
    assert_eq!(row.item_spacing, 8.0);
    assert_eq!(row.children.len(), 2);
    assert_eq!(text_of(doc, &row.children[0]).text, "First");
    assert_eq!(text_of(doc, &row.children[1]).text, "Second");
    Ok(())
}

#[test]
fn grid_children_pack_into_rows_with_pinned_widths() -> Result<()> {
    let mut cells = String::new();
    for i in 0..7 {
        cells.push_str(&format!(
            r##"{}{{"type": "element", "tag": "div",
               "computedStyle": {{"background-color": "#cccccc"}},
               "children": []}}"##,
            if i == 0 { "" } else { "," }
        ));
    }
    let json = format!(
        r#"[
        {{"type": "element", "tag": "div",
          "computedStyle": {{
            "display": "grid",
            "grid-template-columns": "100px 100px 100px",
            "gap": "10px"}},
          "children": [{cells}]}}
    ]"#
    );
    let result = import(&json)?;
    let doc = &result.document;

    let grid = frame_of(doc, &doc.root_frame()?.children[0]);
    assert_eq!(grid.layout_mode, LayoutMode::Vertical);
    assert_eq!(grid.item_spacing, 10.0);
    // 7 children over 3 columns pack into rows of 3, 3, and 1.
    assert_eq!(grid.children.len(), 3);
    let row_sizes: Vec<usize> = grid
        .children
        .iter()
        .map(|row| frame_of(doc, row).children.len())
        .collect();
    assert_eq!(row_sizes, vec![3, 3, 1]);

    let first_row = frame_of(doc, &grid.children[0]);
    assert_eq!(first_row.layout_mode, LayoutMode::Horizontal);
    assert_eq!(first_row.item_spacing, 10.0);
    assert_eq!(first_row.width, Some(320.0));
    assert_eq!(first_row.primary_sizing, SizingMode::Fixed);

    let cell = frame_of(doc, &first_row.children[0]);
    assert_eq!(cell.width, Some(100.0));
    Ok(())
}

#[test]
fn unavailable_family_substitutes_and_is_reported() -> Result<()> {
    let result = import(
        r#"[
        {"type": "element", "tag": "p",
         "computedStyle": {"font-family": "Roboto, sans-serif"},
         "children": [{"type": "text", "text": "Body"}]},
        {"type": "element", "tag": "p",
         "computedStyle": {"font-family": "Fantasia"},
         "children": [{"type": "text", "text": "Odd"}]}
    ]"#,
    )?;
    let doc = &result.document;

    let runs: Vec<_> = doc
        .nodes
        .iter()
        .filter_map(|node| match &node.kind {
            SceneNodeKind::TextRun(run) => Some(run),
            _ => None,
        })
        .collect();
    assert!(
        runs.iter()
            .all(|run| run.font == Some(FontName::new("Inter", "Regular"))),
        "every run should land on the available family"
    );
    assert!(
        result
            .report
            .font_substitutions
            .iter()
            .any(|sub| sub.original.starts_with("Roboto")),
        "Roboto should be recorded as substituted"
    );
    assert!(
        result
            .report
            .missing_fonts
            .iter()
            .any(|name| name.starts_with("Fantasia")),
        "unknown family should be reported missing"
    );
    Ok(())
}

#[test]
fn heading_defaults_to_level_size_and_bold() -> Result<()> {
    let result = import(
        r#"[
        {"type": "element", "tag": "h1",
         "computedStyle": {},
         "children": [{"type": "text", "text": "Title"}]}
    ]"#,
    )?;
    let doc = &result.document;
    let run = text_of(doc, &doc.root_frame()?.children[0]);
    assert_eq!(run.font_size, Some(32.0));
    assert_eq!(run.font, Some(FontName::new("Inter", "Bold")));
    Ok(())
}

#[test]
fn italic_heading_bolds_without_losing_the_modifier() -> Result<()> {
    let result = import_with(
        r#"[
        {"type": "element", "tag": "h1",
         "computedStyle": {"font-style": "italic"},
         "children": [{"type": "text", "text": "Title"}]}
    ]"#,
        &[
            ("Inter", "Regular"),
            ("Inter", "Bold"),
            ("Inter", "Italic"),
            ("Inter", "Bold Italic"),
        ],
        HashMap::new(),
    )?;
    let doc = &result.document;
    let run = text_of(doc, &doc.root_frame()?.children[0]);
    assert_eq!(run.font, Some(FontName::new("Inter", "Bold Italic")));
    Ok(())
}

#[test]
fn hidden_elements_and_empty_text_produce_no_nodes() -> Result<()> {
    let result = import(
        r#"[
        {"type": "element", "tag": "div",
         "computedStyle": {"display": "none"},
         "children": [{"type": "text", "text": "invisible"}]},
        {"type": "element", "tag": "p",
         "computedStyle": {},
         "children": [{"type": "text", "text": "   "}]}
    ]"#,
    )?;
    assert!(result.document.root_frame()?.children.is_empty());
    Ok(())
}

#[test]
fn anchor_fragment_resolves_to_navigation() -> Result<()> {
    let result = import(
        r##"[
        {"type": "element", "tag": "section",
         "computedStyle": {"--node-id": "intro"},
         "children": [
            {"type": "element", "tag": "h2",
             "computedStyle": {},
             "children": [{"type": "text", "text": "Intro"}]}
         ]},
        {"type": "element", "tag": "a",
         "attributes": {"href": "#intro"},
         "computedStyle": {},
         "children": [{"type": "text", "text": "Jump"}]}
    ]"##,
    )?;
    let doc = &result.document;

    let section_id = doc
        .nodes
        .iter()
        .find(|node| node.source_id.as_deref() == Some("intro"))
        .map(|node| node.id.clone())
        .expect("section carries its source id");
    let anchor = doc
        .nodes
        .iter()
        .find(|node| matches!(&node.kind, SceneNodeKind::TextRun(run) if run.text == "Jump"))
        .expect("anchor run exists");
    assert!(text_of(doc, &anchor.id).underline, "anchors underline");
    assert!(matches!(
        &anchor.interaction,
        Some(Interaction::NavigateTo { target }) if *target == section_id
    ));
    Ok(())
}

#[test]
fn image_fetch_attaches_paint_with_intrinsic_size() -> Result<()> {
    let mut png = Vec::new();
    let pixels = image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255]));
    image::DynamicImage::ImageRgba8(pixels).write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;

    let url = "https://assets.test/pic.png";
    let result = import_with(
        r#"[
        {"type": "element", "tag": "img",
         "attributes": {"src": "https://assets.test/pic.png"},
         "computedStyle": {"object-fit": "contain"},
         "children": []}
    ]"#,
        &[("Inter", "Regular")],
        HashMap::from([(url.to_string(), png)]),
    )?;
    let doc = &result.document;

    let shape = doc
        .nodes
        .iter()
        .find_map(|node| match &node.kind {
            SceneNodeKind::ImageShape(shape) => Some(shape),
            _ => None,
        })
        .expect("image shape exists");
    assert!(shape.error.is_none());
    let Some(Paint::Image {
        scale_mode,
        width,
        height,
        ..
    }) = shape.fills.first()
    else {
        panic!("image paint expected, got {:?}", shape.fills);
    };
    assert_eq!(*scale_mode, ScaleMode::Fit);
    assert_eq!(*width, Some(3.0));
    assert_eq!(*height, Some(2.0));
    Ok(())
}

#[test]
fn failed_fetch_marks_image_shape() -> Result<()> {
    let result = import(
        r#"[
        {"type": "element", "tag": "img",
         "attributes": {"src": "https://assets.test/gone.png"},
         "computedStyle": {},
         "children": []}
    ]"#,
    )?;
    let shape = result
        .document
        .nodes
        .iter()
        .find_map(|node| match &node.kind {
            SceneNodeKind::ImageShape(shape) => Some(shape),
            _ => None,
        })
        .expect("image shape exists");
    assert!(shape.error.is_some());
    assert!(shape.fills.is_empty());
    // Shape keeps its default footprint so the canvas shows something.
    assert_eq!((shape.width, shape.height), (200.0, 120.0));
    Ok(())
}

#[test]
fn repeated_text_sizes_share_a_style_record() -> Result<()> {
    let result = import(
        r##"[
        {"type": "element", "tag": "p",
         "computedStyle": {"font-size": "16px", "color": "#333333"},
         "children": [{"type": "text", "text": "One"}]},
        {"type": "element", "tag": "p",
         "computedStyle": {"font-size": "16px", "color": "#333333"},
         "children": [{"type": "text", "text": "Two"}]}
    ]"##,
    )?;
    let doc = &result.document;
    assert_eq!(doc.text_styles.len(), 1);
    assert_eq!(doc.text_styles[0].name, "Text 16");
    assert_eq!(doc.color_styles.len(), 1);
    assert_eq!(doc.color_styles[0].name, "#333333");
    Ok(())
}

#[test]
fn margins_become_wrapper_padding() -> Result<()> {
    let result = import(
        r##"[
        {"type": "element", "tag": "div",
         "computedStyle": {"margin": "10px 20px", "background-color": "#ffffff"},
         "children": []}
    ]"##,
    )?;
    let doc = &result.document;

    let wrapper = frame_of(doc, &doc.root_frame()?.children[0]);
    assert_eq!(wrapper.padding.top, 10.0);
    assert_eq!(wrapper.padding.left, 20.0);
    assert!(wrapper.fills.is_empty(), "wrapper carries no visuals");
    assert_eq!(wrapper.children.len(), 1);

    let inner = frame_of(doc, &wrapper.children[0]);
    assert!(!inner.fills.is_empty(), "visuals stay on the real frame");
    Ok(())
}

#[test]
fn yield_callback_fires_during_large_walks() -> Result<()> {
    let mut items = String::new();
    for i in 0..20 {
        items.push_str(&format!(
            r#"{}{{"type": "element", "tag": "p",
               "computedStyle": {{}},
               "children": [{{"type": "text", "text": "line"}}]}}"#,
            if i == 0 { "" } else { "," }
        ));
    }
    let nodes = parse_tree(&format!("[{items}]"))?;

    let yields = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&yields);
    let options = ImportOptions {
        yield_every: 5,
        ..ImportOptions::default()
    };
    let importer = Importer::with_hosts(
        options,
        FakeFontHost::with_fonts(&[("Inter", "Regular")]),
        Arc::new(FakeFetcher {
            responses: HashMap::new(),
        }),
    )
    .on_yield(move || {
        counter.fetch_add(1, Ordering::Relaxed);
    });
    importer.import(&nodes);

    assert!(yields.load(Ordering::Relaxed) >= 3);
    Ok(())
}

#[test]
fn vector_markup_is_reconstructed_with_promoted_paint() -> Result<()> {
    let result = import(
        r#"[
        {"type": "element", "tag": "svg",
         "attributes": {"viewBox": "0 0 24 24", "width": "24", "height": "24"},
         "computedStyle": {"fill": "rgb(255, 0, 0)"},
         "children": [
            {"type": "element", "tag": "path",
             "attributes": {"d": "M0 0L24 24"},
             "computedStyle": {},
             "children": []}
         ]}
    ]"#,
    )?;
    let shape = result
        .document
        .nodes
        .iter()
        .find_map(|node| match &node.kind {
            SceneNodeKind::VectorShape(shape) => Some(shape),
            _ => None,
        })
        .expect("vector shape exists");
    assert!(!shape.placeholder);
    let markup = shape.markup.as_deref().expect("markup present");
    assert!(markup.starts_with("<svg"));
    assert!(markup.contains("xmlns=\"http://www.w3.org/2000/svg\""));
    assert!(markup.contains("fill=\"rgb(255, 0, 0)\""));
    assert!(markup.contains("<path d=\"M0 0L24 24\"/>"));
    assert_eq!(shape.width, Some(24.0));
    Ok(())
}
