//! Import pipeline: captured style tree in, scene document out.
//!
//! The phases run in a fixed order. Fonts are resolved in a pre-pass so
//! text runs never wait on loads mid-walk; the builder schedules image
//! fetches as it goes and the paint resolver settles them at a barrier
//! before the link and deduplication passes run over the finished graph.

pub mod builder;
pub mod classify;
pub mod fonts;
pub mod layout;
pub mod links;
pub mod paint;
pub mod styles;
pub mod tree;

use std::sync::Arc;

use tracing::info;

use mosaic_io::HttpFetcher;
use mosaic_scene::SceneDocument;

use builder::Builder;
use fonts::{FontResolver, FontSubstitution, SystemFontHost};
use paint::PaintResolver;
use tree::StyleTreeNode;

pub use fonts::{FontHost, FontRequest};
pub use tree::parse_tree;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub viewport: Viewport,
    /// Nodes created between cooperative yields during the walk.
    pub yield_every: usize,
    /// When false, containers keep absolute stacking (no auto-layout).
    pub auto_layout: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            yield_every: 300,
            auto_layout: true,
        }
    }
}

/// What the import could not reproduce faithfully.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub missing_fonts: Vec<String>,
    pub font_substitutions: Vec<FontSubstitution>,
}

pub struct ImportResult {
    pub document: SceneDocument,
    pub report: ImportReport,
}

pub struct Importer {
    options: ImportOptions,
    fonts: FontResolver,
    paints: PaintResolver,
    on_yield: Option<Box<dyn FnMut()>>,
}

impl Importer {
    /// Importer with production collaborators: system fonts and HTTP fetch.
    pub fn new(options: ImportOptions) -> Self {
        Self::with_hosts(
            options,
            Box::new(SystemFontHost::new()),
            Arc::new(HttpFetcher::new()),
        )
    }

    pub fn with_hosts(
        options: ImportOptions,
        font_host: Box<dyn FontHost>,
        fetcher: Arc<dyn mosaic_io::ByteFetcher>,
    ) -> Self {
        Self {
            options,
            fonts: FontResolver::new(font_host),
            paints: PaintResolver::new(fetcher),
            on_yield: None,
        }
    }

    /// Called every `yield_every` created nodes so the host loop can run.
    pub fn on_yield(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_yield = Some(Box::new(callback));
        self
    }

    pub fn import(mut self, nodes: &[StyleTreeNode]) -> ImportResult {
        self.fonts.prepare(nodes);

        let builder = Builder::new(
            &mut self.fonts,
            &mut self.paints,
            &self.options,
            self.on_yield.take(),
        );
        let output = builder.build(nodes);
        let mut document = output.doc;

        self.paints.settle(&mut document);
        links::resolve_links(&mut document, &output.identity, &output.anchors);
        styles::deduplicate(&mut document);

        let report = ImportReport {
            missing_fonts: self
                .fonts
                .missing()
                .iter()
                .map(|request| format!("{} {}", request.family, request.style.name()))
                .collect(),
            font_substitutions: self.fonts.substitutions().to_vec(),
        };
        info!(
            nodes = document.nodes.len(),
            missing_fonts = report.missing_fonts.len(),
            substitutions = report.font_substitutions.len(),
            "import finished"
        );
        ImportResult { document, report }
    }
}

/// One-call entry: parse the capture payload and import with defaults.
pub fn import_json(json: &str, options: ImportOptions) -> anyhow::Result<ImportResult> {
    let nodes = tree::parse_tree(json)?;
    Ok(Importer::new(options).import(&nodes))
}
