//! Mosaic: converts a captured HTML style tree into a design-canvas
//! scene graph. This facade re-exports the import pipeline and the
//! document model it produces.

pub use mosaic_css as css;
pub use mosaic_import::{
    ImportOptions, ImportReport, ImportResult, Importer, Viewport, import_json,
};
pub use mosaic_scene::{SceneDocument, SceneNode, SceneNodeKind};
