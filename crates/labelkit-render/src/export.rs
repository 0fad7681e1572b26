//! Print export: the document flattened at native resolution.
//!
//! No selection chrome, guides or image placeholders are drawn. Fixed media
//! export at the document size; continuous media at the content height
//! plus a margin.

use crate::draw::draw_object;
use crate::error::RenderResult;
use crate::raster::Surface;
use crate::renderer::{RenderContext, Renderer};
use crate::text::FontSet;
use kurbo::Affine;
use labelkit_core::config::EditorConfig;
use labelkit_core::document::{LabelDocument, MAX_CANVAS_DOTS};
use labelkit_core::print::ExportedLabel;
use std::sync::Arc;

/// Margin below the content on continuous media, in dots.
pub const DEFAULT_EXPORT_MARGIN: f64 = 8.0;
/// Tallest export, in dots.
pub const DEFAULT_MAX_EXPORT_HEIGHT: u32 = MAX_CANVAS_DOTS;

#[derive(Debug, Clone)]
pub struct ExportRenderer {
    fonts: Arc<FontSet>,
    margin: f64,
    max_height: u32,
}

impl Default for ExportRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportRenderer {
    /// Renderer using the system sans-serif fonts and default continuous-media limits.
    pub fn new() -> Self {
        Self::with_fonts(FontSet::system())
    }

    pub fn with_fonts(fonts: Arc<FontSet>) -> Self {
        Self {
            fonts,
            margin: DEFAULT_EXPORT_MARGIN,
            max_height: DEFAULT_MAX_EXPORT_HEIGHT,
        }
    }

    /// Take the continuous-media margin and the height cap from editor settings.
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new().with_limits(config.export_margin, config.export_max_height)
    }

    /// The height cap never exceeds [`MAX_CANVAS_DOTS`].
    pub fn with_limits(mut self, margin: f64, max_height: u32) -> Self {
        self.margin = margin;
        self.max_height = max_height.clamp(1, MAX_CANVAS_DOTS);
        self
    }

    /// Output size in dots for `document`.
    pub fn export_size(&self, document: &LabelDocument) -> (u32, u32) {
        (
            document.export_width(),
            document.export_height(self.margin, self.max_height),
        )
    }

    /// Render and PNG-encode `document` for a print or preview sink.
    ///
    /// Images should be decoded first; undecoded ones are left out.
    pub fn export(&self, document: &LabelDocument) -> RenderResult<ExportedLabel> {
        let surface = self.render(&RenderContext::new(document))?;
        let png = surface.encode_png()?;
        log::info!(
            "Exported {} label: {}x{}, {} bytes",
            document.media.id(),
            surface.width(),
            surface.height(),
            png.len()
        );
        Ok(ExportedLabel {
            png,
            width: surface.width(),
            height: surface.height(),
            media: document.media.clone(),
        })
    }
}

impl Renderer for ExportRenderer {
    /// Ignores the context's scale, selection, guides and editing state.
    fn render(&self, ctx: &RenderContext) -> RenderResult<Surface> {
        let document = ctx.document;
        let (width, height) = self.export_size(document);
        let mut surface = Surface::new(width, height)?;
        surface.clear(self.background_color(ctx));

        for object in &document.objects {
            draw_object(&mut surface, object, Affine::IDENTITY, &self.fonts, false);
        }
        Ok(surface)
    }
}
