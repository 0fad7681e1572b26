//! Renderer trait abstraction.

use crate::error::RenderResult;
use crate::raster::Surface;
use labelkit_core::canvas::Canvas;
use labelkit_core::document::LabelDocument;
use labelkit_core::geometry::ROTATE_HANDLE_OFFSET;
use labelkit_core::objects::ObjectId;
use labelkit_core::snap::Guide;
use peniko::Color;

/// Context for a single render.
pub struct RenderContext<'a> {
    /// The document to render.
    pub document: &'a LabelDocument,
    /// Surface pixels per document dot.
    pub scale: f64,
    /// Paper color.
    pub background_color: Color,
    /// Selection box and handle color.
    pub selection_color: Color,
    /// Alignment guide color.
    pub guide_color: Color,
    /// Object to draw selection chrome for.
    pub selection: Option<ObjectId>,
    /// Object hidden behind the inline text editor.
    pub editing_object: Option<ObjectId>,
    /// Alignment guides, in document dots.
    pub guides: &'a [Guide],
    /// Distance of the rotate handle above the selection, in dots.
    pub rotate_offset: f64,
}

impl<'a> RenderContext<'a> {
    /// Plain context: no selection, no guides, scale 1.
    pub fn new(document: &'a LabelDocument) -> Self {
        Self {
            document,
            scale: 1.0,
            background_color: Color::WHITE,
            selection_color: Color::from_rgba8(47, 111, 237, 255),
            guide_color: Color::from_rgba8(47, 111, 237, 153),
            selection: None,
            editing_object: None,
            guides: &[],
            rotate_offset: ROTATE_HANDLE_OFFSET,
        }
    }

    /// Context for the current state of an editing session.
    pub fn from_canvas(canvas: &'a Canvas) -> Self {
        Self::new(canvas.document())
            .with_scale(canvas.view().scale)
            .with_selection(canvas.selection())
            .with_editing_object(canvas.editing_object())
            .with_guides(canvas.guides())
            .with_rotate_offset(canvas.config().rotate_handle_offset)
    }

    /// Set the surface scale.
    pub fn with_scale(mut self, scale: f64) -> Self {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    pub fn with_selection(mut self, selection: Option<ObjectId>) -> Self {
        self.selection = selection;
        self
    }

    /// Set the object being edited (skipped when drawing objects).
    pub fn with_editing_object(mut self, id: Option<ObjectId>) -> Self {
        self.editing_object = id;
        self
    }

    pub fn with_guides(mut self, guides: &'a [Guide]) -> Self {
        self.guides = guides;
        self
    }

    pub fn with_rotate_offset(mut self, offset: f64) -> Self {
        self.rotate_offset = offset;
        self
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Draw a frame into a fresh surface.
    fn render(&self, ctx: &RenderContext) -> RenderResult<Surface>;

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}
