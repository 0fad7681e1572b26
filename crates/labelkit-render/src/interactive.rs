//! On-screen rendering with selection chrome and alignment guides.

use crate::draw::draw_object;
use crate::error::RenderResult;
use crate::raster::Surface;
use crate::renderer::{RenderContext, Renderer};
use crate::text::FontSet;
use kurbo::{Affine, Circle, Line, Rect, Vec2};
use labelkit_core::geometry::{Corner, rotate_handle_position};
use labelkit_core::objects::PlacedObject;
use labelkit_core::snap::Guide;
use labelkit_core::view::ViewTransform;
use std::sync::Arc;

/// Half-size of the drawn corner squares, in dots.
const HANDLE_HALF_SIZE: f64 = 6.0;
/// Radius of the drawn rotate handle, in dots.
const ROTATE_HANDLE_RADIUS: f64 = 5.0;
/// Selection box dash pattern, in dots.
const SELECTION_DASH: [f32; 2] = [4.0, 3.0];

/// Renders the editing canvas.
///
/// Draw order is paper, objects, selection chrome, then guides. The object
/// under the inline text editor is left out.
#[derive(Debug, Clone)]
pub struct InteractiveRenderer {
    fonts: Arc<FontSet>,
}

impl Default for InteractiveRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractiveRenderer {
    /// Renderer using the system sans-serif fonts.
    pub fn new() -> Self {
        Self::with_fonts(FontSet::system())
    }

    pub fn with_fonts(fonts: Arc<FontSet>) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &Arc<FontSet> {
        &self.fonts
    }

    fn render_selection(&self, surface: &mut Surface, object: &PlacedObject, ctx: &RenderContext, transform: Affine) {
        let g = &object.geometry;
        let color = ctx.selection_color;
        surface.stroke(&g.bounds(), color, 1.0, &SELECTION_DASH, transform);

        for corner in Corner::ALL {
            let c = corner.position(g);
            let square = Rect::from_center_size(c, (HANDLE_HALF_SIZE * 2.0, HANDLE_HALF_SIZE * 2.0));
            surface.fill(&square, color, transform);
        }

        let knob = rotate_handle_position(g, ctx.rotate_offset);
        surface.fill(&Circle::new(knob, ROTATE_HANDLE_RADIUS), color, transform);
    }

    fn render_guides(&self, surface: &mut Surface, ctx: &RenderContext, transform: Affine) {
        let width = f64::from(ctx.document.width_dots);
        let height = f64::from(ctx.document.height_dots);
        for guide in ctx.guides {
            let line = match *guide {
                Guide::Vertical(x) => Line::new((x, 0.0), (x, height)),
                Guide::Horizontal(y) => Line::new((0.0, y), (width, y)),
            };
            surface.stroke(&line, ctx.guide_color, 1.0, &[], transform);
        }
    }
}

impl Renderer for InteractiveRenderer {
    fn render(&self, ctx: &RenderContext) -> RenderResult<Surface> {
        let document = ctx.document;
        let view = ViewTransform::new(Vec2::ZERO, ctx.scale);
        let size = view.canvas_size(document.width_dots, document.height_dots);
        let mut surface = Surface::new(size.width.max(1.0) as u32, size.height.max(1.0) as u32)?;
        surface.clear(self.background_color(ctx));

        let transform = Affine::scale(view.scale);

        for object in &document.objects {
            if ctx.editing_object == Some(object.id()) {
                continue;
            }
            draw_object(&mut surface, object, transform, &self.fonts, true);
        }

        if let Some(selected) = ctx.selection.and_then(|id| document.get(id)) {
            self.render_selection(&mut surface, selected, ctx, transform);
        }

        self.render_guides(&mut surface, ctx, transform);

        log::trace!(
            "Rendered {} objects into {}x{}",
            document.len(),
            surface.width(),
            surface.height()
        );
        Ok(surface)
    }
}
