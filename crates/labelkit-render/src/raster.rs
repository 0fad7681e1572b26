//! CPU raster surface backed by a tiny-skia pixmap.
//!
//! Geometry is built with kurbo and converted to tiny-skia paths at the
//! draw call, so drawing code can stay in document coordinates and pass
//! the document-to-pixel [`Affine`] along.

use crate::error::{RenderError, RenderResult};
use kurbo::{Affine, BezPath, PathEl, Rect, Shape};
use labelkit_core::objects::ImageHandle;
use peniko::Color;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, StrokeDash,
    Transform,
};

/// Flattening tolerance used when converting kurbo shapes.
const PATH_TOLERANCE: f64 = 0.1;

/// Convert a kurbo affine to a tiny-skia transform.
pub fn to_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn to_skia_color(color: Color) -> tiny_skia::Color {
    let c = color.to_rgba8();
    tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32),
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_skia_color(color));
    paint.anti_alias = true;
    paint
}

/// A pixel buffer being drawn into.
pub struct Surface {
    pixmap: Pixmap,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Surface({}x{})", self.width(), self.height())
    }
}

impl Surface {
    /// Allocate a transparent surface.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            RenderError::Surface(format!("Cannot allocate a {width}x{height} surface"))
        })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Fill the whole surface with `color`.
    pub fn clear(&mut self, color: Color) {
        self.pixmap.fill(to_skia_color(color));
    }

    pub fn fill(&mut self, shape: &impl Shape, color: Color, transform: Affine) {
        let Some(path) = to_skia_path(&shape.to_path(PATH_TOLERANCE)) else {
            return;
        };
        self.fill_path(&path, color, transform);
    }

    /// Fill an already-built tiny-skia path (glyph outlines).
    pub(crate) fn fill_path(&mut self, path: &tiny_skia::Path, color: Color, transform: Affine) {
        self.pixmap.fill_path(
            path,
            &solid_paint(color),
            FillRule::Winding,
            to_transform(transform),
            None,
        );
    }

    /// Stroke `shape`. A non-empty `dash` gives on/off lengths in the shape's units.
    pub fn stroke(&mut self, shape: &impl Shape, color: Color, width: f64, dash: &[f32], transform: Affine) {
        let Some(path) = to_skia_path(&shape.to_path(PATH_TOLERANCE)) else {
            return;
        };
        let stroke = Stroke {
            width: width as f32,
            dash: if dash.is_empty() {
                None
            } else {
                StrokeDash::new(dash.to_vec(), 0.0)
            },
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &solid_paint(color), &stroke, to_transform(transform), None);
    }

    /// Draw decoded pixels stretched over `dest`, without smoothing.
    pub fn draw_image(&mut self, image: &ImageHandle, dest: Rect, transform: Affine) {
        let (iw, ih) = (image.width(), image.height());
        let Some(mut pixels) = Pixmap::new(iw, ih) else {
            log::warn!("Skipping empty {iw}x{ih} image");
            return;
        };
        for (dst, src) in pixels.pixels_mut().iter_mut().zip(image.rgba().chunks_exact(4)) {
            *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
        }

        let placement = transform
            * Affine::translate((dest.x0, dest.y0))
            * Affine::scale_non_uniform(dest.width() / f64::from(iw), dest.height() / f64::from(ih));
        let paint = PixmapPaint {
            quality: FilterQuality::Nearest,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, pixels.as_ref(), &paint, to_transform(placement), None);
    }

    /// Straight RGBA at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Encode as PNG.
    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("Failed to encode PNG: {e}")))
    }
}
