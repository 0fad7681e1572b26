//! Mapping between document dots and on-screen pixels.

use kurbo::{Affine, Point, Size, Vec2};

/// Narrowest the canvas is ever laid out, in screen pixels.
pub const MIN_CANVAS_WIDTH_PX: f64 = 240.0;
/// Horizontal padding kept around the canvas inside its container.
pub const CONTAINER_PADDING_PX: f64 = 20.0;

/// View transform for the interactive canvas.
///
/// `offset` is where the canvas' top-left corner sits in the viewport and
/// `scale` is screen pixels per document dot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub offset: Vec2,
    pub scale: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn new(offset: Vec2, scale: f64) -> Self {
        let mut view = Self { offset, scale: 1.0 };
        view.set_scale(scale);
        view
    }

    /// Scale a canvas `width_dots` wide to fill a container `container_width` pixels wide.
    pub fn fit_width(container_width: f64, width_dots: u32) -> Self {
        let available = (container_width - CONTAINER_PADDING_PX).max(MIN_CANVAS_WIDTH_PX);
        Self::new(Vec2::ZERO, available / f64::from(width_dots.max(1)))
    }

    /// Set the scale, ignoring non-positive or non-finite values.
    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
    }

    /// Document-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Convert a screen point to document coordinates.
    pub fn screen_to_doc(&self, screen_point: Point) -> Point {
        self.transform().inverse() * screen_point
    }

    /// Convert a document point to screen coordinates.
    pub fn doc_to_screen(&self, doc_point: Point) -> Point {
        self.transform() * doc_point
    }

    /// On-screen size of a canvas `width_dots` by `height_dots`, rounded to whole pixels.
    pub fn canvas_size(&self, width_dots: u32, height_dots: u32) -> Size {
        Size::new(
            (f64::from(width_dots) * self.scale).round(),
            (f64::from(height_dots) * self.scale).round(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_width() {
        let view = ViewTransform::fit_width(460.0, 440);
        assert_eq!(view.scale, 1.0);
        let narrow = ViewTransform::fit_width(100.0, 480);
        assert_eq!(narrow.scale, 0.5);
    }

    #[test]
    fn test_round_trip_points() {
        let view = ViewTransform::new(Vec2::new(30.0, 50.0), 2.0);
        let doc = Point::new(10.0, 20.0);
        let screen = view.doc_to_screen(doc);
        assert_eq!(screen, Point::new(50.0, 90.0));
        let back = view.screen_to_doc(screen);
        assert!((back - doc).hypot() < 1e-9);
    }

    #[test]
    fn test_rejects_bad_scale() {
        let mut view = ViewTransform::default();
        view.set_scale(0.0);
        view.set_scale(f64::NAN);
        assert_eq!(view.scale, 1.0);
    }

    #[test]
    fn test_canvas_size() {
        let view = ViewTransform::new(Vec2::ZERO, 0.75);
        assert_eq!(view.canvas_size(440, 240), Size::new(330.0, 180.0));
    }
}
