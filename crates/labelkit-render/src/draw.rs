//! Object drawing shared by the interactive and export renderers.
//!
//! Both renderers go through [`draw_object`], so a design looks the same on
//! screen and on paper. Everything is drawn in document dots; `base` maps
//! dots to surface pixels.

use crate::raster::Surface;
use crate::text::{FontSet, PathOutline, TextMeasure};
use crate::wrap::wrap_text;
use kurbo::{Affine, BezPath, Point, Rect};
use labelkit_core::objects::{
    Geometry, ImageObject, ObjectKind, PlacedObject, RectObject, TextAlign, TextObject,
};
use peniko::Color;

/// Ink color for text and shapes.
pub const INK: Color = Color::BLACK;

/// Outline width of unfilled rectangles, in dots.
pub const RECT_STROKE_WIDTH: f64 = 1.0;

/// Draw one object, rotated about its center.
///
/// `placeholders` draws a gray box for images that are not decoded yet;
/// without it those images are skipped.
pub fn draw_object(
    surface: &mut Surface,
    object: &PlacedObject,
    base: Affine,
    fonts: &FontSet,
    placeholders: bool,
) {
    let g = &object.geometry;
    let transform = if g.rotation != 0.0 {
        base * Affine::rotate_about(g.rotation.to_radians(), g.center())
    } else {
        base
    };

    match &object.kind {
        ObjectKind::Text(text) => draw_text(surface, g, text, transform, fonts),
        ObjectKind::Rect(rect) => draw_rect(surface, g, rect, transform),
        ObjectKind::Image(image) => draw_image(surface, g, image, transform, placeholders),
        ObjectKind::Unknown(_) => {
            log::trace!("Not drawing object of type {:?}", object.type_name());
        }
    }
}

/// Left edge of a line `width` wide laid out in `g` with `align`.
fn line_start(g: &Geometry, align: TextAlign, width: f64) -> f64 {
    match align {
        TextAlign::Left => g.x,
        TextAlign::Center => g.x + g.w / 2.0 - width / 2.0,
        TextAlign::Right => g.right() - width,
    }
}

fn draw_text(surface: &mut Surface, g: &Geometry, text: &TextObject, transform: Affine, fonts: &FontSet) {
    let (size, bold) = (text.size(), text.bold);
    let lines = wrap_text(&text.text, g.w, |s| fonts.measure(s, size, bold));

    let mut outline = PathOutline::new();
    let mut y = g.y;
    for line in &lines {
        if !line.is_empty() {
            let width = fonts.measure(line, size, bold);
            let x = line_start(g, text.align, width);
            if !fonts.outline_text(line, size, bold, x, y, &mut outline) {
                // No font: a bar stands in for the line's ink.
                let bar = Rect::new(x, y + size * 0.2, x + width, y + size * 0.8);
                surface.fill(&bar, INK, transform);
            }
        }
        y += text.line_height();
    }

    if let Some(path) = outline.finish() {
        surface.fill_path(&path, INK, transform);
    }
}

fn draw_rect(surface: &mut Surface, g: &Geometry, rect: &RectObject, transform: Affine) {
    let bounds = g.bounds();
    if rect.fill {
        surface.fill(&bounds, INK, transform);
    } else {
        surface.stroke(&bounds, INK, RECT_STROKE_WIDTH, &[], transform);
    }
}

fn draw_image(surface: &mut Surface, g: &Geometry, image: &ImageObject, transform: Affine, placeholders: bool) {
    match image.handle() {
        Some(handle) => surface.draw_image(handle, g.bounds(), transform),
        None if placeholders => draw_image_placeholder(surface, g.bounds(), transform),
        None => log::debug!("Skipping image that is not decoded yet"),
    }
}

/// Gray box with an X, shown while an image is decoding or failed to decode.
fn draw_image_placeholder(surface: &mut Surface, bounds: Rect, transform: Affine) {
    surface.fill(&bounds, Color::from_rgba8(200, 200, 200, 255), transform);

    let mut cross = BezPath::new();
    cross.move_to(Point::new(bounds.x0, bounds.y0));
    cross.line_to(Point::new(bounds.x1, bounds.y1));
    cross.move_to(Point::new(bounds.x1, bounds.y0));
    cross.line_to(Point::new(bounds.x0, bounds.y1));
    surface.stroke(&cross, Color::from_rgba8(150, 150, 150, 255), 2.0, &[], transform);

    surface.stroke(&bounds, Color::from_rgba8(100, 100, 100, 255), 2.0, &[], transform);
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAPER: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    fn blank(w: u32, h: u32) -> Surface {
        let mut surface = Surface::new(w, h).unwrap();
        surface.clear(Color::WHITE);
        surface
    }

    fn draw(surface: &mut Surface, object: &PlacedObject, placeholders: bool) {
        draw_object(surface, object, Affine::IDENTITY, &FontSet::empty(), placeholders);
    }

    #[test]
    fn test_filled_and_outlined_rect() {
        let mut surface = blank(100, 100);
        draw(&mut surface, &PlacedObject::rect(Geometry::new(10.0, 10.0, 30.0, 30.0), RectObject::filled()), false);
        draw(&mut surface, &PlacedObject::rect(Geometry::new(50.0, 50.0, 30.0, 30.0), RectObject::outlined()), false);

        assert_eq!(surface.pixel(25, 25), Some(BLACK));
        assert_eq!(surface.pixel(65, 65), Some(PAPER));
        assert_ne!(surface.pixel(50, 65), Some(PAPER));
    }

    #[test]
    fn test_rotation_keeps_center() {
        let mut g = Geometry::new(20.0, 45.0, 60.0, 10.0);
        g.rotation = 90.0;
        let mut surface = blank(100, 100);
        draw(&mut surface, &PlacedObject::rect(g, RectObject::filled()), false);

        assert_eq!(surface.pixel(50, 50), Some(BLACK));
        assert_eq!(surface.pixel(50, 25), Some(BLACK));
        assert_eq!(surface.pixel(25, 50), Some(PAPER));
    }

    #[test]
    fn test_fallback_text_alignment() {
        // 4 chars * 20 * 0.55 = 44 dots wide.
        let g = Geometry::new(0.0, 0.0, 200.0, 30.0);
        for (align, inked_x, blank_x) in [
            (TextAlign::Left, 20, 180),
            (TextAlign::Center, 100, 20),
            (TextAlign::Right, 180, 20),
        ] {
            let mut surface = blank(200, 30);
            let text = TextObject::new("abcd").with_size(20.0).with_align(align);
            draw(&mut surface, &PlacedObject::text(g, text), false);
            assert_eq!(surface.pixel(inked_x, 10), Some(BLACK), "{align:?}");
            assert_eq!(surface.pixel(blank_x, 10), Some(PAPER), "{align:?}");
        }
    }

    #[test]
    fn test_fallback_text_wraps_lines() {
        // "aaaa" is 44 dots, "aaaa aaaa" would be 99: two lines 24 dots apart.
        let g = Geometry::new(0.0, 0.0, 60.0, 60.0);
        let mut surface = blank(100, 100);
        draw(&mut surface, &PlacedObject::text(g, TextObject::new("aaaa aaaa").with_size(20.0)), false);
        assert_eq!(surface.pixel(10, 10), Some(BLACK));
        assert_eq!(surface.pixel(10, 34), Some(BLACK));
        assert_eq!(surface.pixel(70, 10), Some(PAPER));
    }

    #[test]
    fn test_undecoded_image_placeholder_is_optional() {
        let obj = PlacedObject::image(Geometry::new(0.0, 0.0, 40.0, 40.0), ImageObject::new("data:image/png;base64,"));

        let mut export = blank(50, 50);
        draw(&mut export, &obj, false);
        assert_eq!(export.pixel(20, 5), Some(PAPER));

        let mut interactive = blank(50, 50);
        draw(&mut interactive, &obj, true);
        assert_eq!(interactive.pixel(20, 5), Some([200, 200, 200, 255]));
    }
}
