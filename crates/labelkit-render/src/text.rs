//! Fonts, text measurement and glyph outlines.
//!
//! Text is drawn from a sans-serif system face found through fontdb and
//! turned into tiny-skia paths via rusttype outlines. Without any usable
//! system font, a fixed-advance measurer keeps layout deterministic.

use crate::error::{RenderError, RenderResult};
use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use rusttype::{Font, OutlineBuilder, Scale, point as rt_point};
use std::fs;
use std::sync::{Arc, OnceLock};

/// Measures rendered text width in dots.
pub trait TextMeasure {
    fn measure(&self, text: &str, size: f64, bold: bool) -> f64;
}

/// Fixed per-character advance, used when no font is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackMeasurer;

impl FallbackMeasurer {
    const REGULAR_ADVANCE: f64 = 0.55;
    const BOLD_ADVANCE: f64 = 0.6;
}

impl TextMeasure for FallbackMeasurer {
    fn measure(&self, text: &str, size: f64, bold: bool) -> f64 {
        let advance = if bold {
            Self::BOLD_ADVANCE
        } else {
            Self::REGULAR_ADVANCE
        };
        text.chars().count() as f64 * size * advance
    }
}

/// Regular and bold faces used for label text.
#[derive(Default)]
pub struct FontSet {
    regular: Option<Font<'static>>,
    bold: Option<Font<'static>>,
}

impl std::fmt::Debug for FontSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSet")
            .field("regular", &self.regular.is_some())
            .field("bold", &self.bold.is_some())
            .finish()
    }
}

fn db() -> &'static Database {
    static DB: OnceLock<Database> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = Database::new();
        db.load_system_fonts();
        log::debug!("Loaded {} system font faces", db.len());
        db
    })
}

fn load_font_from_system(bold: bool) -> Option<Font<'static>> {
    let families = [Family::SansSerif];
    let query = Query {
        families: &families,
        weight: if bold { Weight::BOLD } else { Weight::NORMAL },
        stretch: Stretch::Normal,
        style: Style::Normal,
    };

    let id = db().query(&query)?;
    let face = db().face(id)?;
    let bytes = match &face.source {
        fontdb::Source::File(path) | fontdb::Source::SharedFile(path, _) => fs::read(path).ok()?,
        fontdb::Source::Binary(bytes) => bytes.as_ref().as_ref().to_vec(),
    };
    Font::try_from_vec_and_index(bytes, face.index)
}

impl FontSet {
    /// No fonts: text is measured by [`FallbackMeasurer`] and drawn as bars.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sans-serif faces from the system, looked up once per process.
    pub fn system() -> Arc<Self> {
        static FONTS: OnceLock<Arc<FontSet>> = OnceLock::new();
        FONTS
            .get_or_init(|| {
                let regular = load_font_from_system(false);
                let bold = load_font_from_system(true);
                if regular.is_none() {
                    log::warn!("No sans-serif system font found; text will be drawn as placeholders");
                }
                Arc::new(Self { regular, bold })
            })
            .clone()
    }

    /// Build a set from font file bytes.
    pub fn from_bytes(regular: Vec<u8>, bold: Option<Vec<u8>>) -> RenderResult<Arc<Self>> {
        let regular = Font::try_from_vec(regular)
            .ok_or_else(|| RenderError::Font("regular face is not a TrueType/OpenType font".into()))?;
        let bold = match bold {
            Some(bytes) => Some(
                Font::try_from_vec(bytes)
                    .ok_or_else(|| RenderError::Font("bold face is not a TrueType/OpenType font".into()))?,
            ),
            None => None,
        };
        Ok(Arc::new(Self {
            regular: Some(regular),
            bold,
        }))
    }

    pub fn has_fonts(&self) -> bool {
        self.regular.is_some()
    }

    /// Face for the requested weight. Bold falls back to regular.
    pub fn font(&self, bold: bool) -> Option<&Font<'static>> {
        if bold {
            self.bold.as_ref().or(self.regular.as_ref())
        } else {
            self.regular.as_ref()
        }
    }

    /// Append the outlines of `text` to `builder`, with the em box's top-left at `(x, y)`.
    ///
    /// Returns false when no font is available.
    pub(crate) fn outline_text(
        &self,
        text: &str,
        size: f64,
        bold: bool,
        x: f64,
        y: f64,
        builder: &mut PathOutline,
    ) -> bool {
        let Some(font) = self.font(bold) else {
            return false;
        };
        let scale = Scale::uniform(size as f32);
        let v_metrics = font.v_metrics(scale);
        let start = rt_point(x as f32, y as f32 + v_metrics.ascent);
        for glyph in font.layout(text, scale, start) {
            glyph.build_outline(builder);
        }
        true
    }
}

impl TextMeasure for FontSet {
    fn measure(&self, text: &str, size: f64, bold: bool) -> f64 {
        let Some(font) = self.font(bold) else {
            return FallbackMeasurer.measure(text, size, bold);
        };
        let scale = Scale::uniform(size as f32);
        font.layout(text, scale, rt_point(0.0, 0.0))
            .last()
            .map_or(0.0, |g| {
                f64::from(g.position().x + g.unpositioned().h_metrics().advance_width)
            })
    }
}

/// Collects glyph outlines into a tiny-skia path.
pub(crate) struct PathOutline {
    builder: tiny_skia::PathBuilder,
}

impl PathOutline {
    pub(crate) fn new() -> Self {
        Self {
            builder: tiny_skia::PathBuilder::new(),
        }
    }

    /// The accumulated path, or `None` if nothing was drawn.
    pub(crate) fn finish(self) -> Option<tiny_skia::Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for PathOutline {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_measure() {
        assert_eq!(FallbackMeasurer.measure("abcd", 10.0, false), 22.0);
        assert_eq!(FallbackMeasurer.measure("abcd", 10.0, true), 24.0);
        assert_eq!(FallbackMeasurer.measure("", 10.0, false), 0.0);
    }

    #[test]
    fn test_empty_set_uses_fallback() {
        let fonts = FontSet::empty();
        assert!(!fonts.has_fonts());
        assert!(fonts.font(true).is_none());
        assert_eq!(fonts.measure("abc", 20.0, false), FallbackMeasurer.measure("abc", 20.0, false));

        let mut outline = PathOutline::new();
        assert!(!fonts.outline_text("abc", 20.0, false, 0.0, 0.0, &mut outline));
        assert!(outline.finish().is_none());
    }

    #[test]
    fn test_invalid_font_bytes() {
        assert!(matches!(
            FontSet::from_bytes(vec![0, 1, 2, 3], None),
            Err(RenderError::Font(_))
        ));
    }
}
