//! Text blocks.

use serde::{Deserialize, Deserializer, Serialize};

/// Smallest allowed font size.
pub const MIN_FONT_SIZE: f64 = 6.0;
/// Largest allowed font size.
pub const MAX_FONT_SIZE: f64 = 240.0;
/// Font size of newly added text.
pub const DEFAULT_FONT_SIZE: f64 = 28.0;

/// Horizontal alignment of text lines inside the object's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Parse an alignment keyword.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "left" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" => Some(TextAlign::Right),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// Fields specific to a text object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    /// Content; may be empty.
    #[serde(default)]
    pub text: String,
    /// Font size in dots.
    #[serde(default = "default_size", deserialize_with = "deserialize_size")]
    size: f64,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub align: TextAlign,
}

fn default_size() -> f64 {
    DEFAULT_FONT_SIZE
}

fn deserialize_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let size = f64::deserialize(deserializer)?;
    Ok(clamp_font_size(size))
}

/// Clamp a font size into the allowed range. Non-finite sizes fall back to the default.
pub fn clamp_font_size(size: f64) -> f64 {
    if size.is_finite() {
        size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
    } else {
        DEFAULT_FONT_SIZE
    }
}

impl Default for TextObject {
    fn default() -> Self {
        Self::new("Text")
    }
}

impl TextObject {
    /// Create left-aligned, regular-weight text at the default size.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size: DEFAULT_FONT_SIZE,
            bold: false,
            align: TextAlign::Left,
        }
    }

    /// Builder-style size setter (clamped).
    pub fn with_size(mut self, size: f64) -> Self {
        self.set_size(size);
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    /// Set the font size, clamped to `[MIN_FONT_SIZE, MAX_FONT_SIZE]`.
    pub fn set_size(&mut self, size: f64) {
        self.size = clamp_font_size(size);
    }

    /// Distance between consecutive baselines when drawn.
    pub fn line_height(&self) -> f64 {
        self.size * 1.2
    }
}
