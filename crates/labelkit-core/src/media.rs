//! Physical media formats and their canvas dimensions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A physical label format.
///
/// Dimensions are in printer dots (203 dpi). Continuous media has no fixed
/// length: its height is nominal while editing and is fitted to the content
/// at export time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Media {
    /// 100 x 150 mm shipping label.
    #[default]
    Label100x150,
    /// 55 x 30 mm label.
    Label55x30,
    /// 50 x 30 mm label.
    Label50x30,
    /// 80 mm continuous roll.
    Continuous80,
    /// 58 mm continuous roll.
    Continuous58,
    /// A format this build does not know; kept verbatim.
    Other(String),
}

impl Media {
    /// Nominal height used while editing continuous media.
    pub const CONTINUOUS_NOMINAL_HEIGHT: u32 = 400;

    /// All formats with known dimensions.
    pub fn known() -> [Media; 5] {
        [
            Media::Label100x150,
            Media::Label55x30,
            Media::Label50x30,
            Media::Continuous80,
            Media::Continuous58,
        ]
    }

    /// Parse a media identifier. Unrecognised ids map to [`Media::Other`].
    pub fn from_id(id: &str) -> Self {
        match id {
            "label100x150" => Media::Label100x150,
            "label55x30" => Media::Label55x30,
            "label50x30" => Media::Label50x30,
            "continuous80" => Media::Continuous80,
            "continuous58" => Media::Continuous58,
            other => Media::Other(other.to_string()),
        }
    }

    /// The wire identifier.
    pub fn id(&self) -> &str {
        match self {
            Media::Label100x150 => "label100x150",
            Media::Label55x30 => "label55x30",
            Media::Label50x30 => "label50x30",
            Media::Continuous80 => "continuous80",
            Media::Continuous58 => "continuous58",
            Media::Other(id) => id,
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &str {
        match self {
            Media::Label100x150 => "Label 100x150 mm",
            Media::Label55x30 => "Label 55x30 mm",
            Media::Label50x30 => "Label 50x30 mm",
            Media::Continuous80 => "Continuous 80 mm",
            Media::Continuous58 => "Continuous 58 mm",
            Media::Other(id) => id,
        }
    }

    /// Canvas dimensions `(width, height)` in dots, if the format is known.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Media::Label100x150 => Some((800, 1200)),
            Media::Label55x30 => Some((440, 240)),
            Media::Label50x30 => Some((400, 240)),
            Media::Continuous80 => Some((640, Self::CONTINUOUS_NOMINAL_HEIGHT)),
            Media::Continuous58 => Some((463, Self::CONTINUOUS_NOMINAL_HEIGHT)),
            Media::Other(_) => None,
        }
    }

    /// Whether the export height is fitted to content.
    pub fn is_continuous(&self) -> bool {
        matches!(self, Media::Continuous80 | Media::Continuous58)
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl Serialize for Media {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

impl<'de> Deserialize<'de> for Media {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        Ok(Media::from_id(&id))
    }
}
