//! The label design document.

use crate::media::Media;
use crate::objects::{ObjectId, PlacedObject};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serialization format version written by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Largest canvas side, in dots, accepted from a design file.
pub const MAX_CANVAS_DOTS: u32 = 4000;

/// The full persisted state of one label design.
///
/// `objects` is the paint order: later objects draw on top. Selection and
/// decoded image data live outside the document and are never serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDocument {
    pub media: Media,
    pub width_dots: u32,
    pub height_dots: u32,
    pub objects: Vec<PlacedObject>,
}

impl Default for LabelDocument {
    fn default() -> Self {
        Self::new(Media::default())
    }
}

impl LabelDocument {
    /// Create an empty document sized to `media`.
    ///
    /// Media without known dimensions gets the default media's size.
    pub fn new(media: Media) -> Self {
        let (width_dots, height_dots) = media
            .dimensions()
            .or_else(|| Media::default().dimensions())
            .unwrap_or((1, 1));
        Self {
            media,
            width_dots,
            height_dots,
            objects: Vec::new(),
        }
    }

    /// Switch media. Known formats resize the canvas; objects stay put.
    pub fn set_media(&mut self, media: Media) {
        if let Some((w, h)) = media.dimensions() {
            self.width_dots = w;
            self.height_dots = h;
        }
        self.media = media;
    }

    /// Append an object on top of the paint order.
    pub fn add(&mut self, object: PlacedObject) -> ObjectId {
        let id = object.id();
        self.objects.push(object);
        id
    }

    /// Remove an object, keeping the order of the others.
    pub fn remove(&mut self, id: ObjectId) -> Option<PlacedObject> {
        let index = self.index_of(id)?;
        Some(self.objects.remove(index))
    }

    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id() == id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&PlacedObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut PlacedObject> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Lowest edge of any object, or 0 for an empty document.
    pub fn content_bottom(&self) -> f64 {
        self.objects
            .iter()
            .map(|o| o.geometry.bottom())
            .fold(0.0, f64::max)
    }

    /// Height of the exported raster.
    ///
    /// Fixed media export at the document height. Continuous media export
    /// at `contentBottom + margin`, rounded. Either way the result is
    /// clamped to `[1, max_height]`.
    pub fn export_height(&self, margin: f64, max_height: u32) -> u32 {
        let max_height = max_height.max(1);
        if !self.media.is_continuous() {
            return self.height_dots.clamp(1, max_height);
        }
        let fitted = (self.content_bottom() + margin).round();
        fitted.clamp(1.0, f64::from(max_height)) as u32
    }

    /// Width of the exported raster, clamped to `[1, MAX_CANVAS_DOTS]`.
    pub fn export_width(&self) -> u32 {
        self.width_dots.clamp(1, MAX_CANVAS_DOTS)
    }

    /// Drop all decoded image data.
    pub fn release_handles(&mut self) {
        for object in &mut self.objects {
            object.release_handles();
        }
    }

    /// Copy without decoded image data.
    pub fn handle_free(&self) -> Self {
        let mut copy = self.clone();
        copy.release_handles();
        copy
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentWireRef<'a> {
    version: u32,
    media: &'a Media,
    width_dots: u32,
    height_dots: u32,
    objects: &'a [PlacedObject],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentWire {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    media: Option<Media>,
    #[serde(default)]
    width_dots: Option<u32>,
    #[serde(default)]
    height_dots: Option<u32>,
    #[serde(default)]
    objects: Vec<PlacedObject>,
}

impl Serialize for LabelDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DocumentWireRef {
            version: FORMAT_VERSION,
            media: &self.media,
            width_dots: self.width_dots,
            height_dots: self.height_dots,
            objects: &self.objects,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LabelDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = DocumentWire::deserialize(deserializer)?;
        match wire.version {
            Some(version) if version > FORMAT_VERSION => {
                log::warn!("Design format version {version} is newer than {FORMAT_VERSION}");
            }
            _ => {}
        }

        let media = wire.media.unwrap_or_default();
        // Known media dictates the canvas; anything else keeps what was declared.
        let (width_dots, height_dots) = match media.dimensions() {
            Some(dims) => dims,
            None => match (wire.width_dots, wire.height_dots) {
                (Some(w), Some(h)) if w > MAX_CANVAS_DOTS || h > MAX_CANVAS_DOTS => {
                    return Err(D::Error::custom(format!(
                        "canvas {w}x{h} exceeds the {MAX_CANVAS_DOTS} dot limit"
                    )));
                }
                (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
                _ => {
                    return Err(D::Error::custom(format!(
                        "media {media:?} has no known size and no widthDots/heightDots"
                    )));
                }
            },
        };

        Ok(Self {
            media,
            width_dots,
            height_dots,
            objects: wire.objects,
        })
    }
}
