//! Placed objects: the items positioned on a label.
//!
//! Every object carries a shared [`Geometry`] and a variant-specific
//! [`ObjectKind`]. On the wire an object is a flat JSON map tagged by
//! `type`; objects whose `type` this build does not understand are kept
//! as raw maps so they survive a load/save cycle untouched.

mod image;
mod rect;
mod text;

pub use image::{ImageFormat, ImageHandle, ImageObject, data_url};
pub use rect::RectObject;
pub use text::{
    DEFAULT_FONT_SIZE, MAX_FONT_SIZE, MIN_FONT_SIZE, TextAlign, TextObject, clamp_font_size,
};

use kurbo::{Point, Rect};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Runtime identity of a placed object. Not persisted.
pub type ObjectId = Uuid;

/// Smallest width or height an object may have.
pub const MIN_DIMENSION: f64 = 1.0;

/// Position, size and rotation shared by every placed object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Left edge in dots.
    pub x: f64,
    /// Top edge in dots.
    pub y: f64,
    /// Width in dots.
    pub w: f64,
    /// Height in dots.
    pub h: f64,
    /// Rotation in degrees around the center.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rotation: f64,
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

impl Geometry {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            rotation: 0.0,
        }
    }

    /// Unrotated bounding box.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.w, self.y + self.h)
    }

    /// Rotation pivot.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Floor width and height at [`MIN_DIMENSION`].
    pub fn clamp_size(&mut self) {
        self.w = self.w.max(MIN_DIMENSION);
        self.h = self.h.max(MIN_DIMENSION);
    }

    /// Read geometry out of an arbitrary JSON map; missing numbers are zero.
    fn from_map(map: &Map<String, Value>) -> Self {
        let number = |key: &str| map.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        Self {
            x: number("x"),
            y: number("y"),
            w: number("w"),
            h: number("h"),
            rotation: number("rotation"),
        }
    }

    /// Write geometry back over the map it was read from.
    ///
    /// Unchanged numbers keep their original JSON form. Fields that were
    /// not numbers were read as zero and are left alone.
    fn write_into(&self, map: &mut Map<String, Value>) {
        let fields = [
            ("x", self.x),
            ("y", self.y),
            ("w", self.w),
            ("h", self.h),
            ("rotation", self.rotation),
        ];
        for (key, value) in fields {
            match map.get(key) {
                Some(existing) if !existing.is_number() => {}
                Some(existing) if existing.as_f64() == Some(value) => {}
                None if value == 0.0 => {}
                _ => {
                    map.insert(key.into(), Value::from(value));
                }
            }
        }
    }
}

/// An object whose `type` is not recognised. Kept verbatim, never drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownObject {
    fields: Map<String, Value>,
}

impl UnknownObject {
    /// The `type` tag, if the map had a string one.
    pub fn type_name(&self) -> Option<&str> {
        self.fields.get("type").and_then(Value::as_str)
    }

    /// The raw map as loaded.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Variant-specific part of a placed object.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Text(TextObject),
    Rect(RectObject),
    Image(ImageObject),
    Unknown(UnknownObject),
}

/// One item positioned on the label.
#[derive(Debug, Clone)]
pub struct PlacedObject {
    id: ObjectId,
    pub geometry: Geometry,
    pub kind: ObjectKind,
}

impl PartialEq for PlacedObject {
    fn eq(&self, other: &Self) -> bool {
        self.geometry == other.geometry && self.kind == other.kind
    }
}

impl PlacedObject {
    /// Create an object with a fresh identity.
    pub fn new(geometry: Geometry, kind: ObjectKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            geometry,
            kind,
        }
    }

    pub fn text(geometry: Geometry, text: TextObject) -> Self {
        Self::new(geometry, ObjectKind::Text(text))
    }

    pub fn rect(geometry: Geometry, rect: RectObject) -> Self {
        Self::new(geometry, ObjectKind::Rect(rect))
    }

    pub fn image(geometry: Geometry, image: ImageObject) -> Self {
        Self::new(geometry, ObjectKind::Image(image))
    }

    /// Placeholder text at the default position.
    pub fn default_text() -> Self {
        Self::text(Geometry::new(20.0, 30.0, 200.0, 40.0), TextObject::default())
    }

    /// Filled rectangle at the default position.
    pub fn default_rect() -> Self {
        Self::rect(Geometry::new(20.0, 80.0, 200.0, 100.0), RectObject::filled())
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Wire `type` tag.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            ObjectKind::Text(_) => "text",
            ObjectKind::Rect(_) => "rect",
            ObjectKind::Image(_) => "image",
            ObjectKind::Unknown(unknown) => unknown.type_name().unwrap_or(""),
        }
    }

    pub fn as_text(&self) -> Option<&TextObject> {
        match &self.kind {
            ObjectKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextObject> {
        match &mut self.kind {
            ObjectKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageObject> {
        match &self.kind {
            ObjectKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageObject> {
        match &mut self.kind {
            ObjectKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ObjectKind::Text(_))
    }

    /// Drop any decoded image data held by this object.
    pub fn release_handles(&mut self) {
        if let ObjectKind::Image(image) = &mut self.kind {
            image.release();
        }
    }

    fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value.get("type").and_then(Value::as_str) {
            Some("text" | "rect" | "image") => {
                let wire: KnownWire = serde_json::from_value(value)?;
                let kind = match wire.kind {
                    KnownKind::Text(text) => ObjectKind::Text(text),
                    KnownKind::Rect(rect) => ObjectKind::Rect(rect),
                    KnownKind::Image(image) => ObjectKind::Image(image),
                };
                Ok(Self::new(wire.geometry, kind))
            }
            _ => match value {
                Value::Object(fields) => {
                    log::debug!(
                        "Keeping object of unknown type {:?}",
                        fields.get("type").and_then(Value::as_str)
                    );
                    let geometry = Geometry::from_map(&fields);
                    Ok(Self::new(geometry, ObjectKind::Unknown(UnknownObject { fields })))
                }
                other => Err(<serde_json::Error as serde::de::Error>::custom(format!(
                    "expected an object map, found {other}"
                ))),
            },
        }
    }
}

#[derive(Deserialize)]
struct KnownWire {
    #[serde(flatten)]
    geometry: Geometry,
    #[serde(flatten)]
    kind: KnownKind,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum KnownKind {
    Text(TextObject),
    Rect(RectObject),
    Image(ImageObject),
}

#[derive(Serialize)]
struct KnownWireRef<'a> {
    #[serde(flatten)]
    kind: KnownKindRef<'a>,
    #[serde(flatten)]
    geometry: &'a Geometry,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum KnownKindRef<'a> {
    Text(&'a TextObject),
    Rect(&'a RectObject),
    Image(&'a ImageObject),
}

impl Serialize for PlacedObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let kind = match &self.kind {
            ObjectKind::Text(text) => KnownKindRef::Text(text),
            ObjectKind::Rect(rect) => KnownKindRef::Rect(rect),
            ObjectKind::Image(image) => KnownKindRef::Image(image),
            ObjectKind::Unknown(unknown) => {
                let mut fields = unknown.fields.clone();
                self.geometry.write_into(&mut fields);
                return fields.serialize(serializer);
            }
        };
        KnownWireRef {
            kind,
            geometry: &self.geometry,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PlacedObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_text() {
        let obj = PlacedObject::default_text();
        assert_eq!(obj.geometry, Geometry::new(20.0, 30.0, 200.0, 40.0));
        let text = obj.as_text().unwrap();
        assert_eq!(text.text, "Text");
        assert_eq!(text.size(), 28.0);
        assert_eq!(text.align, TextAlign::Left);
    }

    #[test]
    fn test_text_wire_format() {
        let obj = PlacedObject::text(
            Geometry::new(10.0, 10.0, 380.0, 40.0),
            TextObject::new("Title").with_size(34.0).with_bold(true),
        );
        let value = serde_json::to_value(&obj).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "text", "text": "Title", "size": 34.0, "bold": true,
                "align": "left", "x": 10.0, "y": 10.0, "w": 380.0, "h": 40.0
            })
        );
    }

    #[test]
    fn test_rotation_is_optional() {
        let obj: PlacedObject =
            serde_json::from_value(json!({"type": "rect", "x": 1, "y": 2, "w": 3, "h": 4, "fill": true}))
                .unwrap();
        assert_eq!(obj.geometry.rotation, 0.0);
        assert_eq!(obj.kind, ObjectKind::Rect(RectObject::filled()));

        let mut rotated = obj.clone();
        rotated.geometry.rotation = -30.0;
        let value = serde_json::to_value(&rotated).unwrap();
        assert_eq!(value["rotation"], json!(-30.0));
    }

    #[test]
    fn test_unknown_type_is_preserved() {
        let raw = json!({"type": "barcode", "x": 5, "y": 6, "w": 100, "h": 50, "data": "12345"});
        let obj: PlacedObject = serde_json::from_value(raw).unwrap();
        assert_eq!(obj.type_name(), "barcode");
        assert_eq!(obj.geometry.bounds(), Rect::new(5.0, 6.0, 105.0, 56.0));

        let back = serde_json::to_value(&obj).unwrap();
        assert_eq!(back["data"], json!("12345"));
        assert_eq!(back["type"], json!("barcode"));
        assert_eq!(back["x"].as_f64(), Some(5.0));
    }

    #[test]
    fn test_unknown_type_keeps_non_numeric_geometry() {
        let raw = json!({"type": "qr", "x": "auto", "y": null, "w": 40, "h": 40, "payload": "abc"});
        let mut obj: PlacedObject = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&obj).unwrap(), raw);

        obj.geometry.w = 60.0;
        let moved = serde_json::to_value(&obj).unwrap();
        assert_eq!(moved["x"], json!("auto"));
        assert_eq!(moved["y"], Value::Null);
        assert_eq!(moved["w"], json!(60.0));
        assert_eq!(moved["h"], json!(40));
        assert!(moved.get("rotation").is_none());
    }

    #[test]
    fn test_malformed_known_object_is_an_error() {
        let raw = json!({"type": "text", "x": "left", "y": 0, "w": 1, "h": 1});
        assert!(serde_json::from_value::<PlacedObject>(raw).is_err());
    }

    #[test]
    fn test_equality_ignores_identity() {
        let a = PlacedObject::default_rect();
        let b = PlacedObject::default_rect();
        assert_ne!(a.id(), b.id());
        assert_eq!(a, b);
    }
}
